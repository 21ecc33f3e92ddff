// src/commands/mod.rs
pub mod cat;
pub mod cd;
pub mod cp;
pub mod grep;
pub mod help_cmd;
pub mod history_cmd;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod pwd;
pub mod registry;
pub mod rm;
pub mod tar;
pub mod types;
pub mod undo_cmd;
pub mod utils;
pub mod whoami_cmd;
pub mod zip;

pub use registry::Builtin;
pub use types::{AssumeYes, Command, CommandContext, CommandOutput, Prompt, StdinPrompt};
