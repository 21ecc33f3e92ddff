//! revsh - a file shell where every mutation can be undone
//!
//! `mv`, `cp`, `rm` and `mkdir` log what they change; `undo` replays the
//! inverse of the most recent command. Deleted and overwritten objects go to a
//! trash area instead of being destroyed. The shell runs against an in-memory
//! tree or the host filesystem.

pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod path;
pub mod shell;
pub mod undo;

pub use config::{Backend, ConfigError, ShellConfig};
pub use error::{ErrorKind, ShellError};
pub use shell::{Outcome, Shell, ShellOptions};
