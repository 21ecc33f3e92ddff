// src/commands/pwd/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;

pub const USAGE: &str = "Usage: pwd\n\nPrint the current working directory.";

pub struct PwdCommand;

#[async_trait]
impl Command for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("pwd", &[])?;
        Ok(CommandOutput::text(ctx.paths.cwd.clone()))
    }
}
