// src/commands/cd/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;

pub const USAGE: &str = "Usage: cd [DIR]\n\n\
Change the working directory to DIR (the home directory by default).";

pub struct CdCommand;

#[async_trait]
impl Command for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("cd", &[])?;
        if ctx.args.len() > 1 {
            return Err(ShellError::validation("cd: too many arguments"));
        }
        let raw = ctx.args.first().map(String::as_str).unwrap_or("~");
        let target = ctx.resolve(raw);
        if ctx.fs.is_dir(&target).await {
            return Ok(CommandOutput::change_dir(target));
        }
        if ctx.fs.exists(&target).await {
            Err(ShellError::validation(format!("cd: {}: Not a directory", raw)))
        } else {
            Err(ShellError::domain(format!(
                "cd: {}: No such file or directory",
                raw
            )))
        }
    }
}
