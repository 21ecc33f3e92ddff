// src/commands/cat/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;

pub const USAGE: &str = "Usage: cat [-n] FILE...\n\n\
Concatenate UTF-8 FILE(s) to standard output.\n\n\
Options:\n  \
  -n, --number  number all output lines";

pub struct CatCommand;

#[async_trait]
impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("cat", &["-n", "--number"])?;
        let number = ctx.has_flag(&["-n", "--number"]);
        if ctx.args.is_empty() {
            return Err(ShellError::validation("cat: missing file operand"));
        }

        let mut stdout = String::new();
        for raw in &ctx.args {
            let file = ctx.resolve(raw);
            if ctx.fs.is_dir(&file).await {
                return Err(ShellError::domain(format!("cat: {}: Is a directory", raw)));
            }
            if !ctx.fs.is_file(&file).await {
                return Err(ShellError::domain(format!(
                    "cat: {}: No such file or directory",
                    raw
                )));
            }
            let bytes = ctx.fs.read(&file).await?;
            let text = String::from_utf8(bytes).map_err(|_| {
                ShellError::domain(format!("cat: {}: not a UTF-8 text file", raw))
            })?;
            stdout.push_str(&text);
        }

        if number {
            let numbered: Vec<String> = stdout
                .lines()
                .enumerate()
                .map(|(i, line)| format!("{:>6}\t{}", i + 1, line))
                .collect();
            stdout = numbered.join("\n");
        }
        Ok(CommandOutput::text(stdout))
    }
}
