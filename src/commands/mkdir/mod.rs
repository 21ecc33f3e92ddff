// src/commands/mkdir/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;
use crate::path;
use crate::undo::UndoRecord;

pub const USAGE: &str = "Usage: mkdir [-p] DIRECTORY...\n\n\
Create the DIRECTORY(ies), if they do not already exist.\n\n\
Options:\n  \
  -p, --parents  no error if existing, make parent directories as needed";

const PARENTS: &[&str] = &["-p", "--parents"];

pub struct MkdirCommand;

#[async_trait]
impl Command for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("mkdir", PARENTS)?;
        let parents = ctx.has_flag(PARENTS);
        if ctx.args.is_empty() {
            return Err(ShellError::validation("mkdir: missing operand"));
        }

        let fs = ctx.fs.clone();
        let mut created = Vec::new();
        for raw in ctx.args.clone() {
            let dir = ctx.resolve(&raw);

            if fs.is_dir(&dir).await {
                if parents {
                    continue;
                }
                return Err(ShellError::validation(format!(
                    "mkdir: cannot create directory '{}': File exists",
                    raw
                )));
            }
            if fs.exists(&dir).await {
                return Err(ShellError::validation(format!(
                    "mkdir: cannot create directory '{}': a file is in the way",
                    raw
                )));
            }

            let mut chain = Vec::new();
            for ancestor in path::ancestors(&dir) {
                if fs.is_dir(&ancestor).await {
                    continue;
                }
                if fs.exists(&ancestor).await {
                    return Err(ShellError::validation(format!(
                        "mkdir: cannot create directory '{}': '{}' is not a directory",
                        raw, ancestor
                    )));
                }
                chain.push(ancestor);
            }
            if !chain.is_empty() && !parents {
                return Err(ShellError::validation(format!(
                    "mkdir: cannot create directory '{}': No such file or directory",
                    raw
                )));
            }
            chain.push(dir);

            for d in chain {
                fs.mkdir(&d).await?;
                ctx.journal.record(UndoRecord::created_dir(d.clone()));
                created.push(d);
            }
        }

        let lines: Vec<String> = created
            .iter()
            .map(|d| format!("mkdir: created directory '{}'", d))
            .collect();
        Ok(CommandOutput::text(lines.join("\n")))
    }
}
