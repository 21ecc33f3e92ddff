// src/commands/ls/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use std::time::SystemTime;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;
use crate::fs::FsStat;
use crate::path;

pub const USAGE: &str = "Usage: ls [-l] [-a] [-h] [FILE]...\n\n\
List information about the FILEs (the current directory by default).\n\n\
Options:\n  \
  -a, --all             do not ignore entries starting with .\n  \
  -l                    use a long listing format\n  \
  -h, --human-readable  with -l, print sizes like 1K 234M 2G";

pub struct LsCommand;

fn format_size(size: u64, human_readable: bool) -> String {
    if !human_readable || size < 1024 {
        return size.to_string();
    }
    let units = ["K", "M", "G", "T"];
    let mut value = size as f64;
    let mut unit = "";
    for u in units {
        value /= 1024.0;
        unit = u;
        if value < 1024.0 {
            break;
        }
    }
    if value < 10.0 {
        format!("{:.1}{}", value, unit)
    } else {
        format!("{}{}", value as u64, unit)
    }
}

fn format_time(mtime: SystemTime) -> String {
    let local: DateTime<Local> = mtime.into();
    if Local::now().signed_duration_since(local) < Duration::days(180) {
        local.format("%b %e %H:%M").to_string()
    } else {
        local.format("%b %e  %Y").to_string()
    }
}

fn format_long(stat: &FsStat, name: &str, human_readable: bool) -> String {
    let kind = if stat.is_directory { 'd' } else { '-' };
    format!(
        "{} {:>6} {} {}",
        kind,
        format_size(stat.size, human_readable),
        format_time(stat.mtime),
        name
    )
}

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags(
            "ls",
            &["-a", "--all", "-l", "-h", "--human-readable", "-A"],
        )?;
        let show_all = ctx.has_flag(&["-a", "--all", "-A"]);
        let long = ctx.has_flag(&["-l"]);
        let human_readable = ctx.has_flag(&["-h", "--human-readable"]);

        let targets = if ctx.args.is_empty() {
            vec![".".to_string()]
        } else {
            ctx.args.clone()
        };
        let show_header = targets.len() > 1;
        let mut blocks = Vec::new();

        for raw in &targets {
            let target = ctx.resolve(raw);
            let stat = match ctx.fs.stat(&target).await {
                Ok(stat) => stat,
                Err(_) => {
                    return Err(ShellError::domain(format!(
                        "ls: cannot access '{}': No such file or directory",
                        raw
                    )))
                }
            };

            if !stat.is_directory {
                blocks.push(if long {
                    format_long(&stat, raw, human_readable)
                } else {
                    raw.clone()
                });
                continue;
            }

            let mut lines = Vec::new();
            if show_header {
                lines.push(format!("{}:", raw));
            }
            for name in ctx.fs.list_dir(&target).await? {
                if !show_all && name.starts_with('.') {
                    continue;
                }
                if long {
                    let child = ctx.fs.stat(&path::join(&target, &name)).await?;
                    lines.push(format_long(&child, &name, human_readable));
                } else {
                    lines.push(name);
                }
            }
            blocks.push(lines.join("\n"));
        }

        let separator = if show_header { "\n\n" } else { "\n" };
        Ok(CommandOutput::text(blocks.join(separator)))
    }
}
