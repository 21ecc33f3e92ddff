// src/commands/grep/mod.rs
use async_trait::async_trait;
use regex_lite::Regex;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;
use crate::path;

pub const USAGE: &str = "Usage: grep [-r] [-i] [-v] [-F] [-c] PATTERN PATH...\n\n\
Print lines matching PATTERN as path:line:text.\n\n\
Options:\n  \
  -r, -R, --recursive    search directories recursively\n  \
  -i, --ignore-case      ignore case distinctions\n  \
  -v, --invert-match     select non-matching lines\n  \
  -F, --fixed-strings    PATTERN is a literal string\n  \
  -c, --count            print only a count of matching lines per file";

const RECURSIVE: &[&str] = &["-r", "-R", "--recursive"];
const IGNORE_CASE: &[&str] = &["-i", "--ignore-case"];
const INVERT: &[&str] = &["-v", "--invert-match"];
const FIXED: &[&str] = &["-F", "--fixed-strings"];
const COUNT: &[&str] = &["-c", "--count"];

pub struct GrepCommand;

fn build_regex(pattern: &str, ignore_case: bool, fixed: bool) -> Result<Regex, ShellError> {
    let mut pattern = if fixed {
        regex_lite::escape(pattern)
    } else {
        pattern.to_string()
    };
    if ignore_case {
        pattern = format!("(?i){}", pattern);
    }
    Regex::new(&pattern).map_err(|e| ShellError::validation(format!("grep: invalid pattern: {}", e)))
}

#[async_trait]
impl Command for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        let allowed: Vec<&str> = [RECURSIVE, IGNORE_CASE, INVERT, FIXED, COUNT].concat();
        ctx.check_flags("grep", &allowed)?;
        if ctx.args.len() < 2 {
            return Err(ShellError::validation(
                "grep: usage: grep [-r] [-i] PATTERN PATH...",
            ));
        }
        let recursive = ctx.has_flag(RECURSIVE);
        let invert = ctx.has_flag(INVERT);
        let count_only = ctx.has_flag(COUNT);
        let regex = build_regex(&ctx.args[0], ctx.has_flag(IGNORE_CASE), ctx.has_flag(FIXED))?;

        let mut files = Vec::new();
        for raw in &ctx.args[1..] {
            let target = ctx.resolve(raw);
            if ctx.fs.is_file(&target).await {
                files.push(target);
            } else if ctx.fs.is_dir(&target).await {
                if !recursive {
                    return Err(ShellError::validation(format!(
                        "grep: {}: Is a directory (use -r)",
                        raw
                    )));
                }
                for entry in ctx.fs.walk(&target).await? {
                    if path::is_within(&entry.dir, ctx.fs.trash_dir()) {
                        continue;
                    }
                    for name in &entry.files {
                        files.push(path::join(&entry.dir, name));
                    }
                }
            } else {
                return Err(ShellError::domain(format!(
                    "grep: {}: No such file or directory",
                    raw
                )));
            }
        }

        let mut out = Vec::new();
        for file in files {
            let bytes = ctx.fs.read(&file).await?;
            let text = String::from_utf8_lossy(&bytes);
            let mut hits = 0;
            for (idx, line) in text.lines().enumerate() {
                if regex.is_match(line) != invert {
                    hits += 1;
                    if !count_only {
                        out.push(format!("{}:{}:{}", file, idx + 1, line));
                    }
                }
            }
            if count_only {
                out.push(format!("{}:{}", file, hits));
            }
        }
        Ok(CommandOutput::text(out.join("\n")))
    }
}
