// src/commands/types.rs
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::error::ShellError;
use crate::fs::FileSystem;
use crate::path::PathContext;
use crate::undo::Journal;

/// Asks the user a yes/no question. Blocking is fine: commands run one at a time.
pub trait Prompt: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}

/// Answers yes to everything (`-y` / `--yes` / non-interactive use).
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Prompt on stdout, read the answer from stdin. Anything but `y`/`yes` is a no.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        let mut stdout = io::stdout();
        if write!(stdout, "{} ", question).and_then(|_| stdout.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// Output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    /// New working directory, set only by `cd`.
    pub cwd: Option<String>,
}

impl CommandOutput {
    pub fn text(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            cwd: None,
        }
    }

    pub fn change_dir(cwd: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            cwd: Some(cwd.into()),
        }
    }
}

/// Everything a command sees while it runs.
pub struct CommandContext {
    pub args: Vec<String>,
    pub flags: Vec<String>,
    pub paths: PathContext,
    pub fs: Arc<dyn FileSystem>,
    pub prompt: Arc<dyn Prompt>,
    /// Undo records logged so far; drained by the shell even if the command fails.
    pub journal: Journal,
}

impl CommandContext {
    pub fn new(
        args: Vec<String>,
        flags: Vec<String>,
        paths: PathContext,
        fs: Arc<dyn FileSystem>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        Self {
            args,
            flags,
            paths,
            fs,
            prompt,
            journal: Journal::new(),
        }
    }

    pub fn resolve(&self, raw: &str) -> String {
        self.paths.resolve(raw)
    }

    pub fn has_flag(&self, names: &[&str]) -> bool {
        self.flags.iter().any(|f| names.contains(&f.as_str()))
    }

    /// Reject any flag not listed in `allowed`.
    pub fn check_flags(&self, command: &str, allowed: &[&str]) -> Result<(), ShellError> {
        check_flags(command, &self.flags, allowed)
    }
}

pub fn check_flags(command: &str, flags: &[String], allowed: &[&str]) -> Result<(), ShellError> {
    match flags.iter().find(|f| !allowed.contains(&f.as_str())) {
        Some(flag) => Err(ShellError::validation(format!(
            "{}: invalid option '{}'",
            command, flag
        ))),
        None => Ok(()),
    }
}

/// A shell command working on the filesystem.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError>;
}
