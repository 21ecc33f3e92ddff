//! Shell
//!
//! Ties the tokenizer, the command table, the undo ledger and the history
//! together. One line is processed at a time; every mutating command's
//! journal ends up on the ledger as one batch, even when the command fails
//! halfway.

pub mod history;
pub mod tokenizer;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::commands::help_cmd::HelpCommand;
use crate::commands::history_cmd::HistoryCommand;
use crate::commands::undo_cmd::UndoCommand;
use crate::commands::{AssumeYes, Builtin, CommandContext, Prompt};
use crate::error::{ErrorKind, ShellError};
use crate::fs::{FileSystem, InMemoryFs};
use crate::path::PathContext;
use crate::undo::{InMemoryLedger, UndoLedger};

use history::{HistoryStore, InMemoryHistory};
use tokenizer::parse_line;

pub const DEFAULT_USER: &str = "user";

/// Options for creating a shell. Anything left `None` gets an in-memory default.
#[derive(Default)]
pub struct ShellOptions {
    /// Filesystem backend (defaults to a seeded `InMemoryFs`)
    pub fs: Option<Arc<dyn FileSystem>>,
    /// Trash location for the default in-memory backend
    pub trash_dir: Option<String>,
    /// Starting directory (defaults to home)
    pub cwd: Option<String>,
    /// Home directory (defaults to `/home/<user>`)
    pub home: Option<String>,
    pub user: Option<String>,
    pub ledger: Option<Box<dyn UndoLedger>>,
    pub history: Option<Box<dyn HistoryStore>>,
    /// Confirmation source for `rm` (defaults to answering yes)
    pub prompt: Option<Arc<dyn Prompt>>,
}

/// What the caller should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Exit,
}

pub struct Shell {
    fs: Arc<dyn FileSystem>,
    paths: PathContext,
    ledger: Box<dyn UndoLedger>,
    history: Box<dyn HistoryStore>,
    prompt: Arc<dyn Prompt>,
}

impl Shell {
    pub async fn new(options: ShellOptions) -> Self {
        let user = options.user.unwrap_or_else(|| DEFAULT_USER.to_string());
        let home = options.home.unwrap_or_else(|| format!("/home/{}", user));
        let cwd = options.cwd.unwrap_or_else(|| home.clone());

        let fs: Arc<dyn FileSystem> = match options.fs {
            Some(fs) => fs,
            None => Arc::new(
                options
                    .trash_dir
                    .as_deref()
                    .map(InMemoryFs::with_trash_dir)
                    .unwrap_or_default()
                    .with_dir(&home)
                    .with_dir(&cwd)
                    .with_dir("/tmp")
                    .with_dir("/etc"),
            ),
        };

        let cwd = if fs.is_dir(&cwd).await {
            cwd
        } else {
            warn!(cwd = %cwd, "starting directory does not exist, using /");
            "/".to_string()
        };

        Self {
            fs,
            paths: PathContext::new(cwd, home, user),
            ledger: options.ledger.unwrap_or_else(|| Box::new(InMemoryLedger::new())),
            history: options.history.unwrap_or_else(|| Box::new(InMemoryHistory::new())),
            prompt: options.prompt.unwrap_or_else(|| Arc::new(AssumeYes)),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.paths.cwd
    }

    pub fn user(&self) -> &str {
        &self.paths.user
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn ledger(&self) -> &dyn UndoLedger {
        self.ledger.as_ref()
    }

    /// `user@cwd$ `, with the home directory shown as `~`.
    pub fn prompt_string(&self) -> String {
        let shown = match crate::path::relative_to(&self.paths.cwd, &self.paths.home) {
            Some("") => "~".to_string(),
            Some(rest) => format!("~/{}", rest),
            None => self.paths.cwd.clone(),
        };
        format!("{}@{}$ ", self.paths.user, shown)
    }

    /// Run one input line.
    pub async fn run_line(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let parsed = match parse_line(line)? {
            Some(parsed) => parsed,
            None => return Ok(Outcome::Output(String::new())),
        };
        self.history.add(line.trim())?;

        let builtin = Builtin::from_name(&parsed.name)
            .ok_or_else(|| ShellError::UnknownCommand(parsed.name.clone()))?;
        if parsed.flags.iter().any(|f| f == "--help") {
            return Ok(Outcome::Output(builtin.usage().to_string()));
        }
        info!(command = builtin.name(), args = ?parsed.args, flags = ?parsed.flags, "run");

        let result = match builtin {
            Builtin::Exit => return Ok(Outcome::Exit),
            Builtin::Help => HelpCommand.run(&parsed.args),
            Builtin::History => HistoryCommand.run(&parsed.args, &parsed.flags, self.history.as_mut()),
            Builtin::Undo => {
                UndoCommand
                    .run(&parsed.args, &parsed.flags, self.fs.as_ref(), self.ledger.as_mut())
                    .await
            }
            _ => self.dispatch(builtin, parsed.args, parsed.flags).await,
        };
        if let Err(err) = &result {
            if err.kind() == ErrorKind::Fatal {
                error!(command = builtin.name(), error = %err, "command failed");
            }
        }
        result.map(Outcome::Output)
    }

    async fn dispatch(
        &mut self,
        builtin: Builtin,
        args: Vec<String>,
        flags: Vec<String>,
    ) -> Result<String, ShellError> {
        let cmd = builtin
            .command()
            .ok_or_else(|| ShellError::UnknownCommand(builtin.name().to_string()))?;
        let mut ctx = CommandContext::new(
            args,
            flags,
            self.paths.clone(),
            self.fs.clone(),
            self.prompt.clone(),
        );
        let result = cmd.execute(&mut ctx).await;

        // A failed command may already have mutated something; keep it undoable.
        if let Some(batch) = ctx.journal.take_batch() {
            info!(command = builtin.name(), records = batch.len(), "undo batch recorded");
            self.ledger.push(batch)?;
        }

        let output = result?;
        if let Some(cwd) = output.cwd {
            self.paths = self.paths.with_cwd(&cwd);
        }
        Ok(output.stdout)
    }
}
