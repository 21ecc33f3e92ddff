//! Shell-level errors.
//!
//! `Validation` is a user-correctable mistake (bad arguments, missing flag,
//! unsafe request). `Domain` means the request is well-formed but impossible in
//! the current state. Everything else is a storage or ledger failure.

use thiserror::Error;

use crate::fs::FsError;
use crate::shell::history::HistoryError;
use crate::undo::{LedgerError, UndoRecord};

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Domain(String),

    #[error(transparent)]
    Fs(FsError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("archive error: {0}")]
    Archive(String),

    #[error(
        "undo aborted after {done} of {total} record(s): {source}{}",
        format_remaining(.remaining),
        done = .applied.len(),
        total = .applied.len() + .remaining.len()
    )]
    UndoAborted {
        applied: Vec<String>,
        remaining: Vec<UndoRecord>,
        #[source]
        source: Box<ShellError>,
    },

    #[error("{0}: command not found")]
    UnknownCommand(String),
}

fn format_remaining(remaining: &[UndoRecord]) -> String {
    let mut out = String::from("\nnot applied:");
    for record in remaining {
        out.push_str("\n  ");
        out.push_str(&record.to_string());
    }
    out
}

/// Coarse classification used for exit codes and log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Domain,
    Fatal,
}

impl ShellError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ShellError::Validation(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        ShellError::Domain(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::Validation(_) | ShellError::UnknownCommand(_) => ErrorKind::Validation,
            ShellError::Domain(_) => ErrorKind::Domain,
            ShellError::Fs(_)
            | ShellError::Ledger(_)
            | ShellError::History(_)
            | ShellError::Archive(_)
            | ShellError::UndoAborted { .. } => ErrorKind::Fatal,
        }
    }
}

impl From<FsError> for ShellError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound { .. } => ShellError::Domain(err.to_string()),
            FsError::InvalidMove { .. } => ShellError::Validation(err.to_string()),
            other => ShellError::Fs(other),
        }
    }
}
