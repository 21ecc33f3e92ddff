//! Undo Ledger
//!
//! LIFO stack of undo batches. The in-memory ledger is the default; the JSON
//! file ledger keeps the stack on disk as an array of batches and rewrites the
//! whole document on every change.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::record::UndoBatch;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ledger {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ledger {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Stack of batches. Access is serialized by the shell that owns it.
pub trait UndoLedger: Send {
    fn push(&mut self, batch: UndoBatch) -> Result<(), LedgerError>;

    fn pop(&mut self) -> Result<Option<UndoBatch>, LedgerError>;

    fn peek(&self) -> Result<Option<UndoBatch>, LedgerError>;

    fn len(&self) -> Result<usize, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    fn clear(&mut self) -> Result<(), LedgerError>;
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    batches: Vec<UndoBatch>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UndoLedger for InMemoryLedger {
    fn push(&mut self, batch: UndoBatch) -> Result<(), LedgerError> {
        self.batches.push(batch);
        Ok(())
    }

    fn pop(&mut self) -> Result<Option<UndoBatch>, LedgerError> {
        Ok(self.batches.pop())
    }

    fn peek(&self) -> Result<Option<UndoBatch>, LedgerError> {
        Ok(self.batches.last().cloned())
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.batches.len())
    }

    fn clear(&mut self) -> Result<(), LedgerError> {
        self.batches.clear();
        Ok(())
    }
}

/// Ledger persisted as a pretty-printed JSON array of batches.
#[derive(Debug, Clone)]
pub struct JsonFileLedger {
    path: PathBuf,
}

impl JsonFileLedger {
    /// Open (or lazily create) a ledger file. A missing file is an empty ledger.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<UndoBatch>, LedgerError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| LedgerError::Json {
                path: self.path.clone(),
                source,
            })?;
        if !value.is_array() {
            return Err(LedgerError::Corrupt {
                path: self.path.clone(),
                message: "expected a JSON array of batches".to_string(),
            });
        }
        serde_json::from_value(value).map_err(|err| LedgerError::Corrupt {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    fn store(&self, batches: &[UndoBatch]) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let text = serde_json::to_string_pretty(batches).map_err(|source| LedgerError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), batches = batches.len(), "ledger written");
        Ok(())
    }
}

impl UndoLedger for JsonFileLedger {
    fn push(&mut self, batch: UndoBatch) -> Result<(), LedgerError> {
        let mut batches = self.load()?;
        batches.push(batch);
        self.store(&batches)
    }

    fn pop(&mut self) -> Result<Option<UndoBatch>, LedgerError> {
        let mut batches = self.load()?;
        let last = batches.pop();
        if last.is_some() {
            self.store(&batches)?;
        }
        Ok(last)
    }

    fn peek(&self) -> Result<Option<UndoBatch>, LedgerError> {
        Ok(self.load()?.pop())
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.load()?.len())
    }

    fn clear(&mut self) -> Result<(), LedgerError> {
        self.store(&[])
    }
}
