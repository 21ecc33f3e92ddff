//! Undo Executor
//!
//! Pops the newest batch and applies the inverse of each record in stored
//! order. A failing inverse stops the replay; the batch is not re-pushed and
//! every record that was not applied is reported in the error.

use tracing::{info, warn};

use super::ledger::UndoLedger;
use super::record::{UndoAction, UndoBatch, UndoRecord};
use crate::error::ShellError;
use crate::fs::{BackupStore, FileSystem, FsError};

pub struct UndoExecutor<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> UndoExecutor<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Undo the most recent batch. Fails with a domain error when there is nothing to undo.
    pub async fn undo(&self, ledger: &mut dyn UndoLedger) -> Result<String, ShellError> {
        let batch = ledger
            .pop()?
            .ok_or_else(|| ShellError::domain("undo: nothing to undo"))?;
        self.replay(batch).await
    }

    /// Apply every record of `batch` front-to-back.
    pub async fn replay(&self, batch: UndoBatch) -> Result<String, ShellError> {
        let records = batch.into_records();
        let total = records.len();
        let mut applied = Vec::with_capacity(total);
        for (idx, record) in records.iter().enumerate() {
            match self.invert(record).await {
                Ok(line) => applied.push(line),
                Err(err) => {
                    warn!(
                        record = %record,
                        applied = applied.len(),
                        remaining = total - idx,
                        error = %err,
                        "undo aborted"
                    );
                    return Err(ShellError::UndoAborted {
                        applied,
                        remaining: records[idx..].to_vec(),
                        source: Box::new(err),
                    });
                }
            }
        }
        info!(records = total, "undo applied");
        Ok(applied.join("\n"))
    }

    async fn invert(&self, record: &UndoRecord) -> Result<String, ShellError> {
        let backups = BackupStore::new(self.fs);
        match record.action() {
            UndoAction::Remove => {
                self.restore(&backups, record.dst(), record.src()).await?;
                Ok(format!("restored '{}'", record.src()))
            }
            UndoAction::Move => {
                if !self.fs.exists(record.dst()).await {
                    return Err(ShellError::domain(format!(
                        "undo: '{}' no longer exists, cannot move it back to '{}'",
                        record.dst(),
                        record.src()
                    )));
                }
                if let Some(backup) = record.overwritten_backup() {
                    if !self.fs.exists(backup).await {
                        return Err(ShellError::domain(format!(
                            "undo: backup '{}' of '{}' is missing",
                            backup,
                            record.dst()
                        )));
                    }
                }
                self.restore(&backups, record.dst(), record.src()).await?;
                match record.overwritten_backup() {
                    Some(backup) => {
                        self.restore(&backups, backup, record.dst()).await?;
                        Ok(format!(
                            "moved '{}' back to '{}', restored previous '{}'",
                            record.dst(),
                            record.src(),
                            record.dst()
                        ))
                    }
                    None => Ok(format!(
                        "moved '{}' back to '{}'",
                        record.dst(),
                        record.src()
                    )),
                }
            }
            UndoAction::Copy => {
                let dst_present = self.fs.exists(record.dst()).await;
                if dst_present {
                    if self.fs.is_dir(record.dst()).await {
                        return Err(ShellError::domain(format!(
                            "undo: '{}' is now a directory, refusing to remove it",
                            record.dst()
                        )));
                    }
                    self.fs.remove(record.dst()).await?;
                }
                match record.overwritten_backup() {
                    Some(backup) => {
                        self.restore(&backups, backup, record.dst()).await?;
                        Ok(format!("restored previous '{}'", record.dst()))
                    }
                    None if dst_present => Ok(format!("removed copy '{}'", record.dst())),
                    None => Ok(format!("copy '{}' already gone", record.dst())),
                }
            }
            UndoAction::CreateDir => {
                if !self.fs.exists(record.dst()).await {
                    return Ok(format!("directory '{}' already gone", record.dst()));
                }
                match self.fs.remove(record.dst()).await {
                    Ok(()) => Ok(format!("removed directory '{}'", record.dst())),
                    Err(FsError::NotEmpty { .. }) => Err(ShellError::domain(format!(
                        "undo: directory '{}' is no longer empty",
                        record.dst()
                    ))),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    async fn restore(
        &self,
        backups: &BackupStore<'_>,
        from: &str,
        to: &str,
    ) -> Result<(), ShellError> {
        backups.restore(from, to).await.map_err(|err| match err {
            FsError::AlreadyExists { .. } => ShellError::domain(format!(
                "undo: cannot restore '{}': path is occupied",
                to
            )),
            FsError::NotFound { path, .. } => ShellError::domain(format!(
                "undo: cannot restore '{}': '{}' does not exist",
                to, path
            )),
            other => other.into(),
        })
    }
}
