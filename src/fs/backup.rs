//! Backup Store
//!
//! Moves an existing object out of the way (into the trash area) and restores
//! it later. `rm` uses it for soft deletion, `mv` and `cp` for overwrite
//! protection, and undo for putting things back.

use tracing::{debug, error};

use super::types::{FileSystem, FsError};
use crate::path;

/// Handle to an object parked in the trash area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub original: String,
    pub location: String,
}

pub struct BackupStore<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> BackupStore<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Relocate `original` into the trash area.
    pub async fn stash(&self, original: &str) -> Result<Backup, FsError> {
        let location = self.fs.delete(original).await?;
        Ok(Backup {
            original: original.to_string(),
            location,
        })
    }

    /// Move a parked object back to `target`.
    ///
    /// Never nests into or overwrites an existing object: an occupied target
    /// is `AlreadyExists`, a missing backup is `NotFound`.
    pub async fn restore(&self, location: &str, target: &str) -> Result<(), FsError> {
        if self.fs.exists(target).await {
            return Err(FsError::already_exists(target, "restore"));
        }
        if !self.fs.exists(location).await {
            return Err(FsError::not_found(location, "restore"));
        }
        let parent = path::dirname(target);
        if !self.fs.is_dir(&parent).await {
            return Err(FsError::not_found(&parent, "restore"));
        }
        let landed = self.fs.mv(location, target).await?;
        debug!(from = location, to = %landed, "restored");
        Ok(())
    }

    /// Best-effort rollback after a mutation failed right after stashing.
    pub async fn put_back(&self, backup: &Backup) {
        if let Err(err) = self.restore(&backup.location, &backup.original).await {
            error!(
                original = %backup.original,
                location = %backup.location,
                error = %err,
                "could not put backup back"
            );
        }
    }
}
