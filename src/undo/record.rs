//! Undo records, batches and the per-command journal.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kind of elementary mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndoAction {
    #[serde(rename = "mv")]
    Move,
    #[serde(rename = "cp")]
    Copy,
    #[serde(rename = "rm")]
    Remove,
    #[serde(rename = "mkdir")]
    CreateDir,
}

impl UndoAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UndoAction::Move => "mv",
            UndoAction::Copy => "cp",
            UndoAction::Remove => "rm",
            UndoAction::CreateDir => "mkdir",
        }
    }
}

/// One reversible mutation.
///
/// Fields are private so that `overwrite` can only be true together with a
/// backup location. Serialized as `{action, src, dst, overwrite, overwritten_path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordRepr", into = "RecordRepr")]
pub struct UndoRecord {
    action: UndoAction,
    src: String,
    dst: String,
    overwritten_backup: Option<String>,
}

impl UndoRecord {
    /// `src` was moved to `dst`; a previous occupant of `dst` went to `backup`.
    pub fn moved(src: impl Into<String>, dst: impl Into<String>, backup: Option<String>) -> Self {
        Self {
            action: UndoAction::Move,
            src: src.into(),
            dst: dst.into(),
            overwritten_backup: backup,
        }
    }

    /// `src` was copied onto `dst`; a previous file at `dst` went to `backup`.
    pub fn copied(src: impl Into<String>, dst: impl Into<String>, backup: Option<String>) -> Self {
        Self {
            action: UndoAction::Copy,
            src: src.into(),
            dst: dst.into(),
            overwritten_backup: backup,
        }
    }

    /// `src` was soft-deleted into the trash at `trash_path`.
    pub fn removed(src: impl Into<String>, trash_path: impl Into<String>) -> Self {
        Self {
            action: UndoAction::Remove,
            src: src.into(),
            dst: trash_path.into(),
            overwritten_backup: None,
        }
    }

    /// `dir` was created.
    pub fn created_dir(dir: impl Into<String>) -> Self {
        let dir = dir.into();
        Self {
            action: UndoAction::CreateDir,
            src: dir.clone(),
            dst: dir,
            overwritten_backup: None,
        }
    }

    pub fn action(&self) -> UndoAction {
        self.action
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    pub fn overwrite(&self) -> bool {
        self.overwritten_backup.is_some()
    }

    pub fn overwritten_backup(&self) -> Option<&str> {
        self.overwritten_backup.as_deref()
    }
}

impl fmt::Display for UndoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            UndoAction::CreateDir => write!(f, "mkdir {}", self.dst)?,
            action => write!(f, "{} {} -> {}", action.as_str(), self.src, self.dst)?,
        }
        if let Some(backup) = &self.overwritten_backup {
            write!(f, " (overwritten, backup at {})", backup)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct RecordRepr {
    action: UndoAction,
    src: String,
    dst: String,
    overwrite: bool,
    #[serde(default)]
    overwritten_path: Option<String>,
}

impl TryFrom<RecordRepr> for UndoRecord {
    type Error = String;

    fn try_from(repr: RecordRepr) -> Result<Self, Self::Error> {
        if repr.overwrite != repr.overwritten_path.is_some() {
            return Err(format!(
                "record {} -> {}: overwrite={} disagrees with overwritten_path",
                repr.src, repr.dst, repr.overwrite
            ));
        }
        if repr.overwrite && matches!(repr.action, UndoAction::Remove | UndoAction::CreateDir) {
            return Err(format!("{} record cannot overwrite", repr.action.as_str()));
        }
        if repr.action == UndoAction::CreateDir && repr.src != repr.dst {
            return Err(format!("mkdir record must have src == dst, got {}", repr.src));
        }
        Ok(Self {
            action: repr.action,
            src: repr.src,
            dst: repr.dst,
            overwritten_backup: repr.overwritten_path,
        })
    }
}

impl From<UndoRecord> for RecordRepr {
    fn from(record: UndoRecord) -> Self {
        Self {
            action: record.action,
            overwrite: record.overwritten_backup.is_some(),
            src: record.src,
            dst: record.dst,
            overwritten_path: record.overwritten_backup,
        }
    }
}

/// The non-empty, ordered records of one command invocation, in replay order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<UndoRecord>", into = "Vec<UndoRecord>")]
pub struct UndoBatch {
    records: Vec<UndoRecord>,
}

impl UndoBatch {
    /// Build a batch from records logged in mutation order.
    ///
    /// The batch stores them reversed, so replaying front-to-back undoes the
    /// last mutation first. Returns `None` for an empty log.
    pub fn from_mutations(mut log: Vec<UndoRecord>) -> Option<Self> {
        if log.is_empty() {
            return None;
        }
        log.reverse();
        Some(Self { records: log })
    }

    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<UndoRecord> {
        self.records
    }
}

impl TryFrom<Vec<UndoRecord>> for UndoBatch {
    type Error = String;

    fn try_from(records: Vec<UndoRecord>) -> Result<Self, Self::Error> {
        if records.is_empty() {
            Err("empty undo batch".to_string())
        } else {
            Ok(Self { records })
        }
    }
}

impl From<UndoBatch> for Vec<UndoRecord> {
    fn from(batch: UndoBatch) -> Self {
        batch.records
    }
}

/// Records logged by a command while it runs, in mutation order.
///
/// Kept even when the command fails partway, so mutations that already
/// happened can still be undone.
#[derive(Debug, Default)]
pub struct Journal {
    records: Vec<UndoRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: UndoRecord) {
        debug!(record = %record, "journaled");
        self.records.push(record);
    }

    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drain the journal into a replay-ordered batch.
    pub fn take_batch(&mut self) -> Option<UndoBatch> {
        UndoBatch::from_mutations(std::mem::take(&mut self.records))
    }
}
