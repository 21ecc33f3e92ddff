//! File System Module
//!
//! Storage abstraction used by every command. Two implementations:
//! - InMemoryFs: directory map + file-content map (default, used by tests)
//! - OsFs: the host filesystem through `tokio::fs`
//!
//! Soft deletion goes through the trash area; `backup` wraps it with the
//! restore side used by undo.

pub mod backup;
pub mod in_memory_fs;
pub mod real_fs;
pub mod trash;
pub mod types;

pub use backup::{Backup, BackupStore};
pub use in_memory_fs::InMemoryFs;
pub use real_fs::OsFs;
pub use trash::TrashArea;
pub use types::*;
