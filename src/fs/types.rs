//! File System Types
//!
//! Core types and the capability trait shared by the in-memory tree and the
//! real OS backend.

use async_trait::async_trait;
use std::time::SystemTime;
use thiserror::Error;

/// File system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("ENOTDIR: not a directory, {operation} '{path}'")]
    NotDirectory { path: String, operation: String },

    #[error("ENOTEMPTY: directory not empty, {operation} '{path}'")]
    NotEmpty { path: String, operation: String },

    #[error("EINVAL: cannot move '{src}' into itself, '{dst}'")]
    InvalidMove { src: String, dst: String },

    #[error("EINVAL: invalid argument, {operation} '{path}'")]
    InvalidArgument { path: String, operation: String },

    #[error("EIO: {message}, {operation} '{path}'")]
    Io {
        path: String,
        operation: String,
        message: String,
    },
}

impl FsError {
    pub(crate) fn not_found(path: &str, operation: &str) -> Self {
        FsError::NotFound {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn already_exists(path: &str, operation: &str) -> Self {
        FsError::AlreadyExists {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn is_directory(path: &str, operation: &str) -> Self {
        FsError::IsDirectory {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn not_directory(path: &str, operation: &str) -> Self {
        FsError::NotDirectory {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn not_empty(path: &str, operation: &str) -> Self {
        FsError::NotEmpty {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn invalid_argument(path: &str, operation: &str) -> Self {
        FsError::InvalidArgument {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }
}

/// File status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub size: u64,
    pub mtime: SystemTime,
}

/// One level of a top-down walk: a directory plus the names of its
/// immediate subdirectories and files, both sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub dir: String,
    pub subdirs: Vec<String>,
    pub files: Vec<String>,
}

/// Minimal storage capability surface used by every command.
///
/// All paths are absolute and already normalized by the path resolver.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    async fn is_file(&self, path: &str) -> bool;

    async fn is_dir(&self, path: &str) -> bool;

    /// True if `path` itself is a symbolic link (not followed). Trees without
    /// links keep the default.
    async fn is_symlink(&self, _path: &str) -> bool {
        false
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Create or replace a file. The parent directory must exist.
    async fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Copy a single file, replacing `dst` if it is a file.
    async fn copy(&self, src: &str, dst: &str) -> Result<(), FsError>;

    /// Move `src` to `dst` and return where it ended up.
    ///
    /// If `dst` is an existing directory the object lands inside it under its
    /// own basename. The final target must not already exist, and a directory
    /// cannot be moved into its own subtree.
    async fn mv(&self, src: &str, dst: &str) -> Result<String, FsError>;

    /// Relocate `path` into the trash area and return its new location.
    async fn delete(&self, path: &str) -> Result<String, FsError>;

    /// Permanently remove a file or an empty directory.
    async fn remove(&self, path: &str) -> Result<(), FsError>;

    /// Create a single directory. The parent must exist.
    async fn mkdir(&self, path: &str) -> Result<(), FsError>;

    /// Sorted child names of a directory.
    async fn list_dir(&self, path: &str) -> Result<Vec<String>, FsError>;

    /// Top-down walk of a directory tree, parents before children.
    async fn walk(&self, path: &str) -> Result<Vec<WalkEntry>, FsError>;

    /// Absolute path of the trash area.
    fn trash_dir(&self) -> &str;
}
