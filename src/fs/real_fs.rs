//! OS File System Implementation
//!
//! Backs the capability surface with the host filesystem through `tokio::fs`.
//! Paths handed in are absolute host paths.

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tracing::debug;

use super::trash::TrashArea;
use super::types::*;
use crate::path;

/// Real filesystem backend with a trash area somewhere on the same host.
pub struct OsFs {
    trash: TrashArea,
}

impl OsFs {
    pub fn new(trash_dir: &str) -> Self {
        Self {
            trash: TrashArea::new(trash_dir),
        }
    }

    /// Default trash location: `<data dir>/revsh/trash`.
    pub fn default_trash_dir() -> Option<String> {
        dirs::data_dir().map(|d| d.join("revsh").join("trash").to_string_lossy().into_owned())
    }

    async fn ensure_trash(&self) -> Result<(), FsError> {
        tokio::fs::create_dir_all(self.trash.root())
            .await
            .map_err(|e| map_io(e, self.trash.root(), "mkdir"))
    }

    /// Rename, falling back to copy + remove when the target is on another device.
    async fn relocate(&self, src: &str, dst: &str) -> Result<(), FsError> {
        match tokio::fs::rename(src, dst).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
                debug!(src, dst, "cross-device rename, copying instead");
                self.copy_tree(src, dst).await?;
                self.remove_tree(src).await
            }
            Err(err) => Err(map_io(err, src, "rename")),
        }
    }

    async fn copy_tree(&self, src: &str, dst: &str) -> Result<(), FsError> {
        if self.is_symlink(src).await {
            return copy_link(src, dst).await;
        }
        if self.is_file(src).await {
            tokio::fs::copy(src, dst)
                .await
                .map_err(|e| map_io(e, src, "copyfile"))?;
            return Ok(());
        }
        for entry in self.walk(src).await? {
            let rel = path::relative_to(&entry.dir, src).unwrap_or("");
            let target_dir = path::join(dst, rel);
            self.mkdir(&target_dir).await?;
            for file in &entry.files {
                let from = path::join(&entry.dir, file);
                let to = path::join(&target_dir, file);
                if self.is_symlink(&from).await {
                    copy_link(&from, &to).await?;
                    continue;
                }
                tokio::fs::copy(&from, &to)
                    .await
                    .map_err(|e| map_io(e, &from, "copyfile"))?;
            }
        }
        Ok(())
    }

    async fn remove_tree(&self, target: &str) -> Result<(), FsError> {
        let result = if self.is_dir(target).await && !self.is_symlink(target).await {
            tokio::fs::remove_dir_all(target).await
        } else {
            tokio::fs::remove_file(target).await
        };
        result.map_err(|e| map_io(e, target, "rm"))
    }
}

/// Recreate the link at `dst` instead of copying what it points to.
#[cfg(unix)]
async fn copy_link(src: &str, dst: &str) -> Result<(), FsError> {
    let target = tokio::fs::read_link(src)
        .await
        .map_err(|e| map_io(e, src, "readlink"))?;
    tokio::fs::symlink(&target, dst)
        .await
        .map_err(|e| map_io(e, dst, "symlink"))
}

#[cfg(not(unix))]
async fn copy_link(src: &str, _dst: &str) -> Result<(), FsError> {
    Err(FsError::invalid_argument(src, "symlink"))
}

fn map_io(err: io::Error, path: &str, operation: &str) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::not_found(path, operation),
        io::ErrorKind::AlreadyExists => FsError::already_exists(path, operation),
        io::ErrorKind::IsADirectory => FsError::is_directory(path, operation),
        io::ErrorKind::NotADirectory => FsError::not_directory(path, operation),
        io::ErrorKind::DirectoryNotEmpty => FsError::not_empty(path, operation),
        _ => FsError::Io {
            path: path.to_string(),
            operation: operation.to_string(),
            message: err.to_string(),
        },
    }
}

#[async_trait]
impl FileSystem for OsFs {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::symlink_metadata(path).await.is_ok()
    }

    async fn is_file(&self, path: &str) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn is_dir(&self, path: &str) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn is_symlink(&self, path: &str) -> bool {
        tokio::fs::symlink_metadata(path)
            .await
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| map_io(e, path, "stat"))?;
        Ok(FsStat {
            is_file: meta.is_file(),
            is_directory: meta.is_dir(),
            size: if meta.is_file() { meta.len() } else { 0 },
            mtime: meta.modified().unwrap_or(UNIX_EPOCH),
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        if self.is_dir(path).await {
            return Err(FsError::is_directory(path, "read"));
        }
        tokio::fs::read(path).await.map_err(|e| map_io(e, path, "open"))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        if self.is_dir(path).await {
            return Err(FsError::is_directory(path, "write"));
        }
        let parent = path::dirname(path);
        if !self.is_dir(&parent).await {
            return Err(FsError::not_found(&parent, "write"));
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| map_io(e, path, "write"))
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), FsError> {
        if self.is_dir(src).await {
            return Err(FsError::is_directory(src, "copyfile"));
        }
        if self.is_dir(dst).await {
            return Err(FsError::is_directory(dst, "copyfile"));
        }
        tokio::fs::copy(src, dst)
            .await
            .map(|_| ())
            .map_err(|e| map_io(e, src, "copyfile"))
    }

    async fn mv(&self, src: &str, dst: &str) -> Result<String, FsError> {
        if !self.exists(src).await {
            return Err(FsError::not_found(src, "rename"));
        }
        if src == "/" {
            return Err(FsError::invalid_argument(src, "rename"));
        }
        let target = if self.is_dir(dst).await {
            path::join(dst, path::basename(src))
        } else {
            dst.to_string()
        };
        if self.is_dir(src).await && path::is_within(&target, src) {
            return Err(FsError::InvalidMove {
                src: src.to_string(),
                dst: target,
            });
        }
        if self.exists(&target).await {
            return Err(FsError::already_exists(&target, "rename"));
        }
        let parent = path::dirname(&target);
        if !self.is_dir(&parent).await {
            return Err(FsError::not_found(&parent, "rename"));
        }
        self.relocate(src, &target).await?;
        debug!(src, dst = %target, "moved");
        Ok(target)
    }

    async fn delete(&self, path: &str) -> Result<String, FsError> {
        if !self.exists(path).await {
            return Err(FsError::not_found(path, "delete"));
        }
        if path::is_within(self.trash.root(), path) {
            return Err(FsError::invalid_argument(path, "delete"));
        }
        self.ensure_trash().await?;
        let mut target = self.trash.candidate(path);
        while self.exists(&target).await {
            target = self.trash.candidate(path);
        }
        self.relocate(path, &target).await?;
        debug!(path, trash = %target, "moved to trash");
        Ok(target)
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        let meta = tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| map_io(e, path, "rm"))?;
        if meta.is_dir() {
            tokio::fs::remove_dir(path)
                .await
                .map_err(|e| map_io(e, path, "rmdir"))
        } else {
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| map_io(e, path, "rm"))
        }
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        tokio::fs::create_dir(path)
            .await
            .map_err(|e| map_io(e, path, "mkdir"))
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        if self.is_file(path).await {
            return Err(FsError::not_directory(path, "scandir"));
        }
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| map_io(e, path, "scandir"))?;
        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| map_io(e, path, "scandir"))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn walk(&self, path: &str) -> Result<Vec<WalkEntry>, FsError> {
        if !self.is_dir(path).await {
            return Err(if self.exists(path).await {
                FsError::not_directory(path, "walk")
            } else {
                FsError::not_found(path, "walk")
            });
        }
        let mut entries = Vec::new();
        let mut stack = vec![path.to_string()];
        while let Some(dir) = stack.pop() {
            let mut subdirs = Vec::new();
            let mut files = Vec::new();
            for name in self.list_dir(&dir).await? {
                let child = path::join(&dir, &name);
                // Symlinked directories are listed as files so the walk never leaves the tree.
                let is_real_dir = tokio::fs::symlink_metadata(Path::new(&child))
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false);
                if is_real_dir {
                    subdirs.push(name);
                } else {
                    files.push(name);
                }
            }
            for sub in subdirs.iter().rev() {
                stack.push(path::join(&dir, sub));
            }
            entries.push(WalkEntry {
                dir,
                subdirs,
                files,
            });
        }
        Ok(entries)
    }

    fn trash_dir(&self) -> &str {
        self.trash.root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, OsFs, String) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_string_lossy().into_owned();
        let fs = OsFs::new(&path::join(&root, ".trash"));
        std::fs::create_dir_all(tmp.path().join("docs/sub")).unwrap();
        std::fs::write(tmp.path().join("docs/a.txt"), "alpha").unwrap();
        std::fs::write(tmp.path().join("docs/sub/b.txt"), "beta").unwrap();
        (tmp, fs, root)
    }

    #[tokio::test]
    async fn test_predicates_and_read() {
        let (_tmp, fs, root) = setup();
        let docs = path::join(&root, "docs");
        assert!(fs.is_dir(&docs).await);
        assert!(fs.is_file(&path::join(&docs, "a.txt")).await);
        assert_eq!(fs.read(&path::join(&docs, "a.txt")).await.unwrap(), b"alpha");
        assert_eq!(fs.list_dir(&docs).await.unwrap(), vec!["a.txt", "sub"]);
    }

    #[tokio::test]
    async fn test_mv_into_dir_and_back() {
        let (_tmp, fs, root) = setup();
        let a = path::join(&root, "docs/a.txt");
        let sub = path::join(&root, "docs/sub");
        let moved = fs.mv(&a, &sub).await.unwrap();
        assert_eq!(moved, path::join(&sub, "a.txt"));
        assert!(!fs.exists(&a).await);
        fs.mv(&moved, &a).await.unwrap();
        assert_eq!(fs.read(&a).await.unwrap(), b"alpha");
    }

    #[tokio::test]
    async fn test_mv_into_descendant_rejected() {
        let (_tmp, fs, root) = setup();
        let docs = path::join(&root, "docs");
        let err = fs.mv(&docs, &path::join(&docs, "sub")).await.unwrap_err();
        assert!(matches!(err, FsError::InvalidMove { .. }));
    }

    #[tokio::test]
    async fn test_delete_into_trash() {
        let (_tmp, fs, root) = setup();
        let sub = path::join(&root, "docs/sub");
        let trashed = fs.delete(&sub).await.unwrap();
        assert!(trashed.starts_with(&path::join(fs.trash_dir(), "sub.")));
        assert!(!fs.exists(&sub).await);
        assert_eq!(fs.read(&path::join(&trashed, "b.txt")).await.unwrap(), b"beta");
    }

    #[tokio::test]
    async fn test_walk_and_remove() {
        let (_tmp, fs, root) = setup();
        let docs = path::join(&root, "docs");
        let walk = fs.walk(&docs).await.unwrap();
        assert_eq!(walk.len(), 2);
        assert_eq!(walk[0].subdirs, vec!["sub"]);
        assert_eq!(walk[0].files, vec!["a.txt"]);
        let err = fs.remove(&docs).await.unwrap_err();
        assert!(matches!(err, FsError::NotEmpty { .. }));
        fs.remove(&path::join(&docs, "sub/b.txt")).await.unwrap();
        fs.remove(&path::join(&docs, "sub")).await.unwrap();
        assert_eq!(fs.list_dir(&docs).await.unwrap(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_write_requires_parent() {
        let (_tmp, fs, root) = setup();
        let err = fs
            .write(&path::join(&root, "missing/x.txt"), b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
