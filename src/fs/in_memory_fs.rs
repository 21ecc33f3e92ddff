//! In-Memory File System Implementation
//!
//! A directory map (path -> ordered child names) plus a separate file-content
//! map. Used as the default backend and by every command test.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::trash::TrashArea;
use super::types::*;
use crate::path;

struct DirNode {
    children: BTreeSet<String>,
    mtime: SystemTime,
}

impl DirNode {
    fn new() -> Self {
        Self {
            children: BTreeSet::new(),
            mtime: SystemTime::now(),
        }
    }
}

struct FileNode {
    content: Vec<u8>,
    mtime: SystemTime,
}

struct Tree {
    dirs: BTreeMap<String, DirNode>,
    files: HashMap<String, FileNode>,
}

impl Tree {
    fn new() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert("/".to_string(), DirNode::new());
        Self {
            dirs,
            files: HashMap::new(),
        }
    }

    fn is_dir(&self, p: &str) -> bool {
        self.dirs.contains_key(p)
    }

    fn is_file(&self, p: &str) -> bool {
        self.files.contains_key(p)
    }

    fn exists(&self, p: &str) -> bool {
        self.is_dir(p) || self.is_file(p)
    }

    fn attach(&mut self, p: &str) {
        if let Some(parent) = self.dirs.get_mut(&path::dirname(p)) {
            parent.children.insert(path::basename(p).to_string());
            parent.mtime = SystemTime::now();
        }
    }

    fn detach(&mut self, p: &str) {
        if let Some(parent) = self.dirs.get_mut(&path::dirname(p)) {
            parent.children.remove(path::basename(p));
            parent.mtime = SystemTime::now();
        }
    }

    fn check_parent(&self, p: &str, operation: &str) -> Result<(), FsError> {
        let parent = path::dirname(p);
        if self.is_dir(&parent) {
            Ok(())
        } else if self.is_file(&parent) {
            Err(FsError::not_directory(&parent, operation))
        } else {
            Err(FsError::not_found(&parent, operation))
        }
    }

    fn create_dir(&mut self, p: &str) -> Result<(), FsError> {
        if self.exists(p) {
            return Err(FsError::already_exists(p, "mkdir"));
        }
        self.check_parent(p, "mkdir")?;
        self.dirs.insert(p.to_string(), DirNode::new());
        self.attach(p);
        Ok(())
    }

    fn create_dir_all(&mut self, p: &str) -> Result<(), FsError> {
        let mut chain = path::ancestors(p);
        chain.push(p.to_string());
        for dir in chain {
            if self.is_file(&dir) {
                return Err(FsError::not_directory(&dir, "mkdir"));
            }
            if !self.is_dir(&dir) {
                self.create_dir(&dir)?;
            }
        }
        Ok(())
    }

    fn put_file(&mut self, p: &str, content: Vec<u8>, operation: &str) -> Result<(), FsError> {
        if self.is_dir(p) {
            return Err(FsError::is_directory(p, operation));
        }
        self.check_parent(p, operation)?;
        self.files.insert(
            p.to_string(),
            FileNode {
                content,
                mtime: SystemTime::now(),
            },
        );
        self.attach(p);
        Ok(())
    }

    /// Re-key `src` (and its whole subtree) to `dst`. Callers check preconditions.
    fn relocate(&mut self, src: &str, dst: &str) {
        if let Some(node) = self.files.remove(src) {
            self.files.insert(dst.to_string(), node);
        } else {
            let dir_keys: Vec<String> = self
                .dirs
                .keys()
                .filter(|k| path::is_within(k, src))
                .cloned()
                .collect();
            for old in dir_keys {
                if let Some(node) = self.dirs.remove(&old) {
                    self.dirs.insert(rebase(&old, src, dst), node);
                }
            }
            let file_keys: Vec<String> = self
                .files
                .keys()
                .filter(|k| path::is_within(k, src))
                .cloned()
                .collect();
            for old in file_keys {
                if let Some(node) = self.files.remove(&old) {
                    self.files.insert(rebase(&old, src, dst), node);
                }
            }
        }
        self.detach(src);
        self.attach(dst);
    }
}

fn rebase(p: &str, from: &str, to: &str) -> String {
    match path::relative_to(p, from) {
        Some(rest) => path::join(to, rest),
        None => p.to_string(),
    }
}

/// In-memory virtual file system.
pub struct InMemoryFs {
    tree: RwLock<Tree>,
    trash: TrashArea,
}

impl InMemoryFs {
    pub const DEFAULT_TRASH_DIR: &'static str = "/.trash";

    /// Create a new filesystem holding only `/`.
    pub fn new() -> Self {
        Self::with_trash_dir(Self::DEFAULT_TRASH_DIR)
    }

    /// Create an empty filesystem whose trash lives at `trash_dir`.
    pub fn with_trash_dir(trash_dir: &str) -> Self {
        Self {
            tree: RwLock::new(Tree::new()),
            trash: TrashArea::new(trash_dir),
        }
    }

    /// Seed a directory (and its missing parents). Conflicting entries are left as they are.
    pub fn with_dir(mut self, dir: &str) -> Self {
        let normalized = path::normalize(dir);
        let _ = self.tree.get_mut().create_dir_all(&normalized);
        self
    }

    /// Seed a file, creating its parent directories.
    pub fn with_file(mut self, file: &str, content: impl AsRef<[u8]>) -> Self {
        let normalized = path::normalize(file);
        let tree = self.tree.get_mut();
        if tree.create_dir_all(&path::dirname(&normalized)).is_ok() {
            let _ = tree.put_file(&normalized, content.as_ref().to_vec(), "write");
        }
        self
    }
}

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FileSystem trait implementation
// ============================================================================

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn exists(&self, path: &str) -> bool {
        self.tree.read().await.exists(path)
    }

    async fn is_file(&self, path: &str) -> bool {
        self.tree.read().await.is_file(path)
    }

    async fn is_dir(&self, path: &str) -> bool {
        self.tree.read().await.is_dir(path)
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let tree = self.tree.read().await;
        if let Some(file) = tree.files.get(path) {
            return Ok(FsStat {
                is_file: true,
                is_directory: false,
                size: file.content.len() as u64,
                mtime: file.mtime,
            });
        }
        match tree.dirs.get(path) {
            Some(dir) => Ok(FsStat {
                is_file: false,
                is_directory: true,
                size: 0,
                mtime: dir.mtime,
            }),
            None => Err(FsError::not_found(path, "stat")),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let tree = self.tree.read().await;
        match tree.files.get(path) {
            Some(file) => Ok(file.content.clone()),
            None if tree.is_dir(path) => Err(FsError::is_directory(path, "read")),
            None => Err(FsError::not_found(path, "open")),
        }
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let mut tree = self.tree.write().await;
        tree.put_file(path, content.to_vec(), "write")
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), FsError> {
        let mut tree = self.tree.write().await;
        let content = match tree.files.get(src) {
            Some(file) => file.content.clone(),
            None if tree.is_dir(src) => return Err(FsError::is_directory(src, "copyfile")),
            None => return Err(FsError::not_found(src, "copyfile")),
        };
        tree.put_file(dst, content, "copyfile")
    }

    async fn mv(&self, src: &str, dst: &str) -> Result<String, FsError> {
        let mut tree = self.tree.write().await;
        if !tree.exists(src) {
            return Err(FsError::not_found(src, "rename"));
        }
        if src == "/" {
            return Err(FsError::invalid_argument(src, "rename"));
        }
        let target = if tree.is_dir(dst) {
            path::join(dst, path::basename(src))
        } else {
            dst.to_string()
        };
        if tree.is_dir(src) && path::is_within(&target, src) {
            return Err(FsError::InvalidMove {
                src: src.to_string(),
                dst: target,
            });
        }
        if tree.exists(&target) {
            return Err(FsError::already_exists(&target, "rename"));
        }
        tree.check_parent(&target, "rename")?;
        tree.relocate(src, &target);
        debug!(src, dst = %target, "moved");
        Ok(target)
    }

    async fn delete(&self, path: &str) -> Result<String, FsError> {
        let mut tree = self.tree.write().await;
        if !tree.exists(path) {
            return Err(FsError::not_found(path, "delete"));
        }
        if path::is_within(self.trash.root(), path) {
            return Err(FsError::invalid_argument(path, "delete"));
        }
        tree.create_dir_all(self.trash.root())?;
        let mut target = self.trash.candidate(path);
        while tree.exists(&target) {
            target = self.trash.candidate(path);
        }
        tree.relocate(path, &target);
        debug!(path, trash = %target, "moved to trash");
        Ok(target)
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        let mut tree = self.tree.write().await;
        if tree.files.remove(path).is_some() {
            tree.detach(path);
            return Ok(());
        }
        match tree.dirs.get(path) {
            None => Err(FsError::not_found(path, "rm")),
            Some(_) if path == "/" => Err(FsError::invalid_argument(path, "rmdir")),
            Some(dir) if !dir.children.is_empty() => Err(FsError::not_empty(path, "rmdir")),
            Some(_) => {
                tree.dirs.remove(path);
                tree.detach(path);
                Ok(())
            }
        }
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        self.tree.write().await.create_dir(path)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let tree = self.tree.read().await;
        match tree.dirs.get(path) {
            Some(dir) => Ok(dir.children.iter().cloned().collect()),
            None if tree.is_file(path) => Err(FsError::not_directory(path, "scandir")),
            None => Err(FsError::not_found(path, "scandir")),
        }
    }

    async fn walk(&self, path: &str) -> Result<Vec<WalkEntry>, FsError> {
        let tree = self.tree.read().await;
        if !tree.is_dir(path) {
            return Err(if tree.is_file(path) {
                FsError::not_directory(path, "walk")
            } else {
                FsError::not_found(path, "walk")
            });
        }
        let mut entries = Vec::new();
        let mut stack = vec![path.to_string()];
        while let Some(dir) = stack.pop() {
            let Some(node) = tree.dirs.get(&dir) else {
                continue;
            };
            let (subdirs, files): (Vec<String>, Vec<String>) = node
                .children
                .iter()
                .cloned()
                .partition(|name| tree.is_dir(&path::join(&dir, name)));
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
