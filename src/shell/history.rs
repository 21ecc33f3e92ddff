//! Command history.
//!
//! Entries are stored as numbered lines (`"<n> <command line>"`). The file
//! store appends one line per command and numbers it after the last line
//! already in the file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[error("history {path}: {source}")]
pub struct HistoryError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

pub trait HistoryStore: Send {
    /// Record a command line; returns its number.
    fn add(&mut self, line: &str) -> Result<usize, HistoryError>;

    /// All entries, oldest first, formatted as `"<n> <command>"`.
    fn all(&self) -> Result<Vec<String>, HistoryError>;

    fn last(&self, n: usize) -> Result<Vec<String>, HistoryError> {
        let all = self.all()?;
        let start = all.len().saturating_sub(n);
        Ok(all[start..].to_vec())
    }

    fn clear(&mut self) -> Result<(), HistoryError>;
}

fn leading_number(line: &str) -> usize {
    line.split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Default)]
pub struct InMemoryHistory {
    lines: Vec<String>,
    next: usize,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistory {
    fn add(&mut self, line: &str) -> Result<usize, HistoryError> {
        self.next += 1;
        self.lines.push(format!("{} {}", self.next, line));
        Ok(self.next)
    }

    fn all(&self) -> Result<Vec<String>, HistoryError> {
        Ok(self.lines.clone())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.lines.clear();
        self.next = 0;
        Ok(())
    }
}

/// Append-only history file on the host filesystem.
#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn err(&self, source: io::Error) -> HistoryError {
        HistoryError {
            path: self.path.clone(),
            source,
        }
    }

    fn ensure_parent(&self) -> Result<(), HistoryError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| self.err(e))
            }
            _ => Ok(()),
        }
    }
}

impl HistoryStore for FileHistory {
    fn add(&mut self, line: &str) -> Result<usize, HistoryError> {
        self.ensure_parent()?;
        let number = self.all()?.last().map(|l| leading_number(l)).unwrap_or(0) + 1;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.err(e))?;
        writeln!(file, "{} {}", number, line).map_err(|e| self.err(e))?;
        Ok(number)
    }

    fn all(&self) -> Result<Vec<String>, HistoryError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.err(e)),
        }
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.ensure_parent()?;
        fs::write(&self.path, b"").map_err(|e| self.err(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_numbering() {
        let mut history = InMemoryHistory::new();
        history.add("ls").unwrap();
        history.add("cd /tmp").unwrap();
        history.add("pwd").unwrap();
        assert_eq!(history.last(2).unwrap(), vec!["2 cd /tmp", "3 pwd"]);
        assert_eq!(history.last(10).unwrap().len(), 3);
        history.clear().unwrap();
        assert_eq!(history.add("ls").unwrap(), 1);
    }

    #[test]
    fn test_file_history_continues_numbering() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/history");
        let mut history = FileHistory::new(&path);
        history.add("ls -l").unwrap();
        history.add("undo").unwrap();

        let mut reopened = FileHistory::new(&path);
        assert_eq!(reopened.add("pwd").unwrap(), 3);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1 ls -l\n2 undo\n3 pwd\n"
        );
        assert_eq!(reopened.last(1).unwrap(), vec!["3 pwd"]);
    }

    #[test]
    fn test_file_history_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = FileHistory::new(dir.path().join("none"));
        assert!(history.all().unwrap().is_empty());
    }
}
