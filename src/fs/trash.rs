//! Trash Area
//!
//! Naming policy for soft-deleted and displaced objects. Entries are named
//! `<basename>.<suffix>` where the suffix is drawn from the thread-local RNG;
//! backends still check for existence before using a candidate.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::path;

const SUFFIX_LEN: usize = 16;

/// Location of the trash area plus its naming scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashArea {
    root: String,
}

impl TrashArea {
    pub fn new(root: &str) -> Self {
        Self {
            root: path::normalize(root),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// True if `p` is the trash root or anything inside it.
    pub fn contains(&self, p: &str) -> bool {
        path::is_within(p, &self.root)
    }

    /// A fresh candidate location for `original` inside the trash area.
    pub fn candidate(&self, original: &str) -> String {
        let name = match path::basename(original) {
            "" => "root",
            name => name,
        };
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        path::join(&self.root, &format!("{}.{}", name, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_candidate_keeps_basename() {
        let trash = TrashArea::new("/.trash");
        let candidate = trash.candidate("/home/test/notes.txt");
        assert!(candidate.starts_with("/.trash/notes.txt."));
        let suffix = candidate.rsplit('.').next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
    }

    #[test]
    fn test_candidates_do_not_collide() {
        let trash = TrashArea::new("/.trash");
        let names: HashSet<String> = (0..500).map(|_| trash.candidate("/a/x.txt")).collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn test_contains() {
        let trash = TrashArea::new("/var/trash/");
        assert_eq!(trash.root(), "/var/trash");
        assert!(trash.contains("/var/trash"));
        assert!(trash.contains("/var/trash/x.abc"));
        assert!(!trash.contains("/var/trashcan"));
    }
}
