//! Archive plumbing shared by zip/unzip and tar/untar.
//!
//! Packing gathers entries through the filesystem abstraction. Unpacking is
//! two-phase: `plan_extraction` is a pure pass over the decoded entry list
//! (names, entry types, in-archive conflicts) and `extract` checks the plan
//! against the filesystem before writing anything.

use std::collections::BTreeSet;

use tracing::debug;

use crate::commands::CommandContext;
use crate::error::ShellError;
use crate::fs::FileSystem;
use crate::path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File(Vec<u8>),
    Dir,
    /// Symlinks, hard links, devices, fifos: never extracted.
    Unsupported(&'static str),
}

/// One archive member; `name` is the raw in-archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ArchiveEntry {
    pub fn file(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File(content),
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }
}

/// Validated extraction targets, all absolute and inside the destination.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractionPlan {
    pub dirs: Vec<String>,
    pub files: Vec<(String, Vec<u8>)>,
}

/// Resolve where a new archive goes: its parent must exist and it must not be a directory.
pub async fn archive_target(
    ctx: &CommandContext,
    command: &str,
    raw: &str,
) -> Result<String, ShellError> {
    let target = ctx.resolve(raw);
    if ctx.fs.is_dir(&target).await {
        return Err(ShellError::validation(format!(
            "{}: archive path '{}' is a directory",
            command, raw
        )));
    }
    if !ctx.fs.is_dir(&path::dirname(&target)).await {
        return Err(ShellError::validation(format!(
            "{}: cannot create '{}': target directory does not exist",
            command, raw
        )));
    }
    Ok(target)
}

/// Gather the entries for `sources`, named relative to each source's parent.
/// Directories need `recursive`; the archive itself is never packed into itself.
pub async fn collect_entries(
    ctx: &CommandContext,
    command: &str,
    sources: &[String],
    recursive: bool,
    archive: &str,
) -> Result<Vec<ArchiveEntry>, ShellError> {
    let mut entries = Vec::new();
    for raw in sources {
        let src = ctx.resolve(raw);
        let base = path::basename(&src).to_string();
        if ctx.fs.is_file(&src).await {
            if src == archive {
                return Err(ShellError::validation(format!(
                    "{}: '{}' is the archive being written",
                    command, raw
                )));
            }
            entries.push(ArchiveEntry::file(base, ctx.fs.read(&src).await?));
            continue;
        }
        if !ctx.fs.is_dir(&src).await {
            return Err(ShellError::domain(format!(
                "{}: {}: No such file or directory",
                command, raw
            )));
        }
        if !recursive {
            return Err(ShellError::validation(format!(
                "{}: '{}' is a directory (use -r)",
                command, raw
            )));
        }
        let name_of = |rel: &str| match (base.is_empty(), rel.is_empty()) {
            (true, _) => rel.to_string(),
            (false, true) => base.clone(),
            (false, false) => format!("{}/{}", base, rel),
        };
        for entry in ctx.fs.walk(&src).await? {
            if path::is_within(&entry.dir, ctx.fs.trash_dir()) {
                continue;
            }
            let rel = path::relative_to(&entry.dir, &src).unwrap_or("").to_string();
            let dir_name = name_of(&rel);
            if !dir_name.is_empty() {
                entries.push(ArchiveEntry::dir(dir_name));
            }
            for file in &entry.files {
                let full = path::join(&entry.dir, file);
                if full == archive {
                    continue;
                }
                let rel_file = if rel.is_empty() {
                    file.clone()
                } else {
                    format!("{}/{}", rel, file)
                };
                entries.push(ArchiveEntry::file(name_of(&rel_file), ctx.fs.read(&full).await?));
            }
        }
    }
    Ok(entries)
}

/// Lexically resolve an in-archive name to a path relative to the extraction root.
/// Absolute names and names that climb out of the root are rejected.
pub fn safe_relative(name: &str) -> Result<String, ShellError> {
    if name.starts_with('/') || name.contains('\0') {
        return Err(ShellError::validation(format!(
            "unsafe path in archive: '{}'",
            name
        )));
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(ShellError::validation(format!(
                        "unsafe path in archive: '{}'",
                        name
                    )));
                }
            }
            _ => parts.push(part),
        }
    }
    Ok(parts.join("/"))
}

/// Pure validation of a decoded entry list against the extraction root `dest`.
pub fn plan_extraction(dest: &str, entries: Vec<ArchiveEntry>) -> Result<ExtractionPlan, ShellError> {
    let mut dirs: BTreeSet<String> = BTreeSet::new();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut file_targets: BTreeSet<String> = BTreeSet::new();

    for entry in entries {
        if let EntryKind::Unsupported(kind) = entry.kind {
            return Err(ShellError::validation(format!(
                "unsupported entry type in archive ({}): '{}'",
                kind, entry.name
            )));
        }
        let rel = safe_relative(&entry.name)?;
        if rel.is_empty() {
            if matches!(entry.kind, EntryKind::File(_)) {
                return Err(ShellError::validation(format!(
                    "invalid file name in archive: '{}'",
                    entry.name
                )));
            }
            continue;
        }
        let target = path::join(dest, &rel);
        for ancestor in path::ancestors(&target) {
            if path::is_within(&ancestor, dest) && ancestor != dest {
                dirs.insert(ancestor);
            }
        }
        match entry.kind {
            EntryKind::Dir => {
                dirs.insert(target);
            }
            EntryKind::File(content) => {
                file_targets.insert(target.clone());
                files.push((target, content));
            }
            EntryKind::Unsupported(_) => {}
        }
    }

    if let Some(clash) = dirs.intersection(&file_targets).next() {
        return Err(ShellError::validation(format!(
            "type conflict in archive: '{}' is both a file and a directory",
            clash
        )));
    }

    let mut dirs: Vec<String> = dirs.into_iter().collect();
    dirs.sort_by(|a, b| path::depth(a).cmp(&path::depth(b)).then_with(|| a.cmp(b)));
    Ok(ExtractionPlan { dirs, files })
}

/// First existing symbolic link strictly below `dest` on the way to `target` (inclusive).
async fn symlink_below(fs: &dyn FileSystem, dest: &str, target: &str) -> Option<String> {
    let mut chain = path::ancestors(target);
    chain.push(target.to_string());
    for step in chain {
        if step != dest && path::is_within(&step, dest) && fs.is_symlink(&step).await {
            return Some(step);
        }
    }
    None
}

/// Check the plan against what is on disk, then create `dest`, the directories and the files.
/// Existing files are never replaced and symbolic links below `dest` are never followed.
/// Returns the number of files written.
pub async fn extract(
    fs: &dyn FileSystem,
    command: &str,
    dest: &str,
    plan: ExtractionPlan,
) -> Result<usize, ShellError> {
    if fs.exists(dest).await && !fs.is_dir(dest).await {
        return Err(ShellError::validation(format!(
            "{}: destination '{}' is not a directory",
            command, dest
        )));
    }
    for ancestor in path::ancestors(dest) {
        if fs.is_file(&ancestor).await {
            return Err(ShellError::validation(format!(
                "{}: '{}' is not a directory",
                command, ancestor
            )));
        }
    }
    let targets = plan.dirs.iter().chain(plan.files.iter().map(|(file, _)| file));
    for target in targets {
        if let Some(link) = symlink_below(fs, dest, target).await {
            return Err(ShellError::validation(format!(
                "{}: refusing to extract through symbolic link '{}'",
                command, link
            )));
        }
    }
    for dir in &plan.dirs {
        if fs.is_file(dir).await {
            return Err(ShellError::validation(format!(
                "{}: type conflict: '{}' exists as a file",
                command, dir
            )));
        }
    }
    for (file, _) in &plan.files {
        if fs.is_dir(file).await {
            return Err(ShellError::validation(format!(
                "{}: type conflict: '{}' exists as a directory",
                command, file
            )));
        }
        if fs.exists(file).await {
            return Err(ShellError::validation(format!(
                "{}: '{}' already exists",
                command, file
            )));
        }
    }

    let mut chain = path::ancestors(dest);
    chain.push(dest.to_string());
    chain.extend(plan.dirs.iter().cloned());
    for dir in chain {
        if !fs.is_dir(&dir).await {
            fs.mkdir(&dir).await?;
        }
    }
    let count = plan.files.len();
    for (file, content) in plan.files {
        fs.write(&file, &content).await?;
    }
    debug!(dest, files = count, "extracted archive");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, OsFs};
    use tempfile::TempDir;

    #[test]
    fn test_safe_relative() {
        assert_eq!(safe_relative("a/b.txt").unwrap(), "a/b.txt");
        assert_eq!(safe_relative("./a/./b/../c").unwrap(), "a/c");
        assert_eq!(safe_relative("a/").unwrap(), "a");
        assert!(safe_relative("../evil").is_err());
        assert!(safe_relative("a/../../evil").is_err());
        assert!(safe_relative("/etc/passwd").is_err());
    }

    #[test]
    fn test_plan_adds_implicit_parents() {
        let plan = plan_extraction(
            "/out",
            vec![ArchiveEntry::file("a/b/c.txt", b"c".to_vec())],
        )
        .unwrap();
        assert_eq!(plan.dirs, vec!["/out/a", "/out/a/b"]);
        assert_eq!(plan.files[0].0, "/out/a/b/c.txt");
    }

    #[test]
    fn test_plan_rejects_traversal_and_links() {
        let err = plan_extraction("/out", vec![ArchiveEntry::file("../x", Vec::new())]).unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        let link = ArchiveEntry {
            name: "link".into(),
            kind: EntryKind::Unsupported("symlink"),
        };
        let err = plan_extraction("/out", vec![link]).unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
    }

    #[test]
    fn test_plan_rejects_file_dir_clash() {
        let err = plan_extraction(
            "/out",
            vec![
                ArchiveEntry::file("a", b"x".to_vec()),
                ArchiveEntry::file("a/b", b"y".to_vec()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
    }

    #[tokio::test]
    async fn test_extract_checks_before_writing() {
        let fs = InMemoryFs::new().with_file("/out/a/b", b"in the way");
        let plan = plan_extraction(
            "/out",
            vec![
                ArchiveEntry::file("first.txt", b"1".to_vec()),
                ArchiveEntry::file("a/b/c.txt", b"2".to_vec()),
            ],
        )
        .unwrap();
        let err = extract(&fs, "unzip", "/out", plan).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(!fs.exists("/out/first.txt").await);
    }

    #[tokio::test]
    async fn test_extract_never_replaces_existing_files() {
        let fs = InMemoryFs::new().with_file("/out/keep.txt", b"mine");
        let plan = plan_extraction(
            "/out",
            vec![
                ArchiveEntry::file("first.txt", b"1".to_vec()),
                ArchiveEntry::file("keep.txt", b"theirs".to_vec()),
            ],
        )
        .unwrap();
        let err = extract(&fs, "untar", "/out", plan).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert_eq!(fs.read("/out/keep.txt").await.unwrap(), b"mine");
        assert!(!fs.exists("/out/first.txt").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_refuses_symlinks_inside_destination() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_string_lossy().into_owned();
        let dest = path::join(&root, "dest");
        let outside = path::join(&root, "outside");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, path::join(&dest, "link")).unwrap();
        std::os::unix::fs::symlink(
            path::join(&outside, "target.txt"),
            path::join(&dest, "dangling.txt"),
        )
        .unwrap();
        let fs = OsFs::new(&path::join(&root, ".trash"));

        for name in ["link/pwned.txt", "dangling.txt"] {
            let plan = plan_extraction(&dest, vec![ArchiveEntry::file(name, b"x".to_vec())]).unwrap();
            let err = extract(&fs, "unzip", &dest, plan).await.unwrap_err();
            assert!(matches!(err, ShellError::Validation(_)), "{}", name);
        }
        assert!(std::fs::read_dir(&outside).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_extract_creates_destination() {
        let fs = InMemoryFs::new();
        let plan = plan_extraction(
            "/new/dest",
            vec![ArchiveEntry::dir("empty"), ArchiveEntry::file("x/y.txt", b"y".to_vec())],
        )
        .unwrap();
        let count = extract(&fs, "untar", "/new/dest", plan).await.unwrap();
        assert_eq!(count, 1);
        assert!(fs.is_dir("/new/dest/empty").await);
        assert_eq!(fs.read("/new/dest/x/y.txt").await.unwrap(), b"y");
    }
}
