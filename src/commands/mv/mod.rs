// src/commands/mv/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;
use crate::fs::BackupStore;
use crate::path;
use crate::undo::UndoRecord;

pub const USAGE: &str = "Usage: mv SOURCE... DEST\n\n\
Rename SOURCE to DEST, or move SOURCE(s) into DIRECTORY.\n\
An existing DEST is moved to the trash first, so `undo` can bring it back.";

pub struct MvCommand;

#[async_trait]
impl Command for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("mv", &[])?;
        let Some((dest, sources)) = ctx.args.split_last() else {
            return Err(ShellError::validation("mv: missing file operand"));
        };
        if sources.is_empty() {
            return Err(ShellError::validation(format!(
                "mv: missing destination file operand after '{}'",
                dest
            )));
        }
        let sources = sources.to_vec();
        let dest_path = ctx.resolve(dest);
        let fs = ctx.fs.clone();
        let dest_is_dir = fs.is_dir(&dest_path).await;

        if sources.len() > 1 && !dest_is_dir {
            return Err(ShellError::validation(format!(
                "mv: target '{}' is not a directory",
                dest
            )));
        }

        let backups = BackupStore::new(fs.as_ref());
        let mut lines = Vec::new();

        for raw in &sources {
            let src = ctx.resolve(raw);
            if !fs.exists(&src).await {
                return Err(ShellError::domain(format!(
                    "mv: cannot stat '{}': No such file or directory",
                    raw
                )));
            }

            let target = if dest_is_dir {
                path::join(&dest_path, path::basename(&src))
            } else {
                let parent = path::dirname(&dest_path);
                if !fs.is_dir(&parent).await {
                    return Err(ShellError::validation(format!(
                        "mv: cannot move '{}' to '{}': target directory does not exist",
                        raw, dest
                    )));
                }
                dest_path.clone()
            };

            if target == src {
                return Err(ShellError::validation(format!(
                    "mv: '{}' and '{}' are the same file",
                    raw, dest
                )));
            }
            if path::is_within(&src, &target) {
                return Err(ShellError::validation(format!(
                    "mv: cannot move '{}' over '{}', which contains it",
                    raw, target
                )));
            }
            if fs.is_dir(&src).await && path::is_within(&target, &src) {
                return Err(ShellError::validation(format!(
                    "mv: cannot move '{}' to a subdirectory of itself, '{}'",
                    raw, target
                )));
            }
            if fs.is_dir(&target).await && !fs.is_dir(&src).await {
                return Err(ShellError::validation(format!(
                    "mv: cannot overwrite directory '{}' with non-directory",
                    target
                )));
            }

            let backup = if fs.exists(&target).await {
                Some(backups.stash(&target).await?)
            } else {
                None
            };

            let landed = match fs.mv(&src, &target).await {
                Ok(landed) => landed,
                Err(err) => {
                    if let Some(backup) = &backup {
                        backups.put_back(backup).await;
                    }
                    return Err(err.into());
                }
            };

            ctx.journal.record(UndoRecord::moved(
                src.clone(),
                landed.clone(),
                backup.map(|b| b.location),
            ));
            lines.push(format!("renamed '{}' -> '{}'", src, landed));
        }

        Ok(CommandOutput::text(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{make_ctx, os_fs, sample_fs};
    use crate::fs::FileSystem;
    use crate::undo::{UndoBatch, UndoExecutor};

    async fn undo(fs: &dyn FileSystem, ctx: &mut CommandContext) -> String {
        let batch: UndoBatch = ctx.journal.take_batch().unwrap();
        UndoExecutor::new(fs).replay(batch).await.unwrap()
    }

    #[tokio::test]
    async fn test_mv_rename_and_undo() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["notes.txt", "renamed.txt"], &[]);
        let out = MvCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "renamed '/home/test/notes.txt' -> '/home/test/renamed.txt'");
        assert!(!fs.exists("/home/test/notes.txt").await);
        assert_eq!(fs.read("/home/test/renamed.txt").await.unwrap(), b"hello");
        assert_eq!(ctx.journal.len(), 1);
        assert!(!ctx.journal.records()[0].overwrite());

        undo(fs.as_ref(), &mut ctx).await;
        assert_eq!(fs.read("/home/test/notes.txt").await.unwrap(), b"hello");
        assert!(!fs.exists("/home/test/renamed.txt").await);
    }

    #[tokio::test]
    async fn test_mv_overwrite_and_undo() {
        let fs = sample_fs();
        fs.write("/b/x.txt", b"OLD").await.unwrap();
        let mut ctx = make_ctx(fs.clone(), &["/a/x.txt", "/b/x.txt"], &[]);
        MvCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(fs.read("/b/x.txt").await.unwrap(), b"NEW");
        assert!(!fs.exists("/a/x.txt").await);
        let record = &ctx.journal.records()[0];
        assert!(record.overwrite());
        assert!(record.overwritten_backup().unwrap().starts_with("/.trash/x.txt."));

        undo(fs.as_ref(), &mut ctx).await;
        assert_eq!(fs.read("/a/x.txt").await.unwrap(), b"NEW");
        assert_eq!(fs.read("/b/x.txt").await.unwrap(), b"OLD");
    }

    #[tokio::test]
    async fn test_mv_into_directory() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/a/x.txt", "/b"], &[]);
        MvCommand.execute(&mut ctx).await.unwrap();
        assert!(fs.is_file("/b/x.txt").await);
        assert_eq!(ctx.journal.records()[0].dst(), "/b/x.txt");
    }

    #[tokio::test]
    async fn test_mv_multiple_sources_undo_reverse_order() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/a/x.txt", "notes.txt", "/b"], &[]);
        MvCommand.execute(&mut ctx).await.unwrap();
        let batch = ctx.journal.take_batch().unwrap();
        assert_eq!(batch.records()[0].src(), "/home/test/notes.txt");
        assert_eq!(batch.records()[1].src(), "/a/x.txt");
        UndoExecutor::new(fs.as_ref()).replay(batch).await.unwrap();
        assert!(fs.is_file("/a/x.txt").await);
        assert!(fs.is_file("/home/test/notes.txt").await);
        assert!(fs.list_dir("/b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mv_multiple_sources_need_directory() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/a/x.txt", "notes.txt", "/missing"], &[]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(fs.is_file("/a/x.txt").await);
    }

    #[tokio::test]
    async fn test_mv_into_own_subtree() {
        let fs = sample_fs();
        fs.mkdir("/a/inner").await.unwrap();
        let mut ctx = make_ctx(fs.clone(), &["/a", "/a/inner"], &[]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(ctx.journal.is_empty());
    }

    #[tokio::test]
    async fn test_mv_onto_own_ancestor() {
        let fs = sample_fs();
        fs.mkdir("/p").await.unwrap();
        fs.mkdir("/p/q").await.unwrap();
        fs.mkdir("/p/q/p").await.unwrap();
        let mut ctx = make_ctx(fs.clone(), &["/p/q/p", "/"], &[]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(ctx.journal.is_empty());
        assert!(fs.is_dir("/p/q/p").await);
        assert!(!fs.exists("/.trash").await);
    }

    #[tokio::test]
    async fn test_mv_overwrite_and_undo_on_disk() {
        let (_tmp, fs, root) = os_fs();
        let src = path::join(&root, "a/x.txt");
        let dst = path::join(&root, "b/x.txt");
        fs.write(&dst, b"OLD").await.unwrap();

        let mut ctx = make_ctx(fs.clone(), &[src.as_str(), dst.as_str()], &[]);
        MvCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(fs.read(&dst).await.unwrap(), b"NEW");
        assert!(!fs.exists(&src).await);
        let backup = ctx.journal.records()[0].overwritten_backup().unwrap().to_string();
        assert!(backup.starts_with(&path::join(fs.trash_dir(), "x.txt.")));

        undo(fs.as_ref(), &mut ctx).await;
        assert_eq!(fs.read(&src).await.unwrap(), b"NEW");
        assert_eq!(fs.read(&dst).await.unwrap(), b"OLD");
        assert!(!fs.exists(&backup).await);
    }

    #[tokio::test]
    async fn test_mv_same_path() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["notes.txt", "./notes.txt"], &[]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert_eq!(fs.read("/home/test/notes.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_mv_missing_parent() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["notes.txt", "/nowhere/notes.txt"], &[]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
    }

    #[tokio::test]
    async fn test_mv_missing_source() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["ghost.txt", "/b"], &[]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Domain(_)));
    }

    #[tokio::test]
    async fn test_mv_partial_failure_keeps_journal() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/a/x.txt", "ghost.txt", "/b"], &[]);
        assert!(MvCommand.execute(&mut ctx).await.is_err());
        assert_eq!(ctx.journal.len(), 1);
        assert!(fs.is_file("/b/x.txt").await);
    }

    #[tokio::test]
    async fn test_mv_rejects_unknown_flag() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs, &["a", "b"], &["-z"]);
        let err = MvCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
    }
}
