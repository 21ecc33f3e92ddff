// src/commands/rm/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;
use crate::fs::BackupStore;
use crate::path;
use crate::undo::UndoRecord;

pub const USAGE: &str = "Usage: rm [-r] [-y] FILE...\n\n\
Move FILE(s) to the trash. Nothing is destroyed; `undo` restores them.\n\n\
Options:\n  \
  -r, -R, --recursive  remove directories and their contents\n  \
  -y, --yes            do not ask for confirmation";

const RECURSIVE: &[&str] = &["-r", "-R", "--recursive"];
const YES: &[&str] = &["-y", "--yes"];

pub struct RmCommand;

#[async_trait]
impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("rm", &["-r", "-R", "--recursive", "-y", "--yes"])?;
        let recursive = ctx.has_flag(RECURSIVE);
        let assume_yes = ctx.has_flag(YES);
        if ctx.args.is_empty() {
            return Err(ShellError::validation("rm: missing operand"));
        }

        // Validate every argument before the first prompt or mutation.
        let mut targets: Vec<(String, bool)> = Vec::new();
        for raw in &ctx.args {
            let target = ctx.resolve(raw);
            if target == "/" {
                return Err(ShellError::validation("rm: refusing to remove '/'"));
            }
            if path::is_within(&target, ctx.fs.trash_dir())
                || path::is_within(ctx.fs.trash_dir(), &target)
            {
                return Err(ShellError::validation(format!(
                    "rm: refusing to touch the trash area: '{}'",
                    raw
                )));
            }
            if path::is_within(&ctx.paths.cwd, &target) {
                return Err(ShellError::validation(format!(
                    "rm: refusing to remove '{}': current directory is inside it",
                    raw
                )));
            }
            // A link is trashed as itself and never walked.
            let is_dir = if ctx.fs.is_symlink(&target).await {
                false
            } else if ctx.fs.is_dir(&target).await {
                true
            } else if ctx.fs.exists(&target).await {
                false
            } else {
                return Err(ShellError::domain(format!(
                    "rm: cannot remove '{}': No such file or directory",
                    raw
                )));
            };
            if is_dir && !recursive {
                return Err(ShellError::validation(format!(
                    "rm: cannot remove '{}': Is a directory (use -r)",
                    raw
                )));
            }
            if !targets.iter().any(|(t, _)| t == &target) {
                targets.push((target, is_dir));
            }
        }

        let mut removed = 0;
        let mut skipped = 0;
        for (target, is_dir) in targets {
            // An earlier argument may already have taken this one with it.
            if !ctx.fs.exists(&target).await {
                continue;
            }
            let question = if is_dir {
                format!("rm: remove directory '{}' and everything in it? [y/N]", target)
            } else {
                format!("rm: remove '{}'? [y/N]", target)
            };
            if !assume_yes && !ctx.prompt.confirm(&question) {
                skipped += 1;
                continue;
            }
            removed += if is_dir {
                remove_tree(ctx, &target).await?
            } else {
                remove_one(ctx, &target).await?;
                1
            };
        }

        let mut out = format!("rm: moved {} object(s) to trash", removed);
        if skipped > 0 {
            out.push_str(&format!(", skipped {}", skipped));
        }
        Ok(CommandOutput::text(out))
    }
}

async fn remove_one(ctx: &mut CommandContext, target: &str) -> Result<(), ShellError> {
    let backup = BackupStore::new(ctx.fs.as_ref()).stash(target).await?;
    ctx.journal
        .record(UndoRecord::removed(backup.original, backup.location));
    Ok(())
}

/// Files first (top-down walk order), then subdirectories deepest first, then the root.
async fn remove_tree(ctx: &mut CommandContext, root: &str) -> Result<usize, ShellError> {
    let walk = ctx.fs.walk(root).await?;
    let mut subdirs = Vec::new();
    let mut count = 0;
    for entry in &walk {
        for file in &entry.files {
            remove_one(ctx, &path::join(&entry.dir, file)).await?;
            count += 1;
        }
        for sub in &entry.subdirs {
            subdirs.push(path::join(&entry.dir, sub));
        }
    }
    subdirs.sort_by(|a, b| {
        path::depth(b)
            .cmp(&path::depth(a))
            .then_with(|| a.cmp(b))
    });
    for dir in &subdirs {
        remove_one(ctx, dir).await?;
        count += 1;
    }
    remove_one(ctx, root).await?;
    Ok(count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{make_ctx, make_ctx_with_prompt, os_fs, sample_fs, ScriptedPrompt};
    use crate::fs::{FileSystem, InMemoryFs};
    use crate::undo::{UndoAction, UndoExecutor};
    use std::sync::Arc;

    fn tree_fs() -> Arc<InMemoryFs> {
        Arc::new(
            InMemoryFs::new()
                .with_dir("/home/test")
                .with_file("/proj/readme.md", "read me")
                .with_file("/proj/src/main.rs", "fn main() {}")
                .with_file("/proj/src/util/mod.rs", "pub mod x;")
                .with_file("/proj/docs/guide.md", "guide")
                .with_dir("/proj/empty"),
        )
    }

    #[tokio::test]
    async fn test_rm_file_and_undo() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["notes.txt"], &["-y"]);
        let out = RmCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "rm: moved 1 object(s) to trash");
        assert!(!fs.exists("/home/test/notes.txt").await);
        let record = &ctx.journal.records()[0];
        assert_eq!(record.action(), UndoAction::Remove);
        assert!(record.dst().starts_with("/.trash/notes.txt."));

        let batch = ctx.journal.take_batch().unwrap();
        UndoExecutor::new(fs.as_ref()).replay(batch).await.unwrap();
        assert_eq!(fs.read("/home/test/notes.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_rm_recursive_record_counts_and_order() {
        let fs = tree_fs();
        let mut ctx = make_ctx(fs.clone(), &["/proj"], &["-r", "-y"]);
        RmCommand.execute(&mut ctx).await.unwrap();
        assert!(!fs.exists("/proj").await);

        // 4 files + 4 subdirectories (docs, empty, src, src/util) + root
        let records = ctx.journal.records().to_vec();
        assert_eq!(records.len(), 9);
        assert!(records.iter().all(|r| r.dst().starts_with("/.trash/")));
        let order: Vec<&str> = records.iter().map(|r| r.src()).collect();
        assert_eq!(
            &order[4..],
            &["/proj/src/util", "/proj/docs", "/proj/empty", "/proj/src", "/proj"]
        );

        let batch = ctx.journal.take_batch().unwrap();
        assert_eq!(batch.records()[0].src(), "/proj");
        UndoExecutor::new(fs.as_ref()).replay(batch).await.unwrap();
        assert_eq!(fs.read("/proj/src/util/mod.rs").await.unwrap(), b"pub mod x;");
        assert_eq!(fs.read("/proj/readme.md").await.unwrap(), b"read me");
        assert!(fs.is_dir("/proj/empty").await);
        assert_eq!(fs.list_dir("/proj").await.unwrap(), vec!["docs", "empty", "readme.md", "src"]);
        assert!(fs.list_dir("/.trash").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rm_recursive_and_undo_on_disk() {
        let (_tmp, fs, root) = os_fs();
        let photos = path::join(&root, "photos");
        fs.mkdir(&path::join(&photos, "raw")).await.unwrap();
        fs.write(&path::join(&photos, "raw/big.raw"), b"RAW").await.unwrap();

        let mut ctx = make_ctx(fs.clone(), &[photos.as_str()], &["-r", "-y"]);
        let out = RmCommand.execute(&mut ctx).await.unwrap();
        // 3 files + raw + photos
        assert_eq!(out.stdout, "rm: moved 5 object(s) to trash");
        assert!(!fs.exists(&photos).await);
        assert!(ctx
            .journal
            .records()
            .iter()
            .all(|r| r.dst().starts_with(fs.trash_dir())));

        let batch = ctx.journal.take_batch().unwrap();
        UndoExecutor::new(fs.as_ref()).replay(batch).await.unwrap();
        assert_eq!(fs.list_dir(&photos).await.unwrap(), vec!["my.png", "photo1.png", "raw"]);
        assert_eq!(fs.read(&path::join(&photos, "photo1.png")).await.unwrap(), b"PNG1");
        assert_eq!(fs.read(&path::join(&photos, "my.png")).await.unwrap(), b"PNG2");
        assert_eq!(fs.read(&path::join(&photos, "raw/big.raw")).await.unwrap(), b"RAW");
        assert!(fs.list_dir(fs.trash_dir()).await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rm_symlink_to_directory_trashes_only_the_link() {
        let (_tmp, fs, root) = os_fs();
        let real = path::join(&root, "photos");
        let link = path::join(&root, "link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut ctx = make_ctx(fs.clone(), &[link.as_str()], &["-r", "-y"]);
        let out = RmCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "rm: moved 1 object(s) to trash");
        assert_eq!(ctx.journal.len(), 1);
        assert!(!fs.exists(&link).await);
        assert_eq!(fs.list_dir(&real).await.unwrap(), vec!["my.png", "photo1.png"]);

        let batch = ctx.journal.take_batch().unwrap();
        UndoExecutor::new(fs.as_ref()).replay(batch).await.unwrap();
        assert!(fs.is_symlink(&link).await);
        assert_eq!(fs.read(&path::join(&link, "my.png")).await.unwrap(), b"PNG2");
    }

    #[tokio::test]
    async fn test_rm_directory_without_r_fails_before_prompt() {
        let fs = tree_fs();
        let prompt = Arc::new(ScriptedPrompt::new(&[true, true]));
        let mut ctx = make_ctx_with_prompt(fs.clone(), &["/proj/readme.md", "/proj"], &[], prompt.clone());
        let err = RmCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(prompt.asked().is_empty());
        assert!(fs.exists("/proj/readme.md").await);
    }

    #[tokio::test]
    async fn test_rm_declined_prompt_skips_only_that_object() {
        let fs = sample_fs();
        let prompt = Arc::new(ScriptedPrompt::new(&[false, true]));
        let mut ctx = make_ctx_with_prompt(fs.clone(), &["notes.txt", "/a/x.txt"], &[], prompt.clone());
        let out = RmCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "rm: moved 1 object(s) to trash, skipped 1");
        assert_eq!(prompt.asked().len(), 2);
        assert!(fs.exists("/home/test/notes.txt").await);
        assert!(!fs.exists("/a/x.txt").await);
        assert_eq!(ctx.journal.len(), 1);
    }

    #[tokio::test]
    async fn test_rm_missing_is_domain_error() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["notes.txt", "ghost"], &["-y"]);
        let err = RmCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Domain(_)));
        assert!(fs.exists("/home/test/notes.txt").await);
    }

    #[tokio::test]
    async fn test_rm_refuses_trash_and_root() {
        let fs = sample_fs();
        fs.delete("/a/x.txt").await.unwrap();
        for target in ["/.trash", "/"] {
            let mut ctx = make_ctx(fs.clone(), &[target], &["-r", "-y"]);
            let err = RmCommand.execute(&mut ctx).await.unwrap_err();
            assert!(matches!(err, ShellError::Validation(_)), "{}", target);
        }
    }

    #[tokio::test]
    async fn test_rm_refuses_cwd_ancestor() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/home"], &["-r", "-y"]);
        let err = RmCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rm_overlapping_arguments() {
        let fs = tree_fs();
        let mut ctx = make_ctx(fs.clone(), &["/proj", "/proj/readme.md"], &["-r", "-y"]);
        RmCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.journal.len(), 9);
    }
}
