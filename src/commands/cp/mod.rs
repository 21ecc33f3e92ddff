// src/commands/cp/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;
use crate::fs::BackupStore;
use crate::path;
use crate::undo::UndoRecord;

pub const USAGE: &str = "Usage: cp [-r] SOURCE... DEST\n\n\
Copy SOURCE to DEST, or multiple SOURCE(s) into DIRECTORY.\n\n\
Options:\n  \
  -r, -R, --recursive  copy directories recursively\n\n\
A trailing '/*' or '/.' on a directory SOURCE copies its contents\n\
straight into DEST. Files overwritten at DEST go to the trash first.";

const RECURSIVE: &[&str] = &["-r", "-R", "--recursive"];

pub struct CpCommand;

/// Split the "contents of directory" sentinel (`dir/*`, `dir/.`, `*`, `.`) off a source.
fn split_contents_sentinel(raw: &str) -> (bool, &str) {
    match raw {
        "*" | "." => (true, "."),
        _ => {
            for suffix in ["/*", "/."] {
                if let Some(base) = raw.strip_suffix(suffix) {
                    return (true, if base.is_empty() { "/" } else { base });
                }
            }
            (false, raw)
        }
    }
}

#[async_trait]
impl Command for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("cp", RECURSIVE)?;
        let recursive = ctx.has_flag(RECURSIVE);
        if ctx.args.len() < 2 {
            return Err(ShellError::validation(
                "cp: missing destination file operand; usage: cp [-r] SOURCE... DEST",
            ));
        }
        let mut sources = ctx.args.clone();
        let dest = sources.pop().unwrap_or_default();
        let dest_path = ctx.resolve(&dest);
        let dest_is_dir = ctx.fs.is_dir(&dest_path).await;

        if sources.len() > 1 && !dest_is_dir {
            return Err(ShellError::validation(format!(
                "cp: target '{}' is not a directory",
                dest
            )));
        }

        let before = ctx.journal.len();
        for raw in &sources {
            let (contents_only, base) = split_contents_sentinel(raw);
            let src = ctx.resolve(base);

            if ctx.fs.is_file(&src).await {
                if contents_only {
                    return Err(ShellError::validation(format!(
                        "cp: '{}' is not a directory",
                        base
                    )));
                }
                let target = if dest_is_dir {
                    path::join(&dest_path, path::basename(&src))
                } else {
                    dest_path.clone()
                };
                copy_file(ctx, &src, &target).await?;
                continue;
            }

            if !ctx.fs.is_dir(&src).await {
                return Err(ShellError::domain(format!(
                    "cp: cannot stat '{}': No such file or directory",
                    raw
                )));
            }
            if !recursive {
                return Err(ShellError::validation(format!(
                    "cp: -r not specified; omitting directory '{}'",
                    raw
                )));
            }
            if ctx.fs.is_file(&dest_path).await {
                return Err(ShellError::validation(format!(
                    "cp: cannot overwrite non-directory '{}' with directory '{}'",
                    dest, raw
                )));
            }

            let root = if dest_is_dir && !contents_only {
                path::join(&dest_path, path::basename(&src))
            } else {
                dest_path.clone()
            };
            if path::is_within(&root, &src) {
                return Err(ShellError::validation(format!(
                    "cp: cannot copy a directory, '{}', into itself, '{}'",
                    raw, dest
                )));
            }
            copy_tree(ctx, &src, &root).await?;
        }

        let placed = ctx.journal.len() - before;
        Ok(CommandOutput::text(format!("cp: copied {} object(s)", placed)))
    }
}

async fn ensure_dir(ctx: &mut CommandContext, dir: &str) -> Result<(), ShellError> {
    if ctx.fs.is_dir(dir).await {
        return Ok(());
    }
    if ctx.fs.is_file(dir).await {
        return Err(ShellError::validation(format!(
            "cp: type conflict: '{}' is a file, expected a directory",
            dir
        )));
    }
    if !ctx.fs.is_dir(&path::dirname(dir)).await {
        return Err(ShellError::validation(format!(
            "cp: target directory '{}' does not exist",
            path::dirname(dir)
        )));
    }
    ctx.fs.mkdir(dir).await?;
    ctx.journal.record(UndoRecord::created_dir(dir));
    Ok(())
}

async fn copy_file(ctx: &mut CommandContext, src: &str, target: &str) -> Result<(), ShellError> {
    let fs = ctx.fs.clone();
    let parent = path::dirname(target);
    if !fs.is_dir(&parent).await {
        return Err(ShellError::validation(format!(
            "cp: cannot create '{}': target directory does not exist",
            target
        )));
    }
    if target == src {
        return Err(ShellError::validation(format!(
            "cp: '{}' and '{}' are the same file",
            src, target
        )));
    }
    if fs.is_dir(target).await {
        return Err(ShellError::validation(format!(
            "cp: type conflict: cannot overwrite directory '{}' with non-directory",
            target
        )));
    }

    let backups = BackupStore::new(fs.as_ref());
    let backup = if fs.is_file(target).await {
        Some(backups.stash(target).await?)
    } else {
        None
    };
    if let Err(err) = fs.copy(src, target).await {
        if let Some(backup) = &backup {
            backups.put_back(backup).await;
        }
        return Err(err.into());
    }
    ctx.journal
        .record(UndoRecord::copied(src, target, backup.map(|b| b.location)));
    Ok(())
}

/// Merge the contents of `src` into `root`, creating directories before the files in them.
async fn copy_tree(ctx: &mut CommandContext, src: &str, root: &str) -> Result<(), ShellError> {
    let walk = ctx.fs.walk(src).await?;
    ensure_dir(ctx, root).await?;
    for entry in walk {
        let rel = path::relative_to(&entry.dir, src).unwrap_or("");
        let target_dir = path::join(root, rel);
        for sub in &entry.subdirs {
            ensure_dir(ctx, &path::join(&target_dir, sub)).await?;
        }
        for file in &entry.files {
            copy_file(
                ctx,
                &path::join(&entry.dir, file),
                &path::join(&target_dir, file),
            )
            .await?;
        }
    }
    Ok(())
}
