// src/commands/tar/mod.rs
pub mod archive;

use async_trait::async_trait;
use tracing::info;

use crate::commands::utils::archive::{archive_target, collect_entries, extract, plan_extraction};
use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;

use archive::{pack_tar_gz, unpack_tar_gz};

pub const TAR_USAGE: &str = "Usage: tar [-r] SOURCE... ARCHIVE.tar.gz\n\n\
Pack SOURCEs into a gzip-compressed tar archive.\n\n\
Options:\n  \
  -r, -R, --recursive  include directories and their contents";

pub const UNTAR_USAGE: &str = "Usage: untar ARCHIVE.tar.gz [DEST]\n\n\
Extract a .tar.gz archive into DEST (the current directory by default).\n\
Entries that would land outside DEST, links and special files are refused.";

const RECURSIVE: &[&str] = &["-r", "-R", "--recursive"];

fn has_tar_gz_suffix(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".tar.gz") || lower.ends_with(".tgz")
}

pub struct TarCommand;

#[async_trait]
impl Command for TarCommand {
    fn name(&self) -> &'static str {
        "tar"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("tar", RECURSIVE)?;
        if ctx.args.len() < 2 {
            return Err(ShellError::validation(
                "tar: usage: tar [-r] SOURCE... ARCHIVE.tar.gz",
            ));
        }
        let (raw_archive, sources) = ctx
            .args
            .split_last()
            .ok_or_else(|| ShellError::validation("tar: missing archive name"))?;
        if !has_tar_gz_suffix(raw_archive) {
            return Err(ShellError::validation(format!(
                "tar: '{}': archive name must end in .tar.gz or .tgz",
                raw_archive
            )));
        }
        let target = archive_target(ctx, "tar", raw_archive).await?;
        let entries =
            collect_entries(ctx, "tar", sources, ctx.has_flag(RECURSIVE), &target).await?;
        let bytes = pack_tar_gz(&entries)?;
        ctx.fs.write(&target, &bytes).await?;
        info!(archive = %target, entries = entries.len(), "tar archive written");
        Ok(CommandOutput::text(format!(
            "tar: packed {} entr{} into '{}'",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            target
        )))
    }
}

pub struct UntarCommand;

#[async_trait]
impl Command for UntarCommand {
    fn name(&self) -> &'static str {
        "untar"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("untar", &[])?;
        if ctx.args.is_empty() || ctx.args.len() > 2 {
            return Err(ShellError::validation(
                "untar: usage: untar ARCHIVE.tar.gz [DEST]",
            ));
        }
        let source = ctx.resolve(&ctx.args[0]);
        if !ctx.fs.is_file(&source).await {
            return Err(ShellError::domain(format!(
                "untar: {}: No such file",
                ctx.args[0]
            )));
        }
        let dest = match ctx.args.get(1) {
            Some(raw) => ctx.resolve(raw),
            None => ctx.paths.cwd.clone(),
        };

        let bytes = ctx.fs.read(&source).await?;
        let plan = plan_extraction(&dest, unpack_tar_gz(&bytes)?)?;
        let count = extract(ctx.fs.as_ref(), "untar", &dest, plan).await?;
        Ok(CommandOutput::text(format!(
            "untar: extracted {} file(s) into '{}'",
            count, dest
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{make_ctx, sample_fs};
    use crate::fs::FileSystem;

    #[test]
    fn test_suffix_check() {
        assert!(has_tar_gz_suffix("a.tar.gz"));
        assert!(has_tar_gz_suffix("A.TGZ"));
        assert!(!has_tar_gz_suffix("a.tar"));
        assert!(!has_tar_gz_suffix("a.zip"));
    }

    #[tokio::test]
    async fn test_tar_then_untar() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/photos", "notes.txt", "/b/pics.tgz"], &["-r"]);
        let out = TarCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "tar: packed 4 entries into '/b/pics.tgz'");
        assert!(ctx.journal.is_empty());

        let mut ctx = make_ctx(fs.clone(), &["/b/pics.tgz", "/restore"], &[]);
        let out = UntarCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "untar: extracted 3 file(s) into '/restore'");
        assert_eq!(fs.read("/restore/photos/my.png").await.unwrap(), b"PNG2");
        assert_eq!(fs.read("/restore/notes.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_tar_rejects_wrong_suffix() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["notes.txt", "/b/out.zip"], &[]);
        let err = TarCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(!fs.exists("/b/out.zip").await);
    }

    #[tokio::test]
    async fn test_tar_directory_needs_r() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs, &["/photos", "/b/p.tar.gz"], &[]);
        let err = TarCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
    }

    #[tokio::test]
    async fn test_untar_defaults_to_cwd() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs.clone(), &["/a", "/b/a.tar.gz"], &["-r"]);
        TarCommand.execute(&mut ctx).await.unwrap();
        let mut ctx = make_ctx(fs.clone(), &["/b/a.tar.gz"], &[]);
        UntarCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(fs.read("/home/test/a/x.txt").await.unwrap(), b"NEW");
    }

    #[tokio::test]
    async fn test_untar_missing_archive() {
        let fs = sample_fs();
        let mut ctx = make_ctx(fs, &["/nope.tgz"], &[]);
        let err = UntarCommand.execute(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::Domain(_)));
    }
}
