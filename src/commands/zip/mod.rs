// src/commands/zip/mod.rs
pub mod archive;

use async_trait::async_trait;
use tracing::info;

use crate::commands::utils::archive::{archive_target, collect_entries, extract, plan_extraction};
use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;

use archive::{pack_zip, unpack_zip};

pub const ZIP_USAGE: &str = "Usage: zip [-r] SOURCE... ARCHIVE.zip\n\n\
Pack SOURCEs into a zip archive.\n\n\
Options:\n  \
  -r, -R, --recursive  include directories and their contents";

pub const UNZIP_USAGE: &str = "Usage: unzip ARCHIVE.zip [DEST]\n\n\
Extract a zip archive into DEST (the current directory by default).\n\
Entries that would land outside DEST, links and special files are refused.";

const RECURSIVE: &[&str] = &["-r", "-R", "--recursive"];

pub struct ZipCommand;

#[async_trait]
impl Command for ZipCommand {
    fn name(&self) -> &'static str {
        "zip"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("zip", RECURSIVE)?;
        if ctx.args.len() < 2 {
            return Err(ShellError::validation("zip: usage: zip [-r] SOURCE... ARCHIVE.zip"));
        }
        let (raw_archive, sources) = ctx.args.split_last().ok_or_else(|| {
            ShellError::validation("zip: missing archive name")
        })?;
        let target = archive_target(ctx, "zip", raw_archive).await?;
        let entries =
            collect_entries(ctx, "zip", sources, ctx.has_flag(RECURSIVE), &target).await?;
        let bytes = pack_zip(&entries)?;
        ctx.fs.write(&target, &bytes).await?;
        info!(archive = %target, entries = entries.len(), "zip archive written");
        Ok(CommandOutput::text(format!(
            "zip: added {} entr{} to '{}'",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            target
        )))
    }
}

pub struct UnzipCommand;

#[async_trait]
impl Command for UnzipCommand {
    fn name(&self) -> &'static str {
        "unzip"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        ctx.check_flags("unzip", &[])?;
        if ctx.args.is_empty() || ctx.args.len() > 2 {
            return Err(ShellError::validation("unzip: usage: unzip ARCHIVE.zip [DEST]"));
        }
        let source = ctx.resolve(&ctx.args[0]);
        if !ctx.fs.is_file(&source).await {
            return Err(ShellError::domain(format!(
                "unzip: {}: No such file",
                ctx.args[0]
            )));
        }
        let dest = match ctx.args.get(1) {
            Some(raw) => ctx.resolve(raw),
            None => ctx.paths.cwd.clone(),
        };

        let bytes = ctx.fs.read(&source).await?;
        let plan = plan_extraction(&dest, unpack_zip(&bytes)?)?;
        let count = extract(ctx.fs.as_ref(), "unzip", &dest, plan).await?;
        Ok(CommandOutput::text(format!(
            "unzip: extracted {} file(s) into '{}'",
            count, dest
        )))
    }
}
