// src/commands/undo_cmd.rs
use crate::commands::types::check_flags;
use crate::error::ShellError;
use crate::fs::FileSystem;
use crate::undo::{UndoExecutor, UndoLedger};

pub const USAGE: &str = "Usage: undo [-l] [--clear]\n\n\
Revert the most recent mv, cp, rm or mkdir.\n\n\
Options:\n  \
  -l, --list  show how many commands can be undone and what undo would revert next\n  \
      --clear forget every recorded command (files are not touched)";

const LIST: &[&str] = &["-l", "--list"];
const CLEAR: &[&str] = &["--clear"];

/// Works on the shell's ledger rather than through a `CommandContext`.
pub struct UndoCommand;

impl UndoCommand {
    pub async fn run(
        &self,
        args: &[String],
        flags: &[String],
        fs: &dyn FileSystem,
        ledger: &mut dyn UndoLedger,
    ) -> Result<String, ShellError> {
        check_flags("undo", flags, &[LIST, CLEAR].concat())?;
        if !args.is_empty() {
            return Err(ShellError::validation("undo: takes no arguments"));
        }
        let has = |names: &[&str]| flags.iter().any(|f| names.contains(&f.as_str()));

        if has(CLEAR) {
            let dropped = ledger.len()?;
            ledger.clear()?;
            return Ok(format!("undo: forgot {} command(s)", dropped));
        }
        if has(LIST) {
            let depth = ledger.len()?;
            let mut lines = vec![format!("undo: {} command(s) can be undone", depth)];
            if let Some(batch) = ledger.peek()? {
                lines.push("next undo reverts:".to_string());
                lines.extend(batch.records().iter().map(|r| format!("  {}", r)));
            }
            return Ok(lines.join("\n"));
        }
        UndoExecutor::new(fs).undo(ledger).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use crate::undo::{InMemoryLedger, UndoBatch, UndoRecord};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ledger_with_mkdir() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger
            .push(UndoBatch::from_mutations(vec![UndoRecord::created_dir("/d")]).unwrap())
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_undo_pops_and_reverts() {
        let fs = InMemoryFs::new().with_dir("/d");
        let mut ledger = ledger_with_mkdir();
        let out = UndoCommand.run(&[], &[], &fs, &mut ledger).await.unwrap();
        assert_eq!(out, "removed directory '/d'");
        assert!(!fs.exists("/d").await);
        assert_eq!(ledger.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_undo_empty_is_domain_error() {
        let fs = InMemoryFs::new();
        let mut ledger = InMemoryLedger::new();
        let err = UndoCommand.run(&[], &[], &fs, &mut ledger).await.unwrap_err();
        assert!(matches!(err, ShellError::Domain(_)));
    }

    #[tokio::test]
    async fn test_undo_rejects_arguments() {
        let fs = InMemoryFs::new().with_dir("/d");
        let mut ledger = ledger_with_mkdir();
        let err = UndoCommand
            .run(&strings(&["2"]), &[], &fs, &mut ledger)
            .await
            .unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_undo_list_and_clear() {
        let fs = InMemoryFs::new().with_dir("/d");
        let mut ledger = ledger_with_mkdir();
        let out = UndoCommand
            .run(&[], &strings(&["-l"]), &fs, &mut ledger)
            .await
            .unwrap();
        assert_eq!(out, "undo: 1 command(s) can be undone\nnext undo reverts:\n  mkdir /d");
        assert_eq!(ledger.len().unwrap(), 1);

        let out = UndoCommand
            .run(&[], &strings(&["--clear"]), &fs, &mut ledger)
            .await
            .unwrap();
        assert_eq!(out, "undo: forgot 1 command(s)");
        assert!(ledger.is_empty().unwrap());
        assert!(fs.is_dir("/d").await);
    }
}
