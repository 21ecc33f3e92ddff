// src/commands/history_cmd.rs
use crate::commands::types::check_flags;
use crate::error::ShellError;
use crate::shell::history::HistoryStore;

pub const USAGE: &str = "Usage: history [-c] [N]\n\n\
Show the command history, or only the last N entries.\n\n\
Options:\n  \
  -c  clear the history list";

pub struct HistoryCommand;

impl HistoryCommand {
    pub fn run(
        &self,
        args: &[String],
        flags: &[String],
        store: &mut dyn HistoryStore,
    ) -> Result<String, ShellError> {
        check_flags("history", flags, &["-c"])?;
        if flags.iter().any(|f| f == "-c") {
            store.clear()?;
            return Ok(String::new());
        }
        let lines = match args {
            [] => store.all()?,
            [n] => {
                let n: usize = n.parse().map_err(|_| {
                    ShellError::validation(format!("history: {}: numeric argument required", n))
                })?;
                store.last(n)?
            }
            _ => return Err(ShellError::validation("history: too many arguments")),
        };
        Ok(lines.join("\n"))
    }
}
