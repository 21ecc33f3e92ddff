// src/commands/help_cmd.rs
use crate::commands::registry::Builtin;
use crate::error::ShellError;

pub const USAGE: &str = "Usage: help [COMMAND]\n\n\
List the available commands, or show the usage of COMMAND.\n\
Every command also accepts --help.";

pub struct HelpCommand;

impl HelpCommand {
    pub fn run(&self, args: &[String]) -> Result<String, ShellError> {
        match args {
            [] => {
                let width = Builtin::ALL.iter().map(|b| b.name().len()).max().unwrap_or(0);
                let mut out = String::from("Available commands:\n");
                for builtin in Builtin::ALL {
                    out.push_str(&format!(
                        "  {:<width$}  {}\n",
                        builtin.name(),
                        builtin.summary(),
                        width = width
                    ));
                }
                out.push_str("\nUse 'help <command>' or '<command> --help' for details.");
                Ok(out)
            }
            [name] => Builtin::from_name(name)
                .map(|b| b.usage().to_string())
                .ok_or_else(|| ShellError::UnknownCommand(name.clone())),
            _ => Err(ShellError::validation("help: too many arguments")),
        }
    }
}
