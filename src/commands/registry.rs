// src/commands/registry.rs
use super::cat::{self, CatCommand};
use super::cd::{self, CdCommand};
use super::cp::{self, CpCommand};
use super::grep::{self, GrepCommand};
use super::ls::{self, LsCommand};
use super::mkdir::{self, MkdirCommand};
use super::mv::{self, MvCommand};
use super::pwd::{self, PwdCommand};
use super::rm::{self, RmCommand};
use super::tar::{self, TarCommand, UntarCommand};
use super::types::Command;
use super::whoami_cmd::{self, WhoamiCommand};
use super::zip::{self, UnzipCommand, ZipCommand};
use super::{help_cmd, history_cmd, undo_cmd};

/// Every command the shell knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Cd,
    Ls,
    Pwd,
    WhoAmI,
    Cat,
    Grep,
    Mkdir,
    Mv,
    Cp,
    Rm,
    Zip,
    Unzip,
    Tar,
    Untar,
    Undo,
    History,
    Help,
    Exit,
}

impl Builtin {
    pub const ALL: [Builtin; 18] = [
        Builtin::Cd,
        Builtin::Ls,
        Builtin::Pwd,
        Builtin::WhoAmI,
        Builtin::Cat,
        Builtin::Grep,
        Builtin::Mkdir,
        Builtin::Mv,
        Builtin::Cp,
        Builtin::Rm,
        Builtin::Zip,
        Builtin::Unzip,
        Builtin::Tar,
        Builtin::Untar,
        Builtin::Undo,
        Builtin::History,
        Builtin::Help,
        Builtin::Exit,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Ls => "ls",
            Builtin::Pwd => "pwd",
            Builtin::WhoAmI => "whoami",
            Builtin::Cat => "cat",
            Builtin::Grep => "grep",
            Builtin::Mkdir => "mkdir",
            Builtin::Mv => "mv",
            Builtin::Cp => "cp",
            Builtin::Rm => "rm",
            Builtin::Zip => "zip",
            Builtin::Unzip => "unzip",
            Builtin::Tar => "tar",
            Builtin::Untar => "untar",
            Builtin::Undo => "undo",
            Builtin::History => "history",
            Builtin::Help => "help",
            Builtin::Exit => "exit",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Builtin::Cd => "change the working directory",
            Builtin::Ls => "list directory contents",
            Builtin::Pwd => "print the working directory",
            Builtin::WhoAmI => "print the user name",
            Builtin::Cat => "print file contents",
            Builtin::Grep => "search files for a pattern",
            Builtin::Mkdir => "create directories (undoable)",
            Builtin::Mv => "move or rename (undoable)",
            Builtin::Cp => "copy files and directories (undoable)",
            Builtin::Rm => "move files to the trash (undoable)",
            Builtin::Zip => "pack into a zip archive",
            Builtin::Unzip => "extract a zip archive",
            Builtin::Tar => "pack into a .tar.gz archive",
            Builtin::Untar => "extract a .tar.gz archive",
            Builtin::Undo => "revert the last undoable command",
            Builtin::History => "show command history",
            Builtin::Help => "list commands or show usage",
            Builtin::Exit => "leave the shell",
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            Builtin::Cd => cd::USAGE,
            Builtin::Ls => ls::USAGE,
            Builtin::Pwd => pwd::USAGE,
            Builtin::WhoAmI => whoami_cmd::USAGE,
            Builtin::Cat => cat::USAGE,
            Builtin::Grep => grep::USAGE,
            Builtin::Mkdir => mkdir::USAGE,
            Builtin::Mv => mv::USAGE,
            Builtin::Cp => cp::USAGE,
            Builtin::Rm => rm::USAGE,
            Builtin::Zip => zip::ZIP_USAGE,
            Builtin::Unzip => zip::UNZIP_USAGE,
            Builtin::Tar => tar::TAR_USAGE,
            Builtin::Untar => tar::UNTAR_USAGE,
            Builtin::Undo => undo_cmd::USAGE,
            Builtin::History => history_cmd::USAGE,
            Builtin::Help => help_cmd::USAGE,
            Builtin::Exit => "Usage: exit\n\nLeave the shell.",
        }
    }

    /// The filesystem command behind this builtin. `None` for builtins that
    /// work on shell state (undo, history, help, exit).
    pub fn command(self) -> Option<&'static dyn Command> {
        let cmd: &'static dyn Command = match self {
            Builtin::Cd => &CdCommand,
            Builtin::Ls => &LsCommand,
            Builtin::Pwd => &PwdCommand,
            Builtin::WhoAmI => &WhoamiCommand,
            Builtin::Cat => &CatCommand,
            Builtin::Grep => &GrepCommand,
            Builtin::Mkdir => &MkdirCommand,
            Builtin::Mv => &MvCommand,
            Builtin::Cp => &CpCommand,
            Builtin::Rm => &RmCommand,
            Builtin::Zip => &ZipCommand,
            Builtin::Unzip => &UnzipCommand,
            Builtin::Tar => &TarCommand,
            Builtin::Untar => &UntarCommand,
            Builtin::Undo | Builtin::History | Builtin::Help | Builtin::Exit => return None,
        };
        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
            assert!(builtin.usage().starts_with("Usage: "));
        }
        assert_eq!(Builtin::from_name("sed"), None);
    }

    #[test]
    fn test_command_names_match() {
        for builtin in Builtin::ALL {
            if let Some(cmd) = builtin.command() {
                assert_eq!(cmd.name(), builtin.name());
            }
        }
    }
}
