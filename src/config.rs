//! Shell configuration.
//!
//! Values come from an optional TOML file and from the command line; command
//! line values override the file, the file overrides built-in defaults.
//!
//! ```toml
//! backend = "os"
//! user = "alice"
//! trash_dir = "/var/tmp/revsh-trash"
//! ledger = "~/.local/share/revsh/ledger.json"
//! history = "~/.local/share/revsh/history"
//! assume_yes = false
//! log_level = "info"
//! json_logs = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::commands::{AssumeYes, Prompt, StdinPrompt};
use crate::fs::{FileSystem, OsFs};
use crate::logging::{parse_level, LoggingConfig};
use crate::shell::history::{FileHistory, HistoryStore};
use crate::shell::{ShellOptions, DEFAULT_USER};
use crate::undo::{JsonFileLedger, UndoLedger};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid log level '{0}' (expected trace, debug, info, warn or error)")]
    LogLevel(String),

    #[error("cannot determine a trash directory for the os backend; set trash_dir")]
    NoTrashDir,

    #[error("cannot determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Which filesystem the shell works on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A virtual tree that lives only as long as the process
    #[default]
    Memory,
    /// The host filesystem
    Os,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub backend: Option<Backend>,
    pub cwd: Option<String>,
    pub home: Option<String>,
    pub user: Option<String>,
    pub trash_dir: Option<String>,
    pub ledger: Option<PathBuf>,
    pub history: Option<PathBuf>,
    pub assume_yes: Option<bool>,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl ShellConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Values set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: ShellConfig) -> ShellConfig {
        ShellConfig {
            backend: overrides.backend.or(self.backend),
            cwd: overrides.cwd.or(self.cwd),
            home: overrides.home.or(self.home),
            user: overrides.user.or(self.user),
            trash_dir: overrides.trash_dir.or(self.trash_dir),
            ledger: overrides.ledger.or(self.ledger),
            history: overrides.history.or(self.history),
            assume_yes: overrides.assume_yes.or(self.assume_yes),
            log_level: overrides.log_level.or(self.log_level),
            json_logs: overrides.json_logs.or(self.json_logs),
        }
    }

    pub fn logging(&self) -> Result<LoggingConfig, ConfigError> {
        let mut config = LoggingConfig {
            use_json: self.json_logs.unwrap_or(false),
            ..Default::default()
        };
        if let Some(name) = &self.log_level {
            config.level = parse_level(name).ok_or_else(|| ConfigError::LogLevel(name.clone()))?;
        }
        Ok(config)
    }

    /// Build the shell options. The os backend defaults to the process's
    /// working directory, the real home directory and `$USER`.
    pub fn into_options(self) -> Result<ShellOptions, ConfigError> {
        let backend = self.backend.unwrap_or_default();
        let prompt: Arc<dyn Prompt> = if self.assume_yes.unwrap_or(false) {
            Arc::new(AssumeYes)
        } else {
            Arc::new(StdinPrompt)
        };

        let mut options = ShellOptions {
            cwd: self.cwd,
            home: self.home,
            user: self.user,
            prompt: Some(prompt),
            ledger: self
                .ledger
                .map(|p| Box::new(JsonFileLedger::new(expand_home(&p))) as Box<dyn UndoLedger>),
            history: self
                .history
                .map(|p| Box::new(FileHistory::new(expand_home(&p))) as Box<dyn HistoryStore>),
            ..Default::default()
        };

        if backend == Backend::Os {
            let trash = match self.trash_dir {
                Some(dir) => dir,
                None => OsFs::default_trash_dir().ok_or(ConfigError::NoTrashDir)?,
            };
            let fs: Arc<dyn FileSystem> = Arc::new(OsFs::new(&trash));
            options.fs = Some(fs);
            if options.cwd.is_none() {
                let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
                options.cwd = Some(cwd.to_string_lossy().into_owned());
            }
            if options.home.is_none() {
                options.home = dirs::home_dir().map(|h| h.to_string_lossy().into_owned());
            }
            if options.user.is_none() {
                options.user =
                    Some(std::env::var("USER").unwrap_or_else(|_| DEFAULT_USER.to_string()));
            }
        } else {
            options.trash_dir = self.trash_dir;
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file() {
        let config = ShellConfig::from_toml(
            "backend = \"os\"\nuser = \"alice\"\nassume_yes = true\n",
            Path::new("revsh.toml"),
        )
        .unwrap();
        assert_eq!(config.backend, Some(Backend::Os));
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.assume_yes, Some(true));
        assert!(config.ledger.is_none());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = ShellConfig::from_toml("colour = \"red\"\n", Path::new("revsh.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = ShellConfig {
            user: Some("alice".into()),
            backend: Some(Backend::Os),
            ..Default::default()
        };
        let cli = ShellConfig {
            backend: Some(Backend::Memory),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.backend, Some(Backend::Memory));
        assert_eq!(merged.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_bad_log_level() {
        let config = ShellConfig {
            log_level: Some("chatty".into()),
            ..Default::default()
        };
        assert!(matches!(config.logging(), Err(ConfigError::LogLevel(_))));
    }

    #[tokio::test]
    async fn test_memory_options_with_custom_trash() {
        let config = ShellConfig {
            trash_dir: Some("/bin-of-shame".into()),
            user: Some("bob".into()),
            assume_yes: Some(true),
            ..Default::default()
        };
        let options = config.into_options().unwrap();
        assert!(options.fs.is_none());
        let shell = crate::shell::Shell::new(options).await;
        assert_eq!(shell.fs().trash_dir(), "/bin-of-shame");
        assert_eq!(shell.cwd(), "/home/bob");
        assert_eq!(shell.user(), "bob");
    }
}
