//! Logging setup.
//!
//! Diagnostics go to stderr through `tracing`; command output stays on stdout.
//! `RUST_LOG` wins over the configured level. Initialization happens once per
//! process; later calls are ignored.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate when `RUST_LOG` is unset
    pub level: Level,
    /// One JSON object per event instead of human-readable lines
    pub use_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
        }
    }
}

/// Case-insensitive level name, `None` if unrecognised.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

pub fn init(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("revsh={}", config.level)));

        let registry = tracing_subscriber::registry().with(filter);
        let result = if config.use_json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
        };
        if let Err(err) = result {
            eprintln!("revsh: logging disabled: {}", err);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(LoggingConfig::default());
        init(LoggingConfig {
            level: Level::DEBUG,
            use_json: true,
        });
    }
}
