//! Tracing subscriber initialization.
//!
//! `RUST_LOG` wins over the configured level when set.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Deserialize)]
struct Settings {
    logging: LoggingConfig,
}

impl LoggingConfig {
    /// Defaults overridden by `MASTHEAD_LOGGING__LEVEL` / `MASTHEAD_LOGGING__FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .add_source(
                Environment::with_prefix("MASTHEAD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        let config = settings.logging;
        match config.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(config),
            other => Err(ConfigError::Message(format!(
                "invalid log level: {other}. Must be one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let _ = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}
