//! Structured logging setup.

use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::{Level, info};

use crate::config::LogSettings;

/// Structured logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: Level,
    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Build from file settings, raising the level once per `-v`.
    pub fn from_settings(settings: &LogSettings, verbosity: u8) -> Self {
        let configured = Level::from_str(&settings.level).unwrap_or(Level::INFO);
        let level = match verbosity {
            0 => configured,
            1 => configured.max(Level::DEBUG),
            _ => Level::TRACE,
        };

        Self {
            level,
            json_format: settings.json,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let fmt_layer = if config.json_format {
        fmt::layer().json().boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(
        level = %config.level,
        json = config.json_format,
        "Structured logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        let settings = LogSettings::default();

        assert_eq!(LoggingConfig::from_settings(&settings, 0).level, Level::INFO);
        assert_eq!(LoggingConfig::from_settings(&settings, 1).level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_settings(&settings, 3).level, Level::TRACE);
    }

    #[test]
    fn test_verbosity_never_lowers_level() {
        let settings = LogSettings {
            level: "trace".to_string(),
            json: true,
        };

        let config = LoggingConfig::from_settings(&settings, 1);
        assert_eq!(config.level, Level::TRACE);
        assert!(config.json_format);
    }
}
