//! Daemon configuration.
//!
//! Loaded from an optional YAML file, then overridden by command-line flags
//! (see [`crate::cli::Cli`]). Every field has a default, so an empty file or
//! no file at all yields a runnable configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use candash_bus::{BusMode, BusSettings};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::ingest::PayloadLayout;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_PUSH_INTERVAL_MS: u64 = 25;
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 5_000;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8001))
}

/// Complete daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CandashConfig {
    pub server: ServerConfig,
    pub broadcast: BroadcastConfig,
    pub bus: BusConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LogSettings,
}

/// WebSocket server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Broadcast session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Delay between pushes to one client. Zero pushes as fast as the
    /// scheduler allows.
    pub push_interval_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            push_interval_ms: DEFAULT_PUSH_INTERVAL_MS,
        }
    }
}

impl BroadcastConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }
}

/// Bus and ingestion configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    #[serde(flatten)]
    pub listener: BusSettings,
    pub payload_layout: PayloadLayout,
}

/// Handshake diagnostic configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Endpoint queried once at startup; disabled when unset.
    pub handshake_url: Option<String>,
    pub handshake_timeout_ms: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            handshake_url: None,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
        }
    }
}

impl DiagnosticsConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl CandashConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if encoding fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Serialize)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bus = &self.bus.listener;

        if bus.interface.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "bus.interface must not be empty".to_string(),
            ));
        }

        if bus.simulation_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "bus.simulation_period_ms must be greater than zero".to_string(),
            ));
        }

        if tracing::Level::from_str(&self.logging.level).is_err() {
            return Err(ConfigError::Invalid(format!(
                "logging.level {:?} is not one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        if self.diagnostics.handshake_url.is_some() && self.diagnostics.handshake_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "diagnostics.handshake_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.broadcast.push_interval_ms == 0 {
            warn!("broadcast.push_interval_ms is 0, sessions will push unthrottled");
        }

        if bus.mode == BusMode::Hardware && bus.poll_interval_ms == 0 {
            warn!("bus.poll_interval_ms is 0, the CAN reader thread will busy-poll");
        }

        Ok(())
    }
}
