//! `candashd` command line.

use std::net::SocketAddr;
use std::path::PathBuf;

use candash_bus::BusMode;
use clap::{ArgAction, Parser, Subcommand};

use crate::config::CandashConfig;
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "candashd")]
#[command(about = "Stream live CAN bus telemetry to dashboards over WebSocket")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "CANDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// WebSocket listen address
    #[arg(long, env = "CANDASH_BIND")]
    pub bind: Option<SocketAddr>,

    /// CAN interface name
    #[arg(long, env = "CANDASH_INTERFACE")]
    pub interface: Option<String>,

    /// Use the simulated bus even when hardware is present
    #[arg(long, env = "CANDASH_SIMULATE")]
    pub simulate: bool,

    /// Milliseconds between pushes to each client (0 = unthrottled)
    #[arg(long, env = "CANDASH_PUSH_INTERVAL_MS")]
    pub push_interval_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the daemon (default)
    Run,
    /// Print the effective configuration as YAML and exit
    PrintConfig,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply_overrides(&self, config: &mut CandashConfig) {
        if let Some(addr) = self.bind {
            config.server.bind_addr = addr;
        }
        if let Some(interface) = &self.interface {
            config.bus.listener.interface = interface.clone();
        }
        if self.simulate {
            config.bus.listener.mode = BusMode::Simulated;
        }
        if let Some(ms) = self.push_interval_ms {
            config.broadcast.push_interval_ms = ms;
        }
    }

    /// Load the config file (if any), apply overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or the result is
    /// invalid.
    pub async fn load_config(&self) -> Result<CandashConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => CandashConfig::load_from_path(path).await?,
            None => CandashConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
