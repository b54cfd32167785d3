//! candash daemon (candashd)

#![deny(static_mut_refs)]

use std::process;

use anyhow::Result;
use candash_service::{Cli, Command, LoggingConfig, init_logging, run_until, shutdown_signal};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().await?;

    if cli.command() == Command::PrintConfig {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(LoggingConfig::from_settings(&config.logging, cli.verbose))?;
    info!("Starting candashd v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_until(config, shutdown_signal()).await {
        error!(error = %e, "candashd stopped on fatal error");
        process::exit(1);
    }

    info!("candashd stopped");
    Ok(())
}
