//! Daemon lifecycle and configuration loading.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use candash_bus::BusMode;
use candash_service::{CandashConfig, Cli, ConfigError, PayloadLayout, ServiceError, run_until};
use candash_test_helpers::prelude::*;
use clap::Parser;

const LIMIT: Duration = Duration::from_secs(10);

fn simulated_config() -> CandashConfig {
    let mut config = CandashConfig::default();
    config.server.bind_addr = SocketAddr::from(([127, 0, 0, 1], 0));
    config.bus.listener.mode = BusMode::Simulated;
    config.bus.listener.simulation_period_ms = 5;
    config
}

#[tokio::test]
async fn simulated_pipeline_stops_cleanly_on_request() -> TestResult {
    let stop = tokio::time::sleep(Duration::from_millis(200));

    must_within(LIMIT, run_until(simulated_config(), stop)).await?;
    Ok(())
}

#[tokio::test]
async fn occupied_port_is_fatal() -> TestResult {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let mut config = simulated_config();
    config.server.bind_addr = taken.local_addr()?;

    let result = must_within(LIMIT, run_until(config, std::future::pending())).await;

    assert!(matches!(result, Err(ServiceError::Bind { .. })));
    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn missing_hardware_interface_is_fatal() -> TestResult {
    let mut config = simulated_config();
    config.bus.listener.mode = BusMode::Hardware;
    config.bus.listener.interface = "candash-gone0".to_string();

    let result = must_within(LIMIT, run_until(config, std::future::pending())).await;

    match result {
        Err(ServiceError::Bus(err)) => assert!(err.to_string().contains("candash-gone0")),
        other => panic!("expected a bus error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected_before_startup() -> TestResult {
    let mut config = simulated_config();
    config.bus.listener.simulation_period_ms = 0;

    let result = run_until(config, std::future::pending()).await;

    assert!(matches!(
        result,
        Err(ServiceError::Config(ConfigError::Invalid(_)))
    ));
    Ok(())
}

#[tokio::test]
async fn config_file_and_flags_combine() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "bus:\n  interface: vcan1\n  payload_layout: u32_le\nbroadcast:\n  push_interval_ms: 40\nlogging:\n  level: debug"
    )?;

    let path = must_some(file.path().to_str(), "temp path is UTF-8");
    let cli = Cli::try_parse_from(["candashd", "--config", path, "--push-interval-ms", "10"])?;
    let config = cli.load_config().await?;

    assert_eq!(config.bus.listener.interface, "vcan1");
    assert_eq!(config.bus.payload_layout, PayloadLayout::U32Le);
    assert_eq!(config.broadcast.push_interval_ms, 10);
    assert_eq!(config.logging.level, "debug");
    Ok(())
}

#[tokio::test]
async fn empty_config_file_yields_defaults() -> TestResult {
    let file = tempfile::NamedTempFile::new()?;

    let config = CandashConfig::load_from_path(file.path()).await?;

    assert_eq!(config, CandashConfig::default());
    Ok(())
}

#[tokio::test]
async fn unreadable_and_malformed_files_are_reported() -> TestResult {
    let dir = tempfile::tempdir()?;
    let missing = CandashConfig::load_from_path(dir.path().join("absent.yaml")).await;
    assert!(matches!(missing, Err(ConfigError::Read { .. })));

    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "bus: [this is not a mapping")?;
    let malformed = CandashConfig::load_from_path(file.path()).await;
    assert!(matches!(malformed, Err(ConfigError::Parse { .. })));
    Ok(())
}
