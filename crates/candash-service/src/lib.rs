//! candash service: bridges a CAN bus to WebSocket dashboards.
//!
//! The [`IngestionDriver`] writes each bus frame into the shared
//! [`candash_core::TelemetryStore`]; every connected client gets its own
//! broadcast session that pushes the latest snapshot on a fixed cadence.

#![deny(static_mut_refs)]

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod diagnostics;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod server;

pub use broadcast::{
    ClientChannel, Inbound, PushCadence, SessionEnd, SessionGuard, SessionRegistry, run_session,
};
pub use cli::{Cli, Command};
pub use config::{
    BroadcastConfig, BusConfig, CandashConfig, DiagnosticsConfig, LogSettings, ServerConfig,
};
pub use daemon::{run_until, shutdown_signal};
pub use diagnostics::{HandshakeReply, handshake, run_handshake};
pub use error::{ConfigError, DiagnosticsError, ServiceError, SessionError};
pub use ingest::{IngestStats, IngestionDriver, PayloadLayout};
pub use logging::{LoggingConfig, init_logging};
pub use server::{AppState, BroadcastServer, HealthReport, router};
