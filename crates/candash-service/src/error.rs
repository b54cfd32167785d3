//! Service error types.
//!
//! Only [`ServiceError`] ever terminates the daemon. Session and diagnostic
//! errors stay inside the task that raised them.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use candash_bus::BusError;
use candash_core::SnapshotCodecError;
use thiserror::Error;

/// Fatal daemon errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to bind broadcast server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Broadcast server error: {0}")]
    Serve(#[source] io::Error),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors loading or validating [`crate::CandashConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors local to one broadcast session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Client transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Encode(#[from] SnapshotCodecError),
}

/// Errors from the handshake diagnostic.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("Handshake request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Handshake endpoint returned HTTP {status}")]
    Status { status: u16 },
}

impl DiagnosticsError {
    /// Check if the request never reached the endpoint.
    pub fn is_unreachable(&self) -> bool {
        match self {
            DiagnosticsError::Request(e) => e.is_connect() || e.is_timeout(),
            DiagnosticsError::Status { .. } => false,
        }
    }
}
