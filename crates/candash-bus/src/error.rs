//! Bus listener error types.

use std::fmt;
use std::io;

use thiserror::Error;

/// Step of hardware subscription setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStage {
    /// Opening the interface socket.
    Open,
    /// Configuring the socket for inbound frames.
    Subscribe,
    /// Starting the reception thread.
    Start,
}

impl fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            ConnectStage::Open => "open",
            ConnectStage::Subscribe => "subscribe",
            ConnectStage::Start => "start",
        };
        f.write_str(stage)
    }
}

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Failed to connect CAN bus {interface} at {stage} step: {source}")]
    Connect {
        interface: String,
        stage: ConnectStage,
        #[source]
        source: io::Error,
    },

    #[error("CAN bus {interface} read failed: {source}")]
    Read {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("Native CAN is not supported on this platform (interface {interface})")]
    Unsupported { interface: String },
}

impl BusError {
    pub fn connect(interface: impl Into<String>, stage: ConnectStage, source: io::Error) -> Self {
        BusError::Connect {
            interface: interface.into(),
            stage,
            source,
        }
    }

    /// Setup step that failed, if this is a connection error.
    pub fn stage(&self) -> Option<ConnectStage> {
        match self {
            BusError::Connect { stage, .. } => Some(*stage),
            BusError::Read { .. } | BusError::Unsupported { .. } => None,
        }
    }
}

pub type BusResult<T> = std::result::Result<T, BusError>;
