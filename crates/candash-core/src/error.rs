//! Error types for the frame model and snapshot wire format.

use thiserror::Error;

/// Errors raised while constructing a [`crate::CanFrame`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Payload does not fit a classic CAN frame.
    #[error("CAN payload too long: {len} bytes (max 8)")]
    PayloadTooLong { len: usize },
}

/// Errors raised while encoding or decoding a snapshot message.
#[derive(Error, Debug)]
pub enum SnapshotCodecError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    /// JSON has no representation for NaN or infinity.
    #[error("Failed to encode snapshot: {field} is not a finite number")]
    NonFinite { field: &'static str },
}

impl SnapshotCodecError {
    /// Check if this error came from the encoding side.
    pub fn is_encode(&self) -> bool {
        matches!(
            self,
            SnapshotCodecError::Encode(_) | SnapshotCodecError::NonFinite { .. }
        )
    }
}
