//! The telemetry snapshot pushed to dashboard clients and its JSON wire form.
//!
//! Wire format, one object per message:
//!
//! ```json
//! {"id": 275, "time_stamp": 1718000000.125, "data": [40.0]}
//! ```
//!
//! `time_stamp` is always float seconds since the UNIX epoch.

use serde::{Deserialize, Serialize};

use crate::error::SnapshotCodecError;
use crate::frame::unix_now_secs;

/// Identifier carried by the startup placeholder snapshot.
pub const PLACEHOLDER_ID: u32 = 275;

/// Reading carried by the startup placeholder snapshot.
pub const PLACEHOLDER_VALUE: f64 = 40.0;

/// Latest known frame-derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Identifier of the most recently ingested frame.
    pub id: u32,
    /// Capture time in seconds since the UNIX epoch.
    #[serde(rename = "time_stamp")]
    pub timestamp: f64,
    /// Numeric readings derived from the latest frame.
    #[serde(rename = "data")]
    pub values: Vec<f64>,
}

impl TelemetrySnapshot {
    pub fn new(id: u32, timestamp: f64, values: Vec<f64>) -> Self {
        Self {
            id,
            timestamp,
            values,
        }
    }

    /// Value held by the store before the first frame arrives.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_ID, unix_now_secs(), vec![PLACEHOLDER_VALUE])
    }
}

/// Serialize a snapshot to its JSON wire form.
///
/// # Errors
///
/// Returns [`SnapshotCodecError::NonFinite`] if the timestamp or any value
/// is NaN or infinite, and [`SnapshotCodecError::Encode`] if serialization
/// fails.
pub fn encode_snapshot(snapshot: &TelemetrySnapshot) -> Result<String, SnapshotCodecError> {
    if !snapshot.timestamp.is_finite() {
        return Err(SnapshotCodecError::NonFinite { field: "time_stamp" });
    }
    if !snapshot.values.iter().all(|v| v.is_finite()) {
        return Err(SnapshotCodecError::NonFinite { field: "data" });
    }
    serde_json::to_string(snapshot).map_err(SnapshotCodecError::Encode)
}

/// Parse a snapshot from its JSON wire form.
///
/// # Errors
///
/// Returns [`SnapshotCodecError::Decode`] on malformed input.
pub fn decode_snapshot(text: &str) -> Result<TelemetrySnapshot, SnapshotCodecError> {
    serde_json::from_str(text).map_err(SnapshotCodecError::Decode)
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_any_finite_snapshot(
            id in any::<u32>(),
            timestamp in 0.0f64..4_102_444_800.0,
            values in proptest::collection::vec(-1.0e9f64..1.0e9, 0..8),
        ) {
            let snapshot = TelemetrySnapshot::new(id, timestamp, values);
            let encoded = encode_snapshot(&snapshot);
            prop_assert!(encoded.is_ok());
            if let Ok(text) = encoded {
                let decoded = decode_snapshot(&text);
                prop_assert!(decoded.is_ok());
                if let Ok(decoded) = decoded {
                    prop_assert_eq!(decoded.id, snapshot.id);
                    prop_assert!((decoded.timestamp - snapshot.timestamp).abs() <= 1e-6);
                    prop_assert_eq!(decoded.values.len(), snapshot.values.len());
                    for (got, want) in decoded.values.iter().zip(&snapshot.values) {
                        prop_assert!((got - want).abs() <= want.abs() * 1e-12);
                    }
                }
            }
        }
    }
}
