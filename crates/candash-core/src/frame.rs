//! Normalized CAN frame representation.
//!
//! Both the SocketCAN listener and the simulated generator produce
//! [`CanFrame`] values; nothing downstream ever sees a source-specific frame
//! type.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::FrameError;

/// Maximum payload size of a classic CAN frame.
pub const MAX_CAN_DATA_BYTES: usize = 8;

/// Number of payload bytes written by [`make_frame`].
const MADE_FRAME_LENGTH: u8 = 4;

/// Return the current wall-clock time as float seconds since the UNIX epoch.
pub fn unix_now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One CAN bus event.
///
/// `data` always holds eight bytes; only the first `length` are meaningful.
/// Frames built by this crate keep the unused tail zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanFrame {
    /// Arbitration identifier (11- or 29-bit, not validated).
    pub id: u32,
    /// Number of valid payload bytes, `0..=8`.
    pub length: u8,
    /// Fixed-capacity payload buffer.
    pub data: [u8; MAX_CAN_DATA_BYTES],
    /// Capture time in seconds since the UNIX epoch.
    pub timestamp: f64,
}

impl CanFrame {
    /// Build a frame from a payload slice, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLong`] when `payload` exceeds eight bytes.
    pub fn new(id: u32, payload: &[u8]) -> Result<Self, FrameError> {
        Self::with_timestamp(id, payload, unix_now_secs())
    }

    /// Build a frame with an explicit capture timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLong`] when `payload` exceeds eight bytes.
    pub fn with_timestamp(id: u32, payload: &[u8], timestamp: f64) -> Result<Self, FrameError> {
        if payload.len() > MAX_CAN_DATA_BYTES {
            return Err(FrameError::PayloadTooLong {
                len: payload.len(),
            });
        }

        let mut data = [0u8; MAX_CAN_DATA_BYTES];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            id,
            length: payload.len() as u8,
            data,
            timestamp,
        })
    }

    /// Build a frame from a driver-reported buffer, copying at most eight
    /// bytes and never more than the buffer holds.
    pub fn from_raw(id: u32, raw: &[u8], timestamp: f64) -> Self {
        let len = raw.len().min(MAX_CAN_DATA_BYTES);
        let mut data = [0u8; MAX_CAN_DATA_BYTES];
        data[..len].copy_from_slice(&raw[..len]);

        Self {
            id,
            length: len as u8,
            data,
            timestamp,
        }
    }

    /// The valid part of the payload.
    pub fn payload(&self) -> &[u8] {
        let len = usize::from(self.length).min(MAX_CAN_DATA_BYTES);
        &self.data[..len]
    }

    /// Decode bytes `0..4` as a little-endian unsigned integer.
    ///
    /// Returns `None` when fewer than four payload bytes are valid.
    pub fn payload_u32_le(&self) -> Option<u32> {
        self.payload()
            .get(0..4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }
}

/// Build a synthetic frame carrying `round(value)` as a 4-byte little-endian
/// unsigned integer.
///
/// Values outside the `u32` range wrap around; NaN encodes as zero.
pub fn make_frame(id: u32, value: f64) -> CanFrame {
    let scaled = value.round() as i64;
    let encoded = (scaled as u32).to_le_bytes();

    let mut data = [0u8; MAX_CAN_DATA_BYTES];
    data[..encoded.len()].copy_from_slice(&encoded);

    CanFrame {
        id,
        length: MADE_FRAME_LENGTH,
        data,
        timestamp: unix_now_secs(),
    }
}
