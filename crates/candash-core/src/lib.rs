//! Core types for the candash CAN telemetry bridge.
//!
//! This crate holds everything the ingestion side and the broadcast side
//! share:
//!
//! - `frame` - Normalized CAN frame and the synthetic frame constructor
//! - `snapshot` - Telemetry snapshot and its JSON wire format
//! - `store` - Reader/writer guarded snapshot store
//! - `shutdown` - Stop signal fanned out to long-running tasks

#![deny(static_mut_refs)]

pub mod error;
pub mod frame;
pub mod shutdown;
pub mod snapshot;
pub mod store;

pub use error::{FrameError, SnapshotCodecError};
pub use frame::{CanFrame, MAX_CAN_DATA_BYTES, make_frame, unix_now_secs};
pub use shutdown::{Shutdown, ShutdownTrigger, shutdown_channel};
pub use snapshot::{TelemetrySnapshot, decode_snapshot, encode_snapshot};
pub use store::TelemetryStore;
