//! CAN frame sources for candash.
//!
//! Every source implements [`BusListener`]: a native SocketCAN interface on
//! Linux ([`HardwareListener`]) or a synthetic generator
//! ([`SimulatedListener`]). [`select_listener`] picks one at startup.

#![deny(static_mut_refs)]

pub mod error;
#[cfg(target_os = "linux")]
pub mod hardware;
pub mod listener;
pub mod simulated;

pub use error::{BusError, BusResult, ConnectStage};
#[cfg(target_os = "linux")]
pub use hardware::HardwareListener;
pub use listener::{
    BusListener, BusMode, BusSettings, SIMULATED_SOURCE, native_can_available, select_listener,
};
pub use simulated::{SIMULATED_ID_MAX, SIMULATED_ID_MIN, SimulatedListener, generate_frame};
