//! Listener contract and startup selection policy.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use candash_core::{CanFrame, Shutdown};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BusResult;
use crate::simulated::SimulatedListener;

/// Source identity reported by the simulated listener.
pub const SIMULATED_SOURCE: &str = "simulated";

pub const DEFAULT_INTERFACE: &str = "can0";
pub const DEFAULT_SIMULATION_PERIOD_MS: u64 = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// A live source of CAN frames.
///
/// `listen` invokes `handler` once per frame, synchronously and in source
/// order, until `shutdown` fires. Setup failures are returned before any
/// frame is delivered.
#[async_trait]
pub trait BusListener: Send + Sync {
    /// Interface name, or [`SIMULATED_SOURCE`].
    fn source(&self) -> &str;

    /// Deliver frames to `handler` until stopped.
    async fn listen(
        &self,
        handler: &mut (dyn FnMut(CanFrame) + Send),
        shutdown: Shutdown,
    ) -> BusResult<()>;
}

/// How the listener variant is chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusMode {
    /// Hardware when native CAN is present, simulation otherwise.
    #[default]
    Auto,
    /// Always the hardware listener; setup failures are fatal.
    Hardware,
    /// Always the synthetic generator.
    Simulated,
}

/// Bus listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    pub mode: BusMode,
    /// Interface name for the hardware listener (e.g. `can0`).
    pub interface: String,
    /// Period between synthesized frames.
    pub simulation_period_ms: u64,
    /// Sleep between empty reads on the hardware socket.
    pub poll_interval_ms: u64,
    /// Fixed seed for the simulated generator.
    pub simulation_seed: Option<u64>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            mode: BusMode::Auto,
            interface: DEFAULT_INTERFACE.to_string(),
            simulation_period_ms: DEFAULT_SIMULATION_PERIOD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            simulation_seed: None,
        }
    }
}

impl BusSettings {
    pub fn simulation_period(&self) -> Duration {
        Duration::from_millis(self.simulation_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

const SYSFS_NET: &str = "/sys/class/net";
/// Linux `ARPHRD_CAN` link type.
const CAN_LINK_TYPE: &str = "280";

/// Whether this build and host can reach `interface` through SocketCAN.
pub fn native_can_available(interface: &str) -> bool {
    cfg!(target_os = "linux") && is_can_link(&Path::new(SYSFS_NET).join(interface))
}

/// Whether a sysfs network device directory describes a CAN link.
fn is_can_link(device: &Path) -> bool {
    std::fs::read_to_string(device.join("type")).is_ok_and(|link| link.trim() == CAN_LINK_TYPE)
}

/// Choose the listener variant once, at startup.
///
/// # Errors
///
/// Returns [`crate::BusError::Unsupported`] when hardware mode is requested
/// on a build without SocketCAN.
pub fn select_listener(settings: &BusSettings) -> BusResult<Box<dyn BusListener>> {
    let use_hardware = match settings.mode {
        BusMode::Simulated => false,
        BusMode::Hardware => true,
        BusMode::Auto => {
            let available = native_can_available(&settings.interface);
            if !available {
                info!(
                    interface = %settings.interface,
                    "Native CAN interface not present, falling back to simulated bus"
                );
            }
            available
        }
    };

    if use_hardware {
        return hardware_listener(settings);
    }

    let listener = match settings.simulation_seed {
        Some(seed) => SimulatedListener::with_seed(settings.simulation_period(), seed),
        None => SimulatedListener::new(settings.simulation_period()),
    };
    Ok(Box::new(listener))
}

#[cfg(target_os = "linux")]
fn hardware_listener(settings: &BusSettings) -> BusResult<Box<dyn BusListener>> {
    Ok(Box::new(crate::hardware::HardwareListener::new(
        settings.interface.clone(),
        settings.poll_interval(),
    )))
}

#[cfg(not(target_os = "linux"))]
fn hardware_listener(settings: &BusSettings) -> BusResult<Box<dyn BusListener>> {
    Err(crate::error::BusError::Unsupported {
        interface: settings.interface.clone(),
    })
}
