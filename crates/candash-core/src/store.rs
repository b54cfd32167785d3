//! Shared telemetry snapshot guarded by a reader/writer lock.
//!
//! The store holds exactly one [`TelemetrySnapshot`]. The ingestion side
//! replaces it wholesale; broadcast sessions clone it out. Readers only ever
//! see a complete snapshot because every write swaps the whole value while
//! holding the exclusive lock.
//!
//! The lock is a `parking_lot::RwLock` and is never held across an `.await`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::snapshot::TelemetrySnapshot;

#[derive(Debug)]
struct Slot {
    snapshot: TelemetrySnapshot,
    revision: u64,
}

/// Cloneable handle to the process-wide telemetry snapshot.
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    slot: Arc<RwLock<Slot>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(TelemetrySnapshot::placeholder())
    }
}

impl TelemetryStore {
    /// Create a store holding `initial` at revision zero.
    pub fn new(initial: TelemetrySnapshot) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                snapshot: initial,
                revision: 0,
            })),
        }
    }

    /// Replace the entire snapshot under exclusive access.
    pub fn write(&self, snapshot: TelemetrySnapshot) {
        let mut slot = self.slot.write();
        slot.snapshot = snapshot;
        slot.revision = slot.revision.wrapping_add(1);
    }

    /// Copy out the current snapshot under shared access.
    pub fn read(&self) -> TelemetrySnapshot {
        self.slot.read().snapshot.clone()
    }

    /// Copy out the current snapshot together with its revision.
    pub fn read_versioned(&self) -> (u64, TelemetrySnapshot) {
        let slot = self.slot.read();
        (slot.revision, slot.snapshot.clone())
    }

    /// Number of writes performed since construction.
    pub fn revision(&self) -> u64 {
        self.slot.read().revision
    }

    /// Timestamp of the current snapshot.
    pub fn timestamp(&self) -> f64 {
        self.slot.read().snapshot.timestamp
    }
}
