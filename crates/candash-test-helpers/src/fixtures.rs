//! Canned frames and snapshots shared by the workspace test suites.

use candash_core::{CanFrame, TelemetrySnapshot, make_frame};

/// Identifier used by the dashboard reference scenario.
pub const DASHBOARD_ID: u32 = 275;

/// The frame `make_frame(275, 42.0)` produces.
pub fn reference_frame() -> CanFrame {
    make_frame(DASHBOARD_ID, 42.0)
}

/// A frame with the given payload and a fixed timestamp.
///
/// # Panics
///
/// Panics if `payload` is longer than eight bytes.
pub fn frame_with_payload(id: u32, payload: &[u8]) -> CanFrame {
    match CanFrame::with_timestamp(id, payload, 1_700_000_000.0) {
        Ok(frame) => frame,
        Err(e) => panic!("frame_with_payload: {e}"),
    }
}

/// The snapshot a dashboard expects right after startup: `{275, T, [40.0]}`.
pub fn dashboard_snapshot(timestamp: f64) -> TelemetrySnapshot {
    TelemetrySnapshot::new(DASHBOARD_ID, timestamp, vec![40.0])
}

/// Deterministic snapshots whose fields are all derived from a sequence
/// number, so any mix of two writes is detectable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotSequence {
    next: u32,
}

impl SnapshotSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot for sequence number `seq`.
    pub fn at(seq: u32) -> TelemetrySnapshot {
        let len = (seq % 8) as usize + 1;
        TelemetrySnapshot::new(seq, f64::from(seq), vec![f64::from(seq); len])
    }

    /// Whether `snapshot` is exactly one of the sequence's values.
    pub fn contains(snapshot: &TelemetrySnapshot) -> bool {
        *snapshot == Self::at(snapshot.id)
    }
}

impl Iterator for SnapshotSequence {
    type Item = TelemetrySnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let snapshot = Self::at(self.next);
        self.next = self.next.checked_add(1)?;
        Some(snapshot)
    }
}
