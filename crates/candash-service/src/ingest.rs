//! Ingestion driver: the single writer of the telemetry store.
//!
//! Each frame delivered by the bus listener becomes one snapshot and one
//! store write. The snapshot timestamp is the ingestion time, clamped so it
//! never goes backwards even if the wall clock does.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use candash_bus::{BusListener, BusResult};
use candash_core::{CanFrame, Shutdown, TelemetrySnapshot, TelemetryStore, unix_now_secs};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How payload bytes map onto snapshot values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadLayout {
    /// One value per valid payload byte.
    #[default]
    Bytes,
    /// Bytes `0..4` as one little-endian unsigned integer.
    U32Le,
}

impl PayloadLayout {
    /// Derive snapshot values from `frame`.
    ///
    /// `U32Le` yields no values when fewer than four bytes are valid.
    pub fn values(self, frame: &CanFrame) -> Vec<f64> {
        match self {
            PayloadLayout::Bytes => frame.payload().iter().map(|b| f64::from(*b)).collect(),
            PayloadLayout::U32Le => frame
                .payload_u32_le()
                .map(|v| vec![f64::from(v)])
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    frames: AtomicU64,
    last_id: AtomicU32,
}

/// Shared ingestion counters, readable from the health endpoint.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    counters: Arc<Counters>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_ingested(&self) -> u64 {
        self.counters.frames.load(Ordering::Acquire)
    }

    /// Identifier of the last ingested frame, if any.
    pub fn last_id(&self) -> Option<u32> {
        if self.frames_ingested() == 0 {
            return None;
        }
        Some(self.counters.last_id.load(Ordering::Relaxed))
    }

    fn record(&self, id: u32) {
        self.counters.last_id.store(id, Ordering::Relaxed);
        self.counters.frames.fetch_add(1, Ordering::Release);
    }
}

/// Turns bus frames into telemetry store writes.
#[derive(Debug)]
pub struct IngestionDriver {
    store: TelemetryStore,
    layout: PayloadLayout,
    stats: IngestStats,
    last_timestamp: f64,
}

impl IngestionDriver {
    pub fn new(store: TelemetryStore, layout: PayloadLayout) -> Self {
        let last_timestamp = store.timestamp();
        Self {
            store,
            layout,
            stats: IngestStats::new(),
            last_timestamp,
        }
    }

    /// Share counters with another component instead of starting fresh.
    pub fn with_stats(mut self, stats: IngestStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Write one snapshot for `frame`, stamped with the current time.
    pub fn ingest(&mut self, frame: &CanFrame) {
        self.ingest_at(frame, unix_now_secs());
    }

    /// Write one snapshot for `frame`, stamped with `now` or the previous
    /// timestamp, whichever is later.
    pub fn ingest_at(&mut self, frame: &CanFrame, now: f64) {
        // NaN compares false, so a bad clock keeps the previous timestamp.
        let timestamp = if now > self.last_timestamp {
            now
        } else {
            self.last_timestamp
        };
        self.last_timestamp = timestamp;

        let snapshot = TelemetrySnapshot::new(frame.id, timestamp, self.layout.values(frame));
        self.store.write(snapshot);

        self.stats.record(frame.id);
        metrics::counter!("candash_frames_ingested_total").increment(1);
        debug!(id = frame.id, length = frame.length, "Frame ingested");
    }

    /// Subscribe to `listener` and ingest every delivered frame until it
    /// stops.
    ///
    /// # Errors
    ///
    /// Returns the listener's connection error, if any.
    pub async fn run(&mut self, listener: &dyn BusListener, shutdown: Shutdown) -> BusResult<()> {
        let source = listener.source().to_string();
        info!(source = %source, layout = ?self.layout, "Ingestion started");

        let result = {
            let mut handler = |frame: CanFrame| self.ingest(&frame);
            listener.listen(&mut handler, shutdown).await
        };

        match &result {
            Ok(()) => info!(
                source = %source,
                frames = self.stats.frames_ingested(),
                "Ingestion stopped"
            ),
            Err(e) => warn!(source = %source, error = %e, "Ingestion failed"),
        }
        result
    }
}
