//! Synthetic frame source used when no CAN interface is available.
//!
//! Emits one random standard-ID frame per period until shutdown.

use std::time::Duration;

use async_trait::async_trait;
use candash_core::{CanFrame, MAX_CAN_DATA_BYTES, Shutdown, unix_now_secs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::error::BusResult;
use crate::listener::{BusListener, SIMULATED_SOURCE};

/// Lowest identifier the generator emits.
pub const SIMULATED_ID_MIN: u32 = 0x100;

/// Highest identifier the generator emits (top of the 11-bit range).
pub const SIMULATED_ID_MAX: u32 = 0x7FF;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Produce one random frame: id in `[0x100, 0x7FF]`, length in `[0, 8]`,
/// payload bytes uniform, unused tail zero.
pub fn generate_frame<R: Rng>(rng: &mut R) -> CanFrame {
    let id = rng.gen_range(SIMULATED_ID_MIN..=SIMULATED_ID_MAX);
    let length = rng.gen_range(0..=MAX_CAN_DATA_BYTES);

    let mut payload = [0u8; MAX_CAN_DATA_BYTES];
    for byte in payload.iter_mut().take(length) {
        *byte = rng.gen_range(0..=u8::MAX);
    }

    CanFrame::from_raw(id, &payload[..length], unix_now_secs())
}

/// Periodic random frame generator.
#[derive(Debug, Clone)]
pub struct SimulatedListener {
    period: Duration,
    seed: Option<u64>,
}

impl SimulatedListener {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            seed: None,
        }
    }

    /// Deterministic generator; every `listen` call replays the same frames.
    pub fn with_seed(period: Duration, seed: u64) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            seed: Some(seed),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[async_trait]
impl BusListener for SimulatedListener {
    fn source(&self) -> &str {
        SIMULATED_SOURCE
    }

    async fn listen(
        &self,
        handler: &mut (dyn FnMut(CanFrame) + Send),
        mut shutdown: Shutdown,
    ) -> BusResult<()> {
        let mut rng = self.rng();
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_ms = self.period.as_millis() as u64, "Simulated CAN bus started");

        let mut frames: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                _ = ticker.tick() => {
                    let frame = generate_frame(&mut rng);
                    debug!(id = frame.id, length = frame.length, "Simulated frame");
                    handler(frame);
                    frames += 1;
                }
            }
        }

        info!(frames, "Simulated CAN bus stopped");
        Ok(())
    }
}
