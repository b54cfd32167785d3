//! Per-client broadcast session.
//!
//! A session pushes the current telemetry snapshot to one client as soon as
//! it starts, then once per push interval. It never waits on ingestion and
//! never queues: a slow client may skip snapshots, a fast one may see the
//! same snapshot twice.
//!
//! A session ends when a write fails, when the client closes the
//! connection, or when the process-wide shutdown fires. None of these
//! affect other sessions or ingestion.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use candash_core::{Shutdown, TelemetryStore, encode_snapshot};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::error::SessionError;

/// What a client sent between pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A data or control message; ignored.
    Message,
    /// Close frame, end of stream, or a read error.
    Closed,
}

/// Transport for one connected client.
#[async_trait]
pub trait ClientChannel: Send {
    /// Send one text message.
    async fn send_text(&mut self, text: String) -> Result<(), SessionError>;

    /// Wait for the next inbound event. Must be cancel-safe.
    async fn next_inbound(&mut self) -> Inbound;
}

#[async_trait]
impl ClientChannel for WebSocket {
    async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
        self.send(Message::Text(text.into()))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    async fn next_inbound(&mut self) -> Inbound {
        match self.recv().await {
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => Inbound::Closed,
            Some(Ok(_)) => Inbound::Message,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    WriteFailed,
    ClientClosed,
    Shutdown,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SessionEnd::WriteFailed => "write failed",
            SessionEnd::ClientClosed => "client closed",
            SessionEnd::Shutdown => "shutdown",
        };
        f.write_str(reason)
    }
}

/// Pacing between pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCadence {
    /// Fixed interval between pushes.
    Every(Duration),
    /// Only yield to the scheduler between pushes.
    Unthrottled,
}

impl PushCadence {
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            PushCadence::Unthrottled
        } else {
            PushCadence::Every(Duration::from_millis(ms))
        }
    }
}

enum Pacer {
    Ticker(Interval),
    Yield,
}

impl Pacer {
    fn new(cadence: PushCadence) -> Self {
        match cadence {
            PushCadence::Every(period) if period.is_zero() => Pacer::Yield,
            PushCadence::Every(period) => {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Pacer::Ticker(ticker)
            }
            PushCadence::Unthrottled => Pacer::Yield,
        }
    }

    async fn wait(&mut self) {
        match self {
            Pacer::Ticker(ticker) => {
                ticker.tick().await;
            }
            Pacer::Yield => tokio::task::yield_now().await,
        }
    }
}

/// Stream snapshots from `store` to `channel` until the session ends.
pub async fn run_session<C: ClientChannel + ?Sized>(
    channel: &mut C,
    store: &TelemetryStore,
    cadence: PushCadence,
    mut shutdown: Shutdown,
    session_id: u64,
) -> SessionEnd {
    let mut pacer = Pacer::new(cadence);
    let mut pushes: u64 = 0;

    loop {
        if shutdown.is_triggered() {
            return SessionEnd::Shutdown;
        }

        // The read lock is released before the send starts.
        let snapshot = store.read();
        match encode_snapshot(&snapshot) {
            Ok(text) => {
                let sent = tokio::select! {
                    biased;
                    _ = shutdown.triggered() => return SessionEnd::Shutdown,
                    sent = channel.send_text(text) => sent,
                };
                if let Err(e) = sent {
                    debug!(session_id, pushes, error = %e, "Push failed");
                    return SessionEnd::WriteFailed;
                }
                pushes += 1;
            }
            Err(e) => warn!(session_id, error = %e, "Skipping push, snapshot did not encode"),
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => return SessionEnd::Shutdown,
                inbound = channel.next_inbound() => {
                    if inbound == Inbound::Closed {
                        return SessionEnd::ClientClosed;
                    }
                }
                _ = pacer.wait() => break,
            }
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    active: AtomicUsize,
    total: AtomicU64,
}

/// Counts live and historical sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session; it stays active until the guard drops.
    pub fn register(&self) -> SessionGuard {
        let id = self.inner.total.fetch_add(1, Ordering::AcqRel) + 1;
        let active = self.inner.active.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::gauge!("candash_active_sessions").set(active as f64);
        SessionGuard {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::Acquire)
    }
}

/// Live session marker returned by [`SessionRegistry::register`].
#[derive(Debug)]
pub struct SessionGuard {
    id: u64,
    registry: Arc<RegistryInner>,
}

impl SessionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let active = self.registry.active.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::gauge!("candash_active_sessions").set(active as f64);
    }
}
