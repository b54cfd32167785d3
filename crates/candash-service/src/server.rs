//! HTTP surface: the WebSocket broadcast endpoint on `/` and `/health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use candash_core::{Shutdown, TelemetryStore};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::broadcast::{PushCadence, SessionRegistry, run_session};
use crate::error::ServiceError;
use crate::ingest::IngestStats;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: TelemetryStore,
    pub sessions: SessionRegistry,
    pub stats: IngestStats,
    pub cadence: PushCadence,
    pub shutdown: Shutdown,
    pub bus_source: Arc<str>,
}

impl AppState {
    pub fn new(
        store: TelemetryStore,
        cadence: PushCadence,
        shutdown: Shutdown,
        bus_source: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            sessions: SessionRegistry::new(),
            stats: IngestStats::new(),
            cadence,
            shutdown,
            bus_source: bus_source.into(),
        }
    }

    pub fn with_stats(mut self, stats: IngestStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub bus_source: String,
    pub frames_ingested: u64,
    pub active_sessions: usize,
    pub total_sessions: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy".to_string(),
        bus_source: state.bus_source.to_string(),
        frames_ingested: state.stats.frames_ingested(),
        active_sessions: state.sessions.active(),
        total_sessions: state.sessions.total(),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_client(socket, state))
}

async fn serve_client(mut socket: WebSocket, state: AppState) {
    let guard = state.sessions.register();
    let session_id = guard.id();
    info!(
        session_id,
        active_sessions = state.sessions.active(),
        "Dashboard client connected"
    );

    let end = run_session(
        &mut socket,
        &state.store,
        state.cadence,
        state.shutdown.clone(),
        session_id,
    )
    .await;

    drop(guard);
    info!(session_id, reason = %end, "Dashboard client disconnected");
}

/// A bound, not yet serving, broadcast server.
#[derive(Debug)]
pub struct BroadcastServer {
    listener: TcpListener,
    state: AppState,
}

impl BroadcastServer {
    /// Bind the listen socket.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self, ServiceError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServiceError::Bind { addr, source })?;
        Ok(Self { listener, state })
    }

    /// Address actually bound (resolves port `0`).
    ///
    /// # Errors
    ///
    /// Returns the socket error if the address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Serve`] if the accept loop fails.
    pub async fn serve(self, mut shutdown: Shutdown) -> Result<(), ServiceError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Broadcast server listening");
        }

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await
            .map_err(ServiceError::Serve)?;

        info!("Broadcast server stopped");
        Ok(())
    }
}
