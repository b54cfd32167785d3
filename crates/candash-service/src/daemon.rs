//! Daemon wiring: store, listener, ingestion, server and shutdown.

use std::future::Future;
use std::io;

use candash_bus::select_listener;
use candash_core::{TelemetryStore, shutdown_channel};
use tracing::{error, info};

use crate::broadcast::PushCadence;
use crate::config::CandashConfig;
use crate::diagnostics::run_handshake;
use crate::error::ServiceError;
use crate::ingest::IngestionDriver;
use crate::server::{AppState, BroadcastServer};

/// Run the full pipeline until `stop` resolves or a fatal error occurs.
///
/// Fatal errors are a failed bus connection and a failed server bind. Both
/// stop every other task before returning.
///
/// # Errors
///
/// Returns the first fatal [`ServiceError`].
pub async fn run_until<F>(config: CandashConfig, stop: F) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send,
{
    config.validate()?;

    let (trigger, shutdown) = shutdown_channel();
    let store = TelemetryStore::default();
    let listener = select_listener(&config.bus.listener)?;
    info!(source = listener.source(), "Bus listener selected");

    let mut driver = IngestionDriver::new(store.clone(), config.bus.payload_layout);
    let state = AppState::new(
        store,
        PushCadence::from_millis(config.broadcast.push_interval_ms),
        shutdown.clone(),
        listener.source(),
    )
    .with_stats(driver.stats().clone());

    let server = BroadcastServer::bind(config.server.bind_addr, state).await?;
    let mut server_task = tokio::spawn(server.serve(shutdown.clone()));

    if config.diagnostics.handshake_url.is_some() {
        let diagnostics = config.diagnostics.clone();
        tokio::spawn(async move {
            run_handshake(&diagnostics).await;
        });
    }

    let ingest = driver.run(listener.as_ref(), shutdown.clone());
    tokio::pin!(ingest);
    tokio::pin!(stop);

    let mut ingest_result = None;
    let mut serve_result = None;
    tokio::select! {
        result = &mut ingest => ingest_result = Some(result),
        result = &mut server_task => serve_result = Some(result),
        () = &mut stop => info!("Shutdown requested"),
    }

    trigger.trigger();

    let ingest_result = match ingest_result {
        Some(result) => result,
        None => ingest.await,
    };
    let serve_result = match serve_result {
        Some(result) => result,
        None => server_task.await,
    };

    ingest_result?;
    match serve_result {
        Ok(served) => served,
        Err(join) => Err(ServiceError::Serve(io::Error::other(join))),
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
