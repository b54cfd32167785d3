//! One-shot handshake with a remote telemetry endpoint.
//!
//! Purely diagnostic: the result is logged and never affects the pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DiagnosticsConfig;
use crate::error::DiagnosticsError;

/// Reply body of the handshake endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeReply {
    pub last_packet: String,
}

/// `GET` the handshake endpoint and parse its reply.
///
/// # Errors
///
/// Returns [`DiagnosticsError`] on transport failure, a non-success status,
/// or a malformed body.
pub async fn handshake(url: &str, timeout: Duration) -> Result<HandshakeReply, DiagnosticsError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DiagnosticsError::Status {
            status: status.as_u16(),
        });
    }

    Ok(response.json::<HandshakeReply>().await?)
}

/// Run the handshake if one is configured and log the outcome.
pub async fn run_handshake(config: &DiagnosticsConfig) -> Option<HandshakeReply> {
    let url = config.handshake_url.as_deref()?;

    match handshake(url, config.handshake_timeout()).await {
        Ok(reply) => {
            info!(url, last_packet = %reply.last_packet, "Handshake succeeded");
            Some(reply)
        }
        Err(e) => {
            warn!(url, unreachable = e.is_unreachable(), error = %e, "Handshake failed");
            None
        }
    }
}
