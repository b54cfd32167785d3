//! Handshake diagnostic against a mock HTTP endpoint.

use std::time::Duration;

use candash_service::{DiagnosticsConfig, DiagnosticsError, HandshakeReply, handshake, run_handshake};
use candash_test_helpers::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn handshake_parses_last_packet() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/handshake"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply_body("2024-06-10T12:00:00Z")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = handshake(&format!("{}/handshake", server.uri()), TIMEOUT).await?;

    assert_eq!(
        reply,
        HandshakeReply {
            last_packet: "2024-06-10T12:00:00Z".to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_reported() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = handshake(&server.uri(), TIMEOUT).await;

    assert!(matches!(result, Err(DiagnosticsError::Status { status: 503 })));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_an_error() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = handshake(&server.uri(), TIMEOUT).await;

    assert!(matches!(result, Err(DiagnosticsError::Request(_))));
    Ok(())
}

#[tokio::test]
async fn unconfigured_handshake_is_skipped() {
    assert_eq!(run_handshake(&DiagnosticsConfig::default()).await, None);
}

fn reply_body(last_packet: &str) -> HandshakeReply {
    HandshakeReply {
        last_packet: last_packet.to_string(),
    }
}
