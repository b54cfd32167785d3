//! Broadcast session behavior against an in-memory client channel.

use std::time::Duration;

use async_trait::async_trait;
use candash_core::{Shutdown, TelemetrySnapshot, TelemetryStore, decode_snapshot, shutdown_channel};
use candash_service::{ClientChannel, Inbound, PushCadence, SessionEnd, SessionError, run_session};
use candash_test_helpers::prelude::*;
use tokio::sync::mpsc;

/// Records every pushed message; fails once `fail_after` sends succeeded.
struct MockChannel {
    sent: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    fail_after: Option<usize>,
    sends: usize,
}

struct MockClient {
    received: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<Inbound>,
}

fn mock_channel(fail_after: Option<usize>) -> (MockChannel, MockClient) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    (
        MockChannel {
            sent: sent_tx,
            inbound: inbound_rx,
            fail_after,
            sends: 0,
        },
        MockClient {
            received: sent_rx,
            inbound: inbound_tx,
        },
    )
}

#[async_trait]
impl ClientChannel for MockChannel {
    async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
        if self.fail_after.is_some_and(|limit| self.sends >= limit) {
            return Err(SessionError::Transport("connection reset".to_string()));
        }
        self.sends += 1;
        self.sent
            .send(text)
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    async fn next_inbound(&mut self) -> Inbound {
        self.inbound.recv().await.unwrap_or(Inbound::Closed)
    }
}

impl MockClient {
    fn drain(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(text) = self.received.try_recv() {
            out.push(text);
        }
        out
    }
}

const T: f64 = 1_700_000_000.25;
const EXPECTED: &str = r#"{"id":275,"time_stamp":1700000000.25,"data":[40.0]}"#;

fn spawn_session(
    mut channel: MockChannel,
    store: TelemetryStore,
    cadence: PushCadence,
    shutdown: Shutdown,
) -> tokio::task::JoinHandle<SessionEnd> {
    tokio::spawn(async move { run_session(&mut channel, &store, cadence, shutdown, 1).await })
}

#[tokio::test(start_paused = true)]
async fn pushes_immediately_then_once_per_interval() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (channel, mut client) = mock_channel(None);
    let (trigger, shutdown) = shutdown_channel();

    let session = spawn_session(
        channel,
        store,
        PushCadence::Every(Duration::from_millis(25)),
        shutdown,
    );

    tokio::time::sleep(Duration::from_millis(110)).await;
    trigger.trigger();
    assert_eq!(session.await?, SessionEnd::Shutdown);

    let messages = client.drain();
    assert_eq!(messages.len(), 5);
    assert!(messages.iter().all(|m| m == EXPECTED));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn later_pushes_reflect_store_writes() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (channel, mut client) = mock_channel(None);
    let (trigger, shutdown) = shutdown_channel();

    let session = spawn_session(
        channel,
        store.clone(),
        PushCadence::Every(Duration::from_millis(25)),
        shutdown,
    );

    let first = must_some(client.received.recv().await, "first push");
    assert_eq!(first, EXPECTED);

    store.write(TelemetrySnapshot::new(0x321, T + 1.0, vec![1.0, 2.0]));
    let second = decode_snapshot(&must_some(client.received.recv().await, "second push"))?;
    assert_eq!(second.id, 0x321);
    assert_eq!(second.values, vec![1.0, 2.0]);

    trigger.trigger();
    assert_eq!(session.await?, SessionEnd::Shutdown);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn write_failure_ends_only_the_session() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (mut channel, mut client) = mock_channel(Some(3));

    let end = run_session(
        &mut channel,
        &store,
        PushCadence::Every(Duration::from_millis(25)),
        Shutdown::never(),
        7,
    )
    .await;

    assert_eq!(end, SessionEnd::WriteFailed);
    assert_eq!(client.drain().len(), 3);
    // The store is untouched and still readable by everyone else.
    assert_eq!(store.read(), dashboard_snapshot(T));
    assert_eq!(store.revision(), 0);
    Ok(())
}

#[tokio::test]
async fn client_close_ends_session() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (channel, mut client) = mock_channel(None);

    let session = spawn_session(
        channel,
        store,
        PushCadence::Every(Duration::from_secs(60)),
        Shutdown::never(),
    );

    let first = must_some(client.received.recv().await, "first push");
    assert_eq!(first, EXPECTED);
    must(client.inbound.send(Inbound::Closed));

    let end = must_within(Duration::from_secs(5), session).await?;
    assert_eq!(end, SessionEnd::ClientClosed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn inbound_messages_are_ignored() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (channel, mut client) = mock_channel(None);
    let (trigger, shutdown) = shutdown_channel();

    let session = spawn_session(
        channel,
        store,
        PushCadence::Every(Duration::from_millis(25)),
        shutdown,
    );

    for _ in 0..10 {
        must(client.inbound.send(Inbound::Message));
    }
    tokio::time::sleep(Duration::from_millis(60)).await;
    trigger.trigger();

    assert_eq!(session.await?, SessionEnd::Shutdown);
    // Initial push plus ticks at 25 ms and 50 ms; inbound traffic adds none.
    assert_eq!(client.drain().len(), 3);
    Ok(())
}

#[tokio::test]
async fn unthrottled_cadence_pushes_back_to_back() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (mut channel, mut client) = mock_channel(Some(200));

    let end = must_within(
        Duration::from_secs(5),
        run_session(
            &mut channel,
            &store,
            PushCadence::Unthrottled,
            Shutdown::never(),
            9,
        ),
    )
    .await;

    assert_eq!(end, SessionEnd::WriteFailed);
    assert_eq!(client.drain().len(), 200);
    Ok(())
}

#[tokio::test]
async fn already_triggered_shutdown_sends_nothing() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (mut channel, mut client) = mock_channel(None);
    let (trigger, shutdown) = shutdown_channel();
    trigger.trigger();

    let end = run_session(
        &mut channel,
        &store,
        PushCadence::Every(Duration::from_millis(25)),
        shutdown,
        3,
    )
    .await;

    assert_eq!(end, SessionEnd::Shutdown);
    assert!(client.drain().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn non_finite_snapshot_is_skipped_and_session_continues() -> TestResult {
    let store = TelemetryStore::new(TelemetrySnapshot::new(275, T, vec![f64::NAN]));
    let (channel, mut client) = mock_channel(None);
    let (trigger, shutdown) = shutdown_channel();

    let session = spawn_session(
        channel,
        store.clone(),
        PushCadence::Every(Duration::from_millis(25)),
        shutdown,
    );

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(client.drain().is_empty());

    store.write(dashboard_snapshot(T));
    let next = must_some(client.received.recv().await, "push after recovery");
    assert_eq!(next, EXPECTED);

    trigger.trigger();
    assert_eq!(session.await?, SessionEnd::Shutdown);
    Ok(())
}

#[tokio::test]
async fn zero_period_behaves_like_unthrottled() -> TestResult {
    let store = TelemetryStore::new(dashboard_snapshot(T));
    let (mut channel, mut client) = mock_channel(Some(50));

    let end = must_within(
        Duration::from_secs(5),
        run_session(
            &mut channel,
            &store,
            PushCadence::Every(Duration::ZERO),
            Shutdown::never(),
            11,
        ),
    )
    .await;

    assert_eq!(end, SessionEnd::WriteFailed);
    assert_eq!(client.drain().len(), 50);
    Ok(())
}
