//! Process-wide stop signal.
//!
//! One [`ShutdownTrigger`] fans out to any number of [`Shutdown`] handles.
//! Listeners and broadcast sessions check it every cycle.

use std::sync::Arc;

use tokio::sync::watch;

/// Sending half; firing it stops every task holding a [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half, cheap to clone into each task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

/// Create a linked trigger/receiver pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (
        ShutdownTrigger { tx },
        Shutdown {
            rx,
            _keepalive: None,
        },
    )
}

impl ShutdownTrigger {
    /// Signal every receiver. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Create another receiver bound to this trigger.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
            _keepalive: None,
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Shutdown {
    /// A receiver that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Holding the sender keeps `triggered` pending instead of resolving
        // on a closed channel.
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the trigger fires or is dropped.
    pub async fn triggered(&mut self) {
        // A dropped trigger counts as fired.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
