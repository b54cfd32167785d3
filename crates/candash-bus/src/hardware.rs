//! SocketCAN listener for a native Linux CAN interface.
//!
//! Setup runs in three ordered steps (open, subscribe, start). A failure at
//! any step is reported before the first frame is delivered. Once running,
//! a dedicated reader thread polls the non-blocking socket and forwards
//! frames over a channel; the async side hands them to the handler in
//! arrival order. A non-transient read error stops the reader and surfaces
//! from `listen` as [`BusError::Read`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use candash_core::{CanFrame, Shutdown, unix_now_secs};
use socketcan::{CanSocket, EmbeddedFrame, Frame, Socket};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{BusError, BusResult, ConnectStage};
use crate::listener::BusListener;

const FRAME_CHANNEL_CAPACITY: usize = 1024;
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);
/// Linux `ENOBUFS`: the socket transmit queue is full.
const ENOBUFS: i32 = 105;

/// Listener bound to one SocketCAN interface.
#[derive(Debug, Clone)]
pub struct HardwareListener {
    interface: String,
    poll_interval: Duration,
}

impl HardwareListener {
    pub fn new(interface: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            interface: interface.into(),
            poll_interval,
        }
    }

    fn open(&self) -> BusResult<CanSocket> {
        CanSocket::open(&self.interface)
            .map_err(|e| BusError::connect(&self.interface, ConnectStage::Open, e))
    }

    fn subscribe(&self, socket: &CanSocket) -> BusResult<()> {
        socket
            .set_nonblocking(true)
            .map_err(|e| BusError::connect(&self.interface, ConnectStage::Subscribe, e))
    }

    fn start(
        &self,
        socket: CanSocket,
        tx: mpsc::Sender<CanFrame>,
        stop: Arc<AtomicBool>,
    ) -> BusResult<thread::JoinHandle<io::Result<()>>> {
        let interface = self.interface.clone();
        let poll_interval = self.poll_interval;

        thread::Builder::new()
            .name(format!("can-rx-{}", self.interface))
            .spawn(move || read_loop(&interface, &socket, &tx, &stop, poll_interval))
            .map_err(|e| BusError::connect(&self.interface, ConnectStage::Start, e))
    }
}

fn read_loop(
    interface: &str,
    socket: &CanSocket,
    tx: &mpsc::Sender<CanFrame>,
    stop: &AtomicBool,
    poll_interval: Duration,
) -> io::Result<()> {
    debug!(interface, "CAN reader thread started");

    while !stop.load(Ordering::Acquire) {
        match socket.read_frame() {
            Ok(frame) => {
                let frame = CanFrame::from_raw(frame.raw_id(), frame.data(), unix_now_secs());
                if tx.blocking_send(frame).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(poll_interval);
            }
            Err(e) if is_transient(&e) => {
                warn!(interface, error = %e, "CAN read error, retrying");
                thread::sleep(READ_ERROR_BACKOFF);
            }
            Err(e) => {
                warn!(interface, error = %e, "CAN read failed, stopping reader");
                return Err(e);
            }
        }
    }

    debug!(interface, "CAN reader thread stopped");
    Ok(())
}

/// Read errors worth retrying; anything else ends the reader.
fn is_transient(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::Interrupted || error.raw_os_error() == Some(ENOBUFS)
}

/// How the frame forwarding loop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forwarding {
    Shutdown,
    ReaderExited,
}

/// Hand received frames to `handler` until shutdown or the reader hangs up.
async fn forward_frames(
    rx: &mut mpsc::Receiver<CanFrame>,
    handler: &mut (dyn FnMut(CanFrame) + Send),
    shutdown: &mut Shutdown,
) -> Forwarding {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.triggered() => return Forwarding::Shutdown,
            received = rx.recv() => match received {
                Some(frame) => handler(frame),
                None => return Forwarding::ReaderExited,
            },
        }
    }
}

#[async_trait]
impl BusListener for HardwareListener {
    fn source(&self) -> &str {
        &self.interface
    }

    async fn listen(
        &self,
        handler: &mut (dyn FnMut(CanFrame) + Send),
        mut shutdown: Shutdown,
    ) -> BusResult<()> {
        let socket = self.open()?;
        self.subscribe(&socket)?;

        let (tx, mut rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let reader = self.start(socket, tx, Arc::clone(&stop))?;

        info!(interface = %self.interface, "CAN bus connected");

        let forwarding = forward_frames(&mut rx, handler, &mut shutdown).await;

        stop.store(true, Ordering::Release);
        drop(rx);
        // The reader wakes at least once per poll interval and sees the flag.
        let joined = tokio::task::spawn_blocking(move || reader.join()).await;

        info!(interface = %self.interface, ?forwarding, "CAN bus disconnected");
        match joined {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(source))) => Err(BusError::Read {
                interface: self.interface.clone(),
                source,
            }),
            _ => {
                warn!(interface = %self.interface, "CAN reader thread did not join cleanly");
                Ok(())
            }
        }
    }
}
