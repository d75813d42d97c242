//! In-process fan-out bus for poll results.
//!
//! Each subscriber gets its own bounded mpsc queue. Publishing never waits
//! on a slow subscriber: when a queue is full the event is dropped for that
//! subscriber only, since the coordinator's pull accessors always hold the
//! latest state anyway. A watch channel doubles as the session shutdown
//! signal.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::warn;

use crate::error::FailureRecord;
use crate::models::Snapshot;

/// What one completed poll cycle produced.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// Both endpoints answered and a fresh snapshot replaced the cached one.
    Updated(Arc<Snapshot>),
    /// The cycle failed; the cached snapshot (if any) is untouched.
    Failed(FailureRecord),
}

/// Queue capacity used when a subscriber does not pick its own.
const DEFAULT_BUFFER_SIZE: usize = 64;

#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<PollEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl EventBus {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Registers a new subscriber and returns its receiving end. Buffer
    /// sizes clamp to at least one slot, since a zero-capacity queue is not
    /// constructible. Subscribing late never misses state: callers can pair
    /// this with the coordinator's pull accessors to read whatever was
    /// published before they arrived.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<PollEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE).max(1);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    pub async fn publish(&self, event: PollEvent) {
        let mut subs = self.subscribers.lock().await;
        subs.retain(|sub| !sub.is_closed());
        for sub in subs.iter() {
            match sub.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("subscriber queue full; dropping poll event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Signals shutdown to every task watching this bus.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
