//! The polling coordinator. Owns the fetch/normalize/merge cycle for one
//! player, the last-known-good snapshot, and the timer task driving
//! scheduled refreshes.
//!
//! Concurrency rules, in short: at most one cycle is ever in flight per
//! coordinator (extra triggers coalesce into the running cycle), readers
//! never block on a fetch, and a failed cycle records the failure without
//! touching the cached snapshot.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::client::{DonutClient, EndpointKind};
use crate::error::{FailureKind, FailureRecord, FetchError};
use crate::eventbus::{EventBus, PollEvent};
use crate::models::{Credentials, PartialRecord, Snapshot};
use crate::normalize;

/// Outcome of the most recent cycles. The snapshot half only ever moves
/// forward; the error half is cleared by the next success.
#[derive(Default)]
struct PollState {
    snapshot: Option<Arc<Snapshot>>,
    error: Option<FailureRecord>,
}

pub struct PollCoordinator {
    client: DonutClient,
    credentials: Credentials,
    bus: EventBus,
    state: RwLock<PollState>,
    in_flight: AtomicBool,
}

impl PollCoordinator {
    pub fn new(client: DonutClient, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            bus: EventBus::new(),
            state: RwLock::new(PollState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Latest successfully fetched snapshot. None until the first cycle
    /// succeeds; afterwards it survives any number of failed cycles.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.read().snapshot.clone()
    }

    /// The most recent cycle failure, cleared by the next success.
    pub fn last_error(&self) -> Option<FailureRecord> {
        self.state.read().error.clone()
    }

    pub fn last_error_kind(&self) -> Option<FailureKind> {
        self.state.read().error.as_ref().map(|record| record.kind)
    }

    pub fn has_data(&self) -> bool {
        self.state.read().snapshot.is_some()
    }

    /// True while a fetch pair is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Registers a push subscriber for cycle outcomes. Pair with
    /// `snapshot()` / `last_error()` to pick up state published before the
    /// subscription existed.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<PollEvent> {
        self.bus.subscribe(buffer_size).await
    }

    /// Runs one cycle right now unless one is already in flight, in which
    /// case the trigger coalesces and this returns false. Manual refreshes
    /// do not disturb the timer's schedule.
    pub async fn refresh_now(&self) -> bool {
        self.poll_once().await
    }

    /// Spawns the timer loop for this coordinator. The first cycle runs
    /// immediately; afterwards one cycle starts per configured interval.
    /// The task winds down when `shutdown` is called, cancelling any
    /// in-flight fetch.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Signals the timer task (and any other watcher of this session's bus)
    /// to stop.
    pub fn shutdown(&self) {
        self.bus.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.bus.is_shutdown()
    }

    async fn run(&self) {
        let mut ticker = time::interval(self.client.config().poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.bus.shutdown_rx.clone();
        debug!("poll loop for '{}' started", self.username());
        loop {
            tokio::select! {
                Ok(_) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        Ok(_) = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                        _ = self.poll_once() => {}
                    }
                }
            }
        }
        debug!("poll loop for '{}' stopped", self.username());
    }

    /// One guarded cycle. Returns false when another cycle held the guard.
    async fn poll_once(&self) -> bool {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!(
                "poll for '{}' already in flight; trigger coalesced",
                self.username()
            );
            return false;
        };

        let result = match AssertUnwindSafe(self.fetch_cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Unknown("poll cycle panicked".to_string())),
        };

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                {
                    let mut state = self.state.write();
                    state.snapshot = Some(Arc::clone(&snapshot));
                    state.error = None;
                }
                debug!(
                    "poll for '{}' succeeded with {} field(s)",
                    self.username(),
                    snapshot.fields.len()
                );
                self.bus.publish(PollEvent::Updated(snapshot)).await;
            }
            Err(err) => {
                let record = FailureRecord::from_error(&err);
                warn!(
                    "poll for '{}' failed ({}): {}",
                    self.username(),
                    record.kind,
                    record.message
                );
                self.state.write().error = Some(record.clone());
                self.bus.publish(PollEvent::Failed(record)).await;
            }
        }
        true
    }

    /// Fetches and normalizes both endpoints concurrently, then merges. A
    /// failure on either side fails the cycle; lookup wins when both fail.
    async fn fetch_cycle(&self) -> Result<Snapshot, FetchError> {
        let (lookup, stats) = tokio::join!(
            self.fetch_record(EndpointKind::Lookup),
            self.fetch_record(EndpointKind::Stats),
        );
        Snapshot::merge(lookup?, stats?)
    }

    async fn fetch_record(&self, endpoint: EndpointKind) -> Result<PartialRecord, FetchError> {
        let raw = self.client.fetch(endpoint, &self.credentials).await?;
        normalize::normalize(endpoint, &raw)
    }
}

/// RAII guard around the in-flight flag. Dropping it, including when the
/// owning future is cancelled mid-fetch, releases the flag.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::MockHttpClient;

    #[test]
    fn test_in_flight_guard_is_exclusive_and_releases_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = InFlightGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_panicking_transport_records_an_unknown_failure() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| panic!("transport bug"));
        let client = DonutClient::new(Arc::new(mock), Config::default());
        let credentials = Credentials::new("Notch", None).expect("valid credentials");
        let coordinator = PollCoordinator::new(client, credentials);

        assert!(coordinator.refresh_now().await, "the cycle still completes");
        assert_eq!(coordinator.last_error_kind(), Some(FailureKind::Unknown));
        assert!(coordinator.snapshot().is_none());
        assert!(!coordinator.is_fetching(), "the in-flight flag is released");
    }
}
