// File: donutwatch-core/src/registry.rs
//
// Owns every active polling session, keyed by username. Hosts embed one
// registry per process; there is no global state anywhere in this crate.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::client::DonutClient;
use crate::config::Config;
use crate::coordinator::PollCoordinator;
use crate::error::Error;
use crate::http::{DefaultHttpClient, HttpClient};
use crate::models::Credentials;

/// One running polling session: the coordinator plus its timer task.
pub struct PlayerSession {
    coordinator: Arc<PollCoordinator>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerSession {
    pub fn coordinator(&self) -> Arc<PollCoordinator> {
        Arc::clone(&self.coordinator)
    }
}

pub struct SessionRegistry {
    http: Arc<dyn HttpClient>,
    config: Config,
    sessions: DashMap<String, Arc<PlayerSession>>,
}

impl SessionRegistry {
    /// Registry backed by the reqwest transport. Every session shares one
    /// connection pool.
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = Arc::new(DefaultHttpClient::new(config.request_timeout)?);
        Self::with_transport(http, config)
    }

    /// Registry over a caller-supplied transport. Tests use this to drive
    /// sessions against a scripted fake. Rejects configs whose timings no
    /// session could run with.
    pub fn with_transport(http: Arc<dyn HttpClient>, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            http,
            config,
            sessions: DashMap::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts polling for one player. Credentials are fixed for the life of
    /// the session; to change them, stop the session and start a new one.
    /// Fails if a session for the username already exists.
    pub fn start_session(&self, credentials: Credentials) -> Result<Arc<PlayerSession>, Error> {
        let username = credentials.username().to_string();
        match self.sessions.entry(username.clone()) {
            Entry::Occupied(_) => Err(Error::Session(format!(
                "session for '{username}' already running"
            ))),
            Entry::Vacant(slot) => {
                let client = DonutClient::new(Arc::clone(&self.http), self.config.clone());
                let coordinator = Arc::new(PollCoordinator::new(client, credentials));
                let task = Arc::clone(&coordinator).spawn();
                let session = Arc::new(PlayerSession {
                    coordinator,
                    task: Mutex::new(Some(task)),
                });
                slot.insert(Arc::clone(&session));
                info!("polling session for '{username}' started");
                Ok(session)
            }
        }
    }

    pub fn get(&self, username: &str) -> Option<Arc<PlayerSession>> {
        self.sessions
            .get(username)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn usernames(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stops one session: signals shutdown, which also cancels an in-flight
    /// fetch, then waits for the timer task to wind down.
    pub async fn stop_session(&self, username: &str) -> Result<(), Error> {
        let Some((_, session)) = self.sessions.remove(username) else {
            return Err(Error::Session(format!("no session for '{username}'")));
        };
        session.coordinator.shutdown();
        if let Some(task) = session.task.lock().await.take() {
            if let Err(e) = task.await {
                warn!("poll task for '{username}' ended abnormally: {e}");
            }
        }
        info!("polling session for '{username}' stopped");
        Ok(())
    }

    /// Stops every session; used at host shutdown.
    pub async fn stop_all(&self) {
        for username in self.usernames() {
            if let Err(e) = self.stop_session(&username).await {
                warn!("failed to stop session for '{username}': {e}");
            }
        }
    }
}
