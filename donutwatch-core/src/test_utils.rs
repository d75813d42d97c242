//! Test doubles shared by unit and integration tests.
//!
//! `ScriptedHttp` stands in for the network: responses are queued per URL
//! fragment, every request is recorded, and a gate can hold requests open
//! to exercise in-flight behavior. Compiled into the crate (not cfg(test))
//! so the integration tests in `tests/` can use it too.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use url::Url;

use crate::config::{AuthScheme, Config};
use crate::error::FetchError;
use crate::http::{HttpClient, RawResponse};

pub type ScriptedResult = Result<RawResponse, FetchError>;

/// One request as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
}

pub struct ScriptedHttp {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedResult>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicUsize,
    gate: watch::Sender<bool>,
    // Held so the gate channel stays open while no request is parked.
    gate_rx: watch::Receiver<bool>,
}

impl ScriptedHttp {
    pub fn new() -> Arc<Self> {
        let (gate, gate_rx) = watch::channel(true);
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate,
            gate_rx,
        })
    }

    /// Queues a response for URLs containing `fragment`. Responses pop in
    /// order; the last one queued repeats forever, so a single push scripts
    /// a stable endpoint.
    pub fn push(&self, fragment: &str, result: ScriptedResult) {
        self.scripts
            .lock()
            .entry(fragment.to_string())
            .or_default()
            .push_back(result);
    }

    /// Queues a 200 response with `body`.
    pub fn push_ok(&self, fragment: &str, body: &str) {
        self.push(
            fragment,
            Ok(RawResponse {
                status: 200,
                body: body.to_string(),
            }),
        );
    }

    /// Queues a response with an arbitrary status.
    pub fn push_status(&self, fragment: &str, status: u16, body: &str) {
        self.push(
            fragment,
            Ok(RawResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Queues a transport-level error.
    pub fn push_err(&self, fragment: &str, err: FetchError) {
        self.push(fragment, Err(err));
    }

    /// Holds every request from now on until `release` is called. Requests
    /// are still recorded and counted the moment they arrive.
    pub fn hold(&self) {
        let _ = self.gate.send(false);
    }

    pub fn release(&self) {
        let _ = self.gate.send(true);
    }

    /// Number of requests started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn get(
        &self,
        url: String,
        headers: HashMap<String, String>,
    ) -> Result<RawResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(RecordedRequest {
            url: url.clone(),
            headers,
        });

        let mut gate = self.gate_rx.clone();
        while !*gate.borrow() {
            if gate.changed().await.is_err() {
                break;
            }
        }

        let scripted = {
            let mut scripts = self.scripts.lock();
            let matched = scripts
                .iter_mut()
                .find(|(fragment, _)| url.contains(fragment.as_str()));
            match matched {
                Some((_, queue)) if queue.len() > 1 => queue.pop_front(),
                Some((_, queue)) => queue.front().cloned(),
                None => None,
            }
        };
        scripted.unwrap_or_else(|| {
            Err(FetchError::Unknown(format!(
                "no scripted response for {url}"
            )))
        })
    }
}

/// Config pointing at a host that does not exist, with intervals short
/// enough for timer tests.
pub fn test_config() -> Config {
    Config {
        lookup_base: Url::parse("http://donut.test/v1/lookup").expect("static test URL"),
        stats_base: Url::parse("http://donut.test/v1/stats").expect("static test URL"),
        auth_scheme: AuthScheme::default(),
        request_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(25),
    }
}

/// Well-formed lookup body with the given player id.
pub fn lookup_body(uuid: &str) -> String {
    serde_json::json!({
        "uuid": uuid,
        "username": "tester",
        "rank": "citizen",
    })
    .to_string()
}

/// Well-formed stats body covering the common metric kinds.
pub fn stats_body(money: &str, kills: i64) -> String {
    serde_json::json!({
        "money": money,
        "kills": kills,
        "deaths": 2,
        "location": "spawn",
    })
    .to_string()
}
