//! HTTP transport seam used by the API client.
//!
//! `DonutClient` only ever issues GETs, so the trait is a single method;
//! tests substitute a scripted transport and never touch the network. The
//! default implementation wraps one `reqwest::Client`, which pools
//! connections across every session that shares it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, FetchError};

/// Raw outcome of one GET: status plus unparsed body. Status mapping and
/// JSON parsing happen in later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(
        &self,
        url: String,
        headers: HashMap<String, String>,
    ) -> Result<RawResponse, FetchError>;
}

/// Default reqwest-backed implementation of `HttpClient`.
#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    /// Builds a client enforcing `timeout` on every request.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("donutwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build reqwest client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(
        &self,
        url: String,
        headers: HashMap<String, String>,
    ) -> Result<RawResponse, FetchError> {
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        Ok(RawResponse { status, body })
    }
}

/// Transport-level reqwest failures are either timeouts or connection
/// problems; everything above transport level is mapped from the status
/// code by the client.
fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else {
        FetchError::Connect(err.to_string())
    }
}
