// File: donutwatch-core/src/client.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AuthScheme, Config};
use crate::error::FetchError;
use crate::http::{HttpClient, RawResponse};
use crate::models::Credentials;

/// The two endpoints one poll cycle touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// `GET {lookup_base}/{username}`. Carries the player id.
    Lookup,
    /// `GET {stats_base}/{username}`. Carries the metric payload.
    Stats,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Lookup => "lookup",
            EndpointKind::Stats => "stats",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaks the DonutSMP REST API over an injected transport. One instance
/// serves one player session, but the transport behind it may be shared.
pub struct DonutClient {
    http: Arc<dyn HttpClient>,
    config: Config,
}

impl DonutClient {
    pub fn new(http: Arc<dyn HttpClient>, config: Config) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issues one authenticated GET against `endpoint` and maps the HTTP
    /// outcome onto the failure taxonomy. 2xx bodies come back unparsed;
    /// normalization is the next stage's job.
    pub async fn fetch(
        &self,
        endpoint: EndpointKind,
        credentials: &Credentials,
    ) -> Result<RawResponse, FetchError> {
        let url = self.endpoint_url(endpoint, credentials.username());
        let headers = self.auth_headers(credentials);
        let response = self.http.get(url, headers).await?;
        match response.status {
            200..=299 => Ok(response),
            401 => Err(FetchError::Auth(format!(
                "{endpoint} endpoint rejected the API key (HTTP 401)"
            ))),
            404 => Err(FetchError::NotFound(format!(
                "{endpoint} endpoint has no player '{}' (HTTP 404)",
                credentials.username()
            ))),
            status @ 500..=599 => Err(FetchError::ServerError(format!(
                "{endpoint} endpoint returned HTTP {status}"
            ))),
            status => Err(FetchError::Unknown(format!(
                "{endpoint} endpoint returned HTTP {status}"
            ))),
        }
    }

    fn endpoint_url(&self, endpoint: EndpointKind, username: &str) -> String {
        let base = match endpoint {
            EndpointKind::Lookup => &self.config.lookup_base,
            EndpointKind::Stats => &self.config.stats_base,
        };
        format!("{}/{}", base.as_str().trim_end_matches('/'), username)
    }

    /// Builds the auth header for the configured scheme. Credentials without
    /// an API key produce no header at all.
    fn auth_headers(&self, credentials: &Credentials) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(key) = credentials.api_key() {
            match &self.config.auth_scheme {
                AuthScheme::KeyHeader(name) => {
                    headers.insert(name.as_str().to_string(), key.to_string());
                }
                AuthScheme::Bearer => {
                    headers.insert("authorization".to_string(), format!("Bearer {key}"));
                }
            }
        }
        headers
    }
}
