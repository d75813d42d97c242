// File: donutwatch-core/src/error.rs

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Category of a failed poll cycle, stable across retries and suitable for
/// display or alert routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Auth,
    NotFound,
    Connect,
    ServerError,
    BadResponse,
    Timeout,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Auth => "auth",
            FailureKind::NotFound => "not_found",
            FailureKind::Connect => "connect",
            FailureKind::ServerError => "server_error",
            FailureKind::BadResponse => "bad_response",
            FailureKind::Timeout => "timeout",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while fetching or normalizing one endpoint response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Player not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Malformed response: {0}")]
    BadResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Auth(_) => FailureKind::Auth,
            FetchError::NotFound(_) => FailureKind::NotFound,
            FetchError::Connect(_) => FailureKind::Connect,
            FetchError::ServerError(_) => FailureKind::ServerError,
            FetchError::BadResponse(_) => FailureKind::BadResponse,
            FetchError::Timeout(_) => FailureKind::Timeout,
            FetchError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

/// A failed cycle, as cached by the coordinator and published to
/// subscribers. The cached snapshot is never cleared by one of these.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn from_error(err: &FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Error raised by the one-shot credential check. Auth and NotFound stay
/// distinct so a setup flow can tell the user which input to fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid API key: {0}")]
    Auth(String),

    #[error("Player not found: {0}")]
    NotFound(String),

    #[error("Cannot connect: {0}")]
    Connect(String),

    #[error("Validation failed: {0}")]
    Other(String),
}

impl From<FetchError> for ValidationError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Auth(msg) => ValidationError::Auth(msg),
            FetchError::NotFound(msg) => ValidationError::NotFound(msg),
            FetchError::Connect(msg) | FetchError::Timeout(msg) => ValidationError::Connect(msg),
            FetchError::ServerError(msg)
            | FetchError::BadResponse(msg)
            | FetchError::Unknown(msg) => ValidationError::Other(msg),
        }
    }
}

/// Top-level error for configuration, credential, and session management.
/// Fetch and validation failures stay in their own enums; nothing above the
/// coordinator ever folds them into this one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Session error: {0}")]
    Session(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds_cover_every_variant() {
        let cases = [
            (FetchError::Auth("k".into()), FailureKind::Auth),
            (FetchError::NotFound("k".into()), FailureKind::NotFound),
            (FetchError::Connect("k".into()), FailureKind::Connect),
            (FetchError::ServerError("k".into()), FailureKind::ServerError),
            (FetchError::BadResponse("k".into()), FailureKind::BadResponse),
            (FetchError::Timeout("k".into()), FailureKind::Timeout),
            (FetchError::Unknown("k".into()), FailureKind::Unknown),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_failure_record_carries_kind_and_message() {
        let record = FailureRecord::from_error(&FetchError::ServerError("HTTP 503".into()));
        assert_eq!(record.kind, FailureKind::ServerError);
        assert!(record.message.contains("HTTP 503"));
    }

    #[test]
    fn test_validation_error_folds_timeout_into_connect() {
        let err = ValidationError::from(FetchError::Timeout("10s elapsed".into()));
        assert_eq!(err, ValidationError::Connect("10s elapsed".into()));
    }

    #[test]
    fn test_failure_kind_strings_are_snake_case() {
        assert_eq!(FailureKind::NotFound.as_str(), "not_found");
        assert_eq!(FailureKind::BadResponse.to_string(), "bad_response");
    }
}
