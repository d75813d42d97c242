// File: donutwatch-core/src/config.rs

use std::str::FromStr;
use std::time::Duration;

use http::header::{HeaderName, AUTHORIZATION};
use url::Url;

use crate::error::Error;

pub const DEFAULT_LOOKUP_BASE: &str = "https://api.donutsmp.net/v1/lookup";
pub const DEFAULT_STATS_BASE: &str = "https://api.donutsmp.net/v1/stats";

/// Header carrying the API key under the default scheme.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How the API key is attached to outbound requests. Selected once per
/// deployment; individual sessions never deviate from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// Key sent verbatim under a dedicated header.
    KeyHeader(HeaderName),
    /// Key sent as `Authorization: Bearer <key>`.
    Bearer,
}

impl AuthScheme {
    pub fn header_name(&self) -> &str {
        match self {
            AuthScheme::KeyHeader(name) => name.as_str(),
            AuthScheme::Bearer => AUTHORIZATION.as_str(),
        }
    }
}

impl Default for AuthScheme {
    fn default() -> Self {
        AuthScheme::KeyHeader(HeaderName::from_static(DEFAULT_API_KEY_HEADER))
    }
}

impl FromStr for AuthScheme {
    type Err = Error;

    /// `"bearer"` (any case) selects bearer auth; anything else is taken as
    /// a custom header name.
    fn from_str(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("bearer") {
            return Ok(AuthScheme::Bearer);
        }
        let name = HeaderName::from_str(trimmed)
            .map_err(|e| Error::Config(format!("invalid auth header name '{trimmed}': {e}")))?;
        Ok(AuthScheme::KeyHeader(name))
    }
}

/// Endpoint and timing configuration shared by every session in a registry.
#[derive(Debug, Clone)]
pub struct Config {
    pub lookup_base: Url,
    pub stats_base: Url,
    pub auth_scheme: AuthScheme,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Config {
    /// Rejects timing values no session can run with: the poll timer cannot
    /// tick on a zero interval, and a zero timeout fails every request
    /// before it starts. Checked wherever a config enters a registry.
    pub fn validate(&self) -> Result<(), Error> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Production defaults with custom endpoint bases, for self-hosted or
    /// proxied deployments.
    pub fn with_bases(lookup_base: &str, stats_base: &str) -> Result<Self, Error> {
        let lookup_base = Url::parse(lookup_base)
            .map_err(|e| Error::Config(format!("invalid lookup base '{lookup_base}': {e}")))?;
        let stats_base = Url::parse(stats_base)
            .map_err(|e| Error::Config(format!("invalid stats base '{stats_base}': {e}")))?;
        Ok(Self {
            lookup_base,
            stats_base,
            ..Default::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let lookup_base =
            Url::parse(DEFAULT_LOOKUP_BASE).expect("default lookup base is a valid URL");
        let stats_base =
            Url::parse(DEFAULT_STATS_BASE).expect("default stats base is a valid URL");
        Self {
            lookup_base,
            stats_base,
            auth_scheme: AuthScheme::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_is_the_api_key_header() {
        assert_eq!(AuthScheme::default().header_name(), "x-api-key");
    }

    #[test]
    fn test_bearer_parses_case_insensitively() {
        for raw in ["bearer", "Bearer", "BEARER", " bearer "] {
            assert_eq!(raw.parse::<AuthScheme>().ok(), Some(AuthScheme::Bearer));
        }
    }

    #[test]
    fn test_custom_header_names_parse() {
        let scheme: AuthScheme = "X-Donut-Key".parse().expect("valid header name");
        assert_eq!(scheme.header_name(), "x-donut-key");
    }

    #[test]
    fn test_garbage_header_names_are_rejected() {
        assert!("not a header".parse::<AuthScheme>().is_err());
    }

    #[test]
    fn test_default_config_points_at_production() {
        let config = Config::default();
        assert_eq!(config.lookup_base.as_str(), DEFAULT_LOOKUP_BASE);
        assert_eq!(config.stats_base.as_str(), DEFAULT_STATS_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_with_bases_rejects_invalid_urls() {
        assert!(Config::with_bases("not a url", DEFAULT_STATS_BASE).is_err());
        assert!(Config::with_bases(DEFAULT_LOOKUP_BASE, "").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let config = Config {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        assert!(Config::default().validate().is_ok());
    }
}
