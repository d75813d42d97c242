// File: donutwatch-core/src/models.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, FetchError};

/// Login data for one tracked player, fixed for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    api_key: Option<String>,
}

impl Credentials {
    /// Builds credentials from raw user input. Both fields are trimmed; an
    /// API key that is empty or the literal "none" (any case) counts as
    /// absent, and requests go out unauthenticated.
    pub fn new(username: &str, api_key: Option<&str>) -> Result<Self, Error> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::Credentials("username must not be empty".to_string()));
        }
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.eq_ignore_ascii_case("none"))
            .map(str::to_string);
        Ok(Self {
            username: username.to_string(),
            api_key,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The API key, or None when polling anonymously.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// A single metric value after coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Money(f64),
    Count(i64),
    Text(String),
}

impl MetricValue {
    pub fn as_money(&self) -> Option<f64> {
        match self {
            MetricValue::Money(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            MetricValue::Count(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Money(v) => write!(f, "{v}"),
            MetricValue::Count(v) => write!(f, "{v}"),
            MetricValue::Text(v) => f.write_str(v),
        }
    }
}

/// Normalized view of a single endpoint response, before merging.
/// Only the lookup endpoint carries a player id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub player_id: Option<String>,
    pub fields: HashMap<String, MetricValue>,
}

/// A fully merged, successfully fetched set of player metrics. Replaced
/// wholesale on every successful cycle and otherwise left untouched, so a
/// reader always sees one coherent fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub player_id: String,
    pub fields: HashMap<String, MetricValue>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Merges the lookup and stats records into one snapshot. Stats fields
    /// win on key collision; the lookup record must carry the player id.
    pub fn merge(lookup: PartialRecord, stats: PartialRecord) -> Result<Self, FetchError> {
        let PartialRecord {
            player_id,
            fields: mut merged,
        } = lookup;
        let player_id = player_id.ok_or_else(|| {
            FetchError::BadResponse("lookup record carries no player id".to_string())
        })?;
        merged.extend(stats.fields);
        Ok(Self {
            player_id,
            fields: merged,
            fetched_at: Utc::now(),
        })
    }

    pub fn metric(&self, key: &str) -> Option<&MetricValue> {
        self.fields.get(key)
    }
}
