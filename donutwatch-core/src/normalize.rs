// File: donutwatch-core/src/normalize.rs
//
// Turns raw endpoint bodies into normalized records. The API is loose about
// numeric types: counts arrive as ints, floats, or strings (scientific
// notation included), so every value is coerced according to the catalog
// kind for its key, falling back to raw text when coercion fails.

use std::collections::HashMap;

use serde_json::Value;

use crate::catalog::{self, ValueKind};
use crate::client::EndpointKind;
use crate::error::FetchError;
use crate::http::RawResponse;
use crate::models::{MetricValue, PartialRecord};

/// Field in the lookup payload that uniquely identifies a player.
const PLAYER_ID_FIELD: &str = "uuid";

/// Parses and normalizes one endpoint body.
///
/// Lookup bodies must carry a non-empty player id; the API answers 200 with
/// the id missing for players it does not know, so absence maps to
/// `NotFound` rather than `BadResponse`. Stats bodies must be non-empty
/// objects.
pub fn normalize(endpoint: EndpointKind, raw: &RawResponse) -> Result<PartialRecord, FetchError> {
    let value: Value = serde_json::from_str(&raw.body)
        .map_err(|e| FetchError::BadResponse(format!("{endpoint} body is not valid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| FetchError::BadResponse(format!("{endpoint} body is not a JSON object")))?;

    match endpoint {
        EndpointKind::Lookup => {
            let player_id = object
                .get(PLAYER_ID_FIELD)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty());
            let Some(player_id) = player_id else {
                return Err(FetchError::NotFound(format!(
                    "lookup response carries no '{PLAYER_ID_FIELD}'"
                )));
            };
            let mut fields = HashMap::new();
            for (key, val) in object {
                if key == PLAYER_ID_FIELD {
                    continue;
                }
                fields.insert(key.clone(), coerce(key, val));
            }
            Ok(PartialRecord {
                player_id: Some(player_id.to_string()),
                fields,
            })
        }
        EndpointKind::Stats => {
            if object.is_empty() {
                return Err(FetchError::BadResponse(
                    "stats response is an empty object".to_string(),
                ));
            }
            let mut fields = HashMap::new();
            for (key, val) in object {
                fields.insert(key.clone(), coerce(key, val));
            }
            Ok(PartialRecord {
                player_id: None,
                fields,
            })
        }
    }
}

/// Coerces one wire value according to the catalog kind for `key`. Unknown
/// keys and values that resist coercion are kept as text so a new server
/// field never fails a whole cycle.
fn coerce(key: &str, value: &Value) -> MetricValue {
    match catalog::kind_of(key) {
        Some(ValueKind::Money) => numeric(value)
            .map(MetricValue::Money)
            .unwrap_or_else(|| raw_text(value)),
        Some(ValueKind::Count) => numeric(value)
            .map(|f| MetricValue::Count(f as i64))
            .unwrap_or_else(|| raw_text(value)),
        Some(ValueKind::Text) | None => raw_text(value),
    }
}

/// Numeric reading of a JSON value. Accepts numbers and numeric strings,
/// rejects non-finite results.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn raw_text(value: &Value) -> MetricValue {
    match value {
        Value::String(s) => MetricValue::Text(s.clone()),
        other => MetricValue::Text(other.to_string()),
    }
}
