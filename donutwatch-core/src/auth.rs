// File: donutwatch-core/src/auth.rs

use crate::client::{DonutClient, EndpointKind};
use crate::error::ValidationError;
use crate::models::Credentials;
use crate::normalize;

/// Successful validation outcome: a human-readable session title plus the
/// resolved player id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidatedPlayer {
    pub title: String,
    pub player_id: String,
}

/// Checks that the credentials reach the API and resolve to a real player,
/// using a single lookup call. Meant for setup flows before any polling
/// session is created; wrong key and unknown player come back as distinct
/// variants so the caller can tell the user which input to fix.
pub async fn validate(
    client: &DonutClient,
    credentials: &Credentials,
) -> Result<ValidatedPlayer, ValidationError> {
    let raw = client.fetch(EndpointKind::Lookup, credentials).await?;
    let record = normalize::normalize(EndpointKind::Lookup, &raw)?;
    let player_id = record.player_id.ok_or_else(|| {
        ValidationError::NotFound(format!(
            "no player id in lookup response for '{}'",
            credentials.username()
        ))
    })?;
    Ok(ValidatedPlayer {
        title: format!("Donut SMP: {}", credentials.username()),
        player_id,
    })
}
