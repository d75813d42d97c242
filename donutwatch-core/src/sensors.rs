// File: donutwatch-core/src/sensors.rs
//
// Read-side accessors over a session's latest snapshot, one per catalog
// metric. Sensors never block on a fetch in progress; they report whatever
// the coordinator last published, which is the point of caching snapshots
// in the first place.

use std::sync::Arc;

use crate::catalog::{MetricDef, ValueKind, METRICS};
use crate::coordinator::PollCoordinator;
use crate::error::FailureKind;
use crate::models::MetricValue;

/// Exposes one catalog metric from a session.
#[derive(Clone)]
pub struct MetricSensor {
    def: &'static MetricDef,
    coordinator: Arc<PollCoordinator>,
}

impl MetricSensor {
    pub fn new(def: &'static MetricDef, coordinator: Arc<PollCoordinator>) -> Self {
        Self { def, coordinator }
    }

    pub fn key(&self) -> &'static str {
        self.def.key
    }

    pub fn display_name(&self) -> &'static str {
        self.def.display_name
    }

    pub fn kind(&self) -> ValueKind {
        self.def.kind
    }

    /// The coerced value from the latest snapshot. None while no cycle has
    /// succeeded yet, or when the snapshot lacks this key.
    pub fn value(&self) -> Option<MetricValue> {
        let snapshot = self.coordinator.snapshot()?;
        snapshot.metric(self.def.key).cloned()
    }

    pub fn money(&self) -> Option<f64> {
        self.value()?.as_money()
    }

    pub fn count(&self) -> Option<i64> {
        self.value()?.as_count()
    }

    pub fn text(&self) -> Option<String> {
        match self.value()? {
            MetricValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the session has produced any snapshot at all.
    pub fn has_data(&self) -> bool {
        self.coordinator.has_data()
    }

    pub fn last_error_kind(&self) -> Option<FailureKind> {
        self.coordinator.last_error_kind()
    }
}

/// Builds one sensor per catalog entry for the given session.
pub fn build_sensors(coordinator: &Arc<PollCoordinator>) -> Vec<MetricSensor> {
    METRICS
        .iter()
        .map(|def| MetricSensor::new(def, Arc::clone(coordinator)))
        .collect()
}
