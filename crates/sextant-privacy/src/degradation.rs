//! Detectors that could not be used, recorded instead of failing the engine.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradationEvent {
    pub detector: String,
    pub category: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DegradationTracker {
    events: Vec<DegradationEvent>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, detector: &str, category: &str, reason: &str) {
        tracing::warn!(detector, category, reason, "masking detector degraded");
        self.events.push(DegradationEvent {
            detector: detector.to_string(),
            category: category.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn events(&self) -> &[DegradationEvent] {
        &self.events
    }
}
