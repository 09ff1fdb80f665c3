//! PII masking configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for the PII masking engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Mask facts before persistence. Default: true.
    pub enabled: Option<bool>,
    /// Detections below this confidence are ignored. Default: 0.5.
    pub min_confidence: Option<f64>,
    /// Detector names to force on (e.g. the disabled-by-default `bare_nine_digit`).
    #[serde(default)]
    pub enabled_detectors: Vec<String>,
    /// Detector names to force off.
    #[serde(default)]
    pub disabled_detectors: Vec<String>,
    /// Per-category confidence overrides, keyed by category name (e.g. "passport").
    #[serde(default)]
    pub category_confidence: HashMap<String, f64>,
}

impl PrivacyConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_min_confidence(&self) -> f64 {
        self.min_confidence.unwrap_or(0.5)
    }
}
