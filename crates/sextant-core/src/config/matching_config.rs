//! Match engine configuration.

use serde::{Deserialize, Serialize};

/// Thresholds and fan-out for the match engine. Thresholds must descend:
/// exact > high > partial > low_floor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum score for EXACT_MATCH. Default: 0.95.
    pub exact_threshold: Option<f64>,
    /// Minimum score for HIGH_MATCH. Default: 0.85.
    pub high_threshold: Option<f64>,
    /// Minimum score for PARTIAL_MATCH. Default: 0.70.
    pub partial_threshold: Option<f64>,
    /// Scores at or below this floor are NO_MATCH. Default: 0.50.
    pub low_floor: Option<f64>,
    /// Maximum candidates scored per fact. Default: 10.
    pub candidate_top_k: Option<usize>,
    /// Penalty per unexpected missing or broken relationship. Default: 0.05.
    pub relationship_penalty: Option<f64>,
    /// Cap on the total relationship penalty. Default: 0.25.
    pub max_relationship_penalty: Option<f64>,
}

impl MatchingConfig {
    pub fn effective_exact_threshold(&self) -> f64 {
        self.exact_threshold.unwrap_or(0.95)
    }

    pub fn effective_high_threshold(&self) -> f64 {
        self.high_threshold.unwrap_or(0.85)
    }

    pub fn effective_partial_threshold(&self) -> f64 {
        self.partial_threshold.unwrap_or(0.70)
    }

    pub fn effective_low_floor(&self) -> f64 {
        self.low_floor.unwrap_or(0.50)
    }

    pub fn effective_candidate_top_k(&self) -> usize {
        self.candidate_top_k.unwrap_or(10)
    }

    pub fn effective_relationship_penalty(&self) -> f64 {
        self.relationship_penalty.unwrap_or(0.05)
    }

    pub fn effective_max_relationship_penalty(&self) -> f64 {
        self.max_relationship_penalty.unwrap_or(0.25)
    }
}
