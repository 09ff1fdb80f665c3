//! Score-to-verdict mapping.

use sextant_core::config::MatchingConfig;
use sextant_core::models::Verdict;

/// Descending verdict thresholds. Validated by `SextantConfig::validate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub exact: f64,
    pub high: f64,
    pub partial: f64,
    pub low_floor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl Thresholds {
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            exact: config.effective_exact_threshold(),
            high: config.effective_high_threshold(),
            partial: config.effective_partial_threshold(),
            low_floor: config.effective_low_floor(),
        }
    }

    /// Verdict for the best candidate's score.
    pub fn verdict(&self, score: f64) -> Verdict {
        if score >= self.exact {
            Verdict::ExactMatch
        } else if score >= self.high {
            Verdict::HighMatch
        } else if score >= self.partial {
            Verdict::PartialMatch
        } else if score > self.low_floor {
            Verdict::LowMatch
        } else {
            Verdict::NoMatch
        }
    }
}
