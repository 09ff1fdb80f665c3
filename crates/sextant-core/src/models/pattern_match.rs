use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::verdict::Verdict;

/// The persisted result of one identify pass over one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub id: String,
    pub run_id: String,
    pub fact_id: String,
    /// `None` for NO_MATCH, NEW_PATTERN, or when the pattern was later deleted.
    pub pattern_id: Option<String>,
    pub confidence: f64,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
}
