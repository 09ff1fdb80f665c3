//! Per-run result payloads, wrapped in `PipelineResult` by the run methods.

use sextant_core::models::{ConflictCheck, PatternMatch, RunCounters};
use sextant_patterns::conflicts::ResolutionReport;

#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub run_id: String,
    pub counters: RunCounters,
    /// Persisted fact ids in ordinal order.
    pub fact_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IdentifyReport {
    pub run_id: String,
    pub counters: RunCounters,
    /// One match per fact, in fact ordinal order.
    pub matches: Vec<PatternMatch>,
    /// Facts verdicted NEW_PATTERN: the synthesis seed pool.
    pub new_pattern_fact_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LearnReport {
    pub run_id: String,
    pub counters: RunCounters,
    pub created_pattern_ids: Vec<String>,
    pub sighted_pattern_ids: Vec<String>,
    /// Advisory checks with at least one conflict, one per group.
    pub conflicts: Vec<ConflictCheck>,
    /// Resolutions applied when the request chose a strategy.
    pub resolutions: Vec<ResolutionReport>,
}
