//! Event payload types.

use crate::models::{ConflictType, ResolutionStrategy, RunKind, Scope};

/// Payload for `on_run_started`.
#[derive(Debug, Clone)]
pub struct RunStartedEvent {
    pub run_id: String,
    pub kind: RunKind,
    pub scope: Scope,
}

/// Payload for `on_run_completed`.
#[derive(Debug, Clone)]
pub struct RunCompletedEvent {
    pub run_id: String,
    pub kind: RunKind,
    pub processed: u64,
    pub failures: u64,
    pub duration_ms: u64,
}

/// Payload for `on_run_failed`.
#[derive(Debug, Clone)]
pub struct RunFailedEvent {
    pub run_id: String,
    pub kind: RunKind,
    pub error_code: &'static str,
    pub message: String,
}

/// Payload for `on_fragment_extracted`.
#[derive(Debug, Clone)]
pub struct FragmentExtractedEvent {
    pub run_id: String,
    pub path: String,
    pub ordinal: u32,
    pub byte_size: usize,
}

/// Payload for `on_fragment_oversize`.
#[derive(Debug, Clone)]
pub struct FragmentOversizeEvent {
    pub run_id: String,
    pub path: String,
    pub size: u64,
    pub limit: u64,
}

/// Payload for `on_pattern_created`.
#[derive(Debug, Clone)]
pub struct PatternCreatedEvent {
    pub pattern_id: String,
    pub section_path: String,
    pub signature_hash: String,
}

/// Payload for `on_pattern_sighted`.
#[derive(Debug, Clone)]
pub struct PatternSightedEvent {
    pub pattern_id: String,
    pub times_seen: u64,
}

/// Payload for `on_conflict_detected`.
#[derive(Debug, Clone)]
pub struct ConflictDetectedEvent {
    pub extracting_path: String,
    pub conflict_type: ConflictType,
    pub existing_pattern_ids: Vec<String>,
}

/// Payload for `on_resolution_applied`.
#[derive(Debug, Clone)]
pub struct ResolutionAppliedEvent {
    pub strategy: ResolutionStrategy,
    pub affected_pattern_ids: Vec<String>,
    pub new_pattern_id: Option<String>,
}
