//! SextantEventHandler: every method has a no-op default, so consumers
//! override only the events they care about.

use super::types::*;

pub trait SextantEventHandler: Send + Sync {
    // ---- Run Lifecycle ----
    fn on_run_started(&self, _event: &RunStartedEvent) {}
    fn on_run_completed(&self, _event: &RunCompletedEvent) {}
    fn on_run_failed(&self, _event: &RunFailedEvent) {}

    // ---- Extraction ----
    fn on_fragment_extracted(&self, _event: &FragmentExtractedEvent) {}
    fn on_fragment_oversize(&self, _event: &FragmentOversizeEvent) {}

    // ---- Pattern Lifecycle ----
    fn on_pattern_created(&self, _event: &PatternCreatedEvent) {}
    fn on_pattern_sighted(&self, _event: &PatternSightedEvent) {}

    // ---- Conflicts ----
    fn on_conflict_detected(&self, _event: &ConflictDetectedEvent) {}
    fn on_resolution_applied(&self, _event: &ResolutionAppliedEvent) {}
}
