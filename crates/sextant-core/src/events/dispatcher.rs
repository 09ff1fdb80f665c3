//! EventDispatcher: synchronous fan-out to registered handlers.

use std::sync::Arc;

use super::handler::SextantEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
/// With no handlers registered, `emit` iterates an empty Vec.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn SextantEventHandler>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn SextantEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Handlers that panic are caught and do not prevent subsequent handlers
    /// from receiving the event.
    fn emit<F: Fn(&dyn SextantEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!("event handler panicked; continuing with remaining handlers");
            }
        }
    }

    // ---- Run Lifecycle ----
    pub fn emit_run_started(&self, event: &RunStartedEvent) {
        self.emit(|h| h.on_run_started(event));
    }

    pub fn emit_run_completed(&self, event: &RunCompletedEvent) {
        self.emit(|h| h.on_run_completed(event));
    }

    pub fn emit_run_failed(&self, event: &RunFailedEvent) {
        self.emit(|h| h.on_run_failed(event));
    }

    // ---- Extraction ----
    pub fn emit_fragment_extracted(&self, event: &FragmentExtractedEvent) {
        self.emit(|h| h.on_fragment_extracted(event));
    }

    pub fn emit_fragment_oversize(&self, event: &FragmentOversizeEvent) {
        self.emit(|h| h.on_fragment_oversize(event));
    }

    // ---- Pattern Lifecycle ----
    pub fn emit_pattern_created(&self, event: &PatternCreatedEvent) {
        self.emit(|h| h.on_pattern_created(event));
    }

    pub fn emit_pattern_sighted(&self, event: &PatternSightedEvent) {
        self.emit(|h| h.on_pattern_sighted(event));
    }

    // ---- Conflicts ----
    pub fn emit_conflict_detected(&self, event: &ConflictDetectedEvent) {
        self.emit(|h| h.on_conflict_detected(event));
    }

    pub fn emit_resolution_applied(&self, event: &ResolutionAppliedEvent) {
        self.emit(|h| h.on_resolution_applied(event));
    }
}
