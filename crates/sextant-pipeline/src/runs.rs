//! Run lifecycle: persisted row, events, and the run-wide deadline.

use std::time::{Duration, Instant};

use sextant_core::errors::{PipelineError, SextantErrorCode};
use sextant_core::events::types::{RunCompletedEvent, RunFailedEvent, RunStartedEvent};
use sextant_core::events::EventDispatcher;
use sextant_core::models::{Run, RunCounters, RunKind, RunStatus, Scope};
use sextant_core::traits::{CancellationToken, Interruption, RunRepository};
use sextant_storage::DatabaseManager;

/// One run in flight. Consumed by `complete` or `fail`.
pub(crate) struct RunTracker<'a> {
    db: &'a DatabaseManager,
    events: &'a EventDispatcher,
    pub run_id: String,
    pub kind: RunKind,
    pub counters: RunCounters,
    pub token: CancellationToken,
    timeout_secs: u64,
    started: Instant,
}

impl<'a> RunTracker<'a> {
    pub fn begin(
        db: &'a DatabaseManager,
        events: &'a EventDispatcher,
        kind: RunKind,
        scope: &Scope,
        cancel: &CancellationToken,
        timeout_secs: u64,
    ) -> Result<Self, PipelineError> {
        let run = Run::start(uuid::Uuid::new_v4().to_string(), kind, scope.clone());
        db.write(|s| s.create_run(&run))?;
        tracing::info!(run_id = %run.id, kind = %kind, scope = %scope, "run started");
        events.emit_run_started(&RunStartedEvent {
            run_id: run.id.clone(),
            kind,
            scope: scope.clone(),
        });
        Ok(Self {
            db,
            events,
            run_id: run.id,
            kind,
            counters: RunCounters::default(),
            token: cancel.child_with_timeout(Duration::from_secs(timeout_secs)),
            timeout_secs,
            started: Instant::now(),
        })
    }

    /// `Err` once the run is cancelled or past its deadline.
    pub fn check(&self) -> Result<(), PipelineError> {
        match self.token.interruption() {
            Some(interruption) => Err(self.interrupted(interruption)),
            None => Ok(()),
        }
    }

    pub fn interrupted(&self, interruption: Interruption) -> PipelineError {
        match interruption {
            Interruption::Cancelled => PipelineError::Cancelled,
            Interruption::TimedOut => PipelineError::Timeout {
                timeout_secs: self.timeout_secs,
            },
        }
    }

    pub fn complete(self, processed: u64) -> Result<RunCounters, PipelineError> {
        self.db.write(|s| {
            s.finish_run(&self.run_id, RunStatus::Completed, &self.counters, None)
        })?;
        let duration_ms = self.started.elapsed().as_millis() as u64;
        tracing::info!(
            run_id = %self.run_id,
            kind = %self.kind,
            processed,
            failures = self.counters.failures,
            duration_ms,
            "run completed"
        );
        self.events.emit_run_completed(&RunCompletedEvent {
            run_id: self.run_id.clone(),
            kind: self.kind,
            processed,
            failures: self.counters.failures,
            duration_ms,
        });
        Ok(self.counters)
    }

    /// Mark the run failed and hand `error` back to the caller.
    pub fn fail(self, error: PipelineError) -> PipelineError {
        let message = error.to_string();
        if let Err(e) = self.db.write(|s| {
            s.finish_run(&self.run_id, RunStatus::Failed, &self.counters, Some(&message))
        }) {
            tracing::warn!(run_id = %self.run_id, error = %e, "could not mark run failed");
        }
        tracing::warn!(run_id = %self.run_id, kind = %self.kind, error = %error, "run failed");
        self.events.emit_run_failed(&RunFailedEvent {
            run_id: self.run_id.clone(),
            kind: self.kind,
            error_code: error.error_code(),
            message,
        });
        error
    }
}
