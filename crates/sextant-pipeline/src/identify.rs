//! Identify run: score an extraction run's facts against the library.

use rayon::prelude::*;
use sextant_core::errors::{PipelineError, PipelineResult, StorageError};
use sextant_core::models::{Fact, PatternMatch, RunKind, Verdict};
use sextant_core::traits::{CancellationToken, FactRepository, MatchRepository, RunRepository};
use sextant_patterns::{MatchEngine, MatchOutcome};

use crate::pipeline::Pipeline;
use crate::reports::IdentifyReport;
use crate::runs::RunTracker;
use crate::workers::build_pool;

impl Pipeline {
    /// Score every fact of `source_run_id` on the worker pool. Holds the
    /// scope's shared lock for the whole run.
    pub fn run_identify(
        &self,
        source_run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult<IdentifyReport>, PipelineError> {
        let source = self
            .db
            .read(|s| s.get_run(source_run_id))?
            .ok_or_else(|| StorageError::NotFound {
                entity: "run",
                id: source_run_id.to_string(),
            })?;
        let scope = source.scope;
        let _shared = self.locks.shared(&scope);

        let mut tracker = RunTracker::begin(
            &self.db,
            &self.events,
            RunKind::Identify,
            &scope,
            cancel,
            self.timeout_secs(),
        )?;

        match self.identify_facts(source_run_id, &tracker) {
            Ok(report) => {
                tracker.counters.facts = report.matches.len() as u64;
                tracker.counters.matches = report
                    .matches
                    .iter()
                    .filter(|m| m.verdict.is_match())
                    .count() as u64;
                let processed = tracker.counters.facts;
                let counters = tracker.complete(processed)?;
                Ok(PipelineResult::new(IdentifyReport { counters, ..report }))
            }
            Err(e) => Err(tracker.fail(e)),
        }
    }

    fn identify_facts(
        &self,
        source_run_id: &str,
        tracker: &RunTracker<'_>,
    ) -> Result<IdentifyReport, PipelineError> {
        let started = std::time::Instant::now();
        let facts = self.db.read(|s| s.list_facts_by_run(source_run_id))?;
        let engine = self.match_engine();
        let pool = build_pool(self.config.pipeline.effective_workers())?;
        let run_id = tracker.run_id.as_str();

        let scored: Vec<(PatternMatch, Verdict)> = pool.install(|| {
            facts
                .par_iter()
                .map(|fact| {
                    tracker.check()?;
                    self.identify_one(&engine, run_id, fact)
                })
                .collect::<Result<Vec<_>, PipelineError>>()
        })?;

        let mut report = IdentifyReport {
            run_id: run_id.to_string(),
            ..IdentifyReport::default()
        };
        for (m, verdict) in scored {
            if verdict == Verdict::NewPattern {
                report.new_pattern_fact_ids.push(m.fact_id.clone());
            }
            report.matches.push(m);
        }
        tracing::info!(
            run_id,
            facts = facts.len(),
            new_patterns = report.new_pattern_fact_ids.len(),
            identify_duration = started.elapsed().as_millis() as u64,
            "identify pass finished"
        );
        Ok(report)
    }

    /// Read candidates on a pooled connection, then persist the match in its
    /// own unit of work.
    fn identify_one(
        &self,
        engine: &MatchEngine,
        run_id: &str,
        fact: &Fact,
    ) -> Result<(PatternMatch, Verdict), PipelineError> {
        let outcome: MatchOutcome = self.db.read(|s| engine.identify(s, fact))?;
        let m = outcome.to_match(run_id, &fact.id);
        self.db.write(|s| s.create_match(&m))?;
        Ok((m, outcome.verdict))
    }
}
