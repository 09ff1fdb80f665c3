//! Learn run: synthesize patterns from seed facts.

use std::collections::BTreeMap;

use sextant_core::errors::{PipelineError, PipelineResult, StorageError};
use sextant_core::models::{Fact, ResolutionStrategy, RunKind, Scope, Verdict};
use sextant_core::traits::{CancellationToken, FactRepository, MatchRepository, RunRepository};
use sextant_storage::ExclusiveScopeGuard;

use crate::pipeline::Pipeline;
use crate::reports::LearnReport;
use crate::runs::RunTracker;

/// Where seed facts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnSource {
    /// Facts an identify run verdicted NEW_PATTERN.
    NewPatternsOf(String),
    /// Every fact of an extraction run.
    FactsOf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnRequest {
    pub source: LearnSource,
    /// Strategy applied to conflicts found for each group. `None` reports
    /// conflicts without resolving them.
    pub resolution: Option<ResolutionStrategy>,
}

impl LearnRequest {
    pub fn new(source: LearnSource) -> Self {
        Self {
            source,
            resolution: None,
        }
    }

    pub fn resolve_with(mut self, strategy: ResolutionStrategy) -> Self {
        self.resolution = Some(strategy);
        self
    }
}

impl Pipeline {
    /// Group seed facts by section path and node type, then find-or-create
    /// one pattern per group. Each group is one unit of work covering the
    /// conflict check, the pattern write, and the chosen resolution.
    pub fn run_learn(
        &self,
        request: &LearnRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult<LearnReport>, PipelineError> {
        let source_run_id = match &request.source {
            LearnSource::NewPatternsOf(id) | LearnSource::FactsOf(id) => id.as_str(),
        };
        let source = self
            .db
            .read(|s| s.get_run(source_run_id))?
            .ok_or_else(|| StorageError::NotFound {
                entity: "run",
                id: source_run_id.to_string(),
            })?;
        let scope = source.scope;

        // REPLACE and MERGE rewrite the library under identify runs' feet.
        let _exclusive: Option<ExclusiveScopeGuard> = match request.resolution {
            Some(ResolutionStrategy::Replace | ResolutionStrategy::Merge) => {
                Some(self.locks.exclusive(&scope))
            }
            _ => None,
        };

        let mut tracker = RunTracker::begin(
            &self.db,
            &self.events,
            RunKind::Learn,
            &scope,
            cancel,
            self.timeout_secs(),
        )?;

        match self.learn_groups(request, &scope, &mut tracker) {
            Ok(report) => {
                let processed = tracker.counters.facts;
                let counters = tracker.complete(processed)?;
                Ok(PipelineResult::new(LearnReport { counters, ..report }))
            }
            Err(e) => Err(tracker.fail(e)),
        }
    }

    fn seed_facts(&self, source: &LearnSource) -> Result<Vec<Fact>, PipelineError> {
        let facts = match source {
            LearnSource::FactsOf(run_id) => self.db.read(|s| s.list_facts_by_run(run_id))?,
            LearnSource::NewPatternsOf(run_id) => self.db.read(|s| {
                let mut facts = Vec::new();
                for m in s.list_matches_by_run(run_id)? {
                    if m.verdict != Verdict::NewPattern {
                        continue;
                    }
                    if let Some(fact) = s.get_fact(&m.fact_id)? {
                        facts.push(fact);
                    }
                }
                Ok::<_, StorageError>(facts)
            })?,
        };
        Ok(facts)
    }

    fn learn_groups(
        &self,
        request: &LearnRequest,
        scope: &Scope,
        tracker: &mut RunTracker<'_>,
    ) -> Result<LearnReport, PipelineError> {
        let facts = self.seed_facts(&request.source)?;
        let mut groups: BTreeMap<(String, String), Vec<&Fact>> = BTreeMap::new();
        for fact in &facts {
            let key = (self.normalizer.normalize(&fact.section_path), fact.node_type.clone());
            groups.entry(key).or_default().push(fact);
        }

        let synthesizer = self.synthesizer();
        let detector = self.conflict_detector();
        let mut report = LearnReport {
            run_id: tracker.run_id.clone(),
            ..LearnReport::default()
        };

        for ((section_path, node_type), group) in &groups {
            tracker.check()?;
            let paths = [section_path.clone()];

            let (check, outcome, resolution) = self.db.write(|s| {
                let check = detector.detect(s, scope, &paths)?;
                let outcome = synthesizer.synthesize(s, group)?;
                let resolution = match request.resolution {
                    Some(strategy) if check.has_conflicts => Some(detector.apply(
                        s,
                        scope,
                        &paths,
                        strategy,
                        Some(outcome.pattern.id.as_str()),
                    )?),
                    _ => None,
                };
                Ok::<_, PipelineError>((check, outcome, resolution))
            })?;

            tracing::debug!(
                section_path = %section_path,
                node_type = %node_type,
                facts = group.len(),
                pattern_id = %outcome.pattern.id,
                created = outcome.created,
                conflicts = check.conflicts.len(),
                "group learned"
            );
            tracker.counters.facts += group.len() as u64;
            if outcome.created {
                tracker.counters.patterns += 1;
                report.created_pattern_ids.push(outcome.pattern.id);
            } else {
                report.sighted_pattern_ids.push(outcome.pattern.id);
            }
            if check.has_conflicts {
                report.conflicts.push(check);
            }
            if let Some(resolution) = resolution {
                report.resolutions.push(resolution);
            }
        }

        tracing::info!(
            run_id = %report.run_id,
            groups = groups.len(),
            patterns_created = report.created_pattern_ids.len(),
            patterns_sighted = report.sighted_pattern_ids.len(),
            "learn pass finished"
        );
        Ok(report)
    }
}
