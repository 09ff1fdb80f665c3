//! ConflictDetector: section-path overlap between candidates and the library.
//!
//! Detection is advisory and never blocks. The caller picks a
//! [`ResolutionStrategy`] and applies it with [`ConflictDetector::apply`],
//! which re-detects inside the caller's unit of work before writing.

use std::collections::BTreeMap;

use sextant_core::errors::ConflictError;
use sextant_core::events::types::{ConflictDetectedEvent, ResolutionAppliedEvent};
use sextant_core::events::EventDispatcher;
use sextant_core::models::{
    ConflictCheck, ConflictRecord, ConflictType, ExistingPatternRef, Pattern, ResolutionStrategy,
    Scope,
};
use sextant_core::traits::{PatternQuery, PatternRepository};
use sextant_core::PathNormalizer;

/// What `apply` changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub strategy: ResolutionStrategy,
    /// The check re-run inside the unit of work.
    pub check: ConflictCheck,
    /// Patterns deleted (REPLACE) or superseded (MERGE).
    pub affected_pattern_ids: Vec<String>,
    pub new_pattern_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    normalizer: PathNormalizer,
    events: EventDispatcher,
}

impl ConflictDetector {
    pub fn new(normalizer: PathNormalizer) -> Self {
        Self {
            normalizer,
            events: EventDispatcher::default(),
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Check `candidate_paths` against the active patterns of `scope`.
    pub fn detect<R>(
        &self,
        repo: &R,
        scope: &Scope,
        candidate_paths: &[String],
    ) -> Result<ConflictCheck, ConflictError>
    where
        R: PatternRepository + ?Sized,
    {
        let existing = repo.list_patterns(&PatternQuery::in_scope(scope))?;
        let check = self.classify(candidate_paths, &existing);
        for conflict in &check.conflicts {
            tracing::debug!(
                extracting_path = %conflict.extracting_path,
                conflict_type = %conflict.conflict_type,
                existing = conflict.existing_patterns.len(),
                "section path conflict"
            );
            self.events.emit_conflict_detected(&ConflictDetectedEvent {
                extracting_path: conflict.extracting_path.clone(),
                conflict_type: conflict.conflict_type,
                existing_pattern_ids: conflict
                    .existing_patterns
                    .iter()
                    .map(|p| p.pattern_id.clone())
                    .collect(),
            });
        }
        Ok(check)
    }

    /// Pure classification of candidates against `existing`. Superseded
    /// patterns and equal paths never conflict.
    pub fn classify(&self, candidate_paths: &[String], existing: &[Pattern]) -> ConflictCheck {
        let mut grouped: BTreeMap<(String, ConflictType), Vec<ExistingPatternRef>> =
            BTreeMap::new();

        for raw in candidate_paths {
            let candidate = self.normalizer.normalize(raw);
            for pattern in existing.iter().filter(|p| p.is_active()) {
                let existing_path = self.normalizer.normalize(&pattern.section_path);
                let conflict_type = if self.normalizer.is_strict_ancestor(&candidate, &existing_path)
                {
                    ConflictType::ParentChild
                } else if self.normalizer.is_strict_ancestor(&existing_path, &candidate) {
                    ConflictType::ChildParent
                } else {
                    continue;
                };
                let refs = grouped.entry((candidate.clone(), conflict_type)).or_default();
                if !refs.iter().any(|r| r.pattern_id == pattern.id) {
                    refs.push(ExistingPatternRef {
                        pattern_id: pattern.id.clone(),
                        section_path: existing_path,
                        times_seen: pattern.times_seen,
                    });
                }
            }
        }

        if grouped.is_empty() {
            return ConflictCheck::clear();
        }

        let conflicts: Vec<ConflictRecord> = grouped
            .into_iter()
            .map(|((extracting_path, conflict_type), mut existing_patterns)| {
                existing_patterns.sort_by(|a, b| {
                    a.section_path
                        .cmp(&b.section_path)
                        .then_with(|| a.pattern_id.cmp(&b.pattern_id))
                });
                let impact = impact_text(&extracting_path, conflict_type, &existing_patterns);
                ConflictRecord {
                    extracting_path,
                    conflict_type,
                    recommended_resolution: conflict_type.recommended_resolution(),
                    existing_patterns,
                    impact,
                }
            })
            .collect();

        let recommendation = if conflicts
            .iter()
            .any(|c| c.conflict_type == ConflictType::ParentChild)
        {
            ResolutionStrategy::Replace
        } else {
            ResolutionStrategy::KeepBoth
        };

        ConflictCheck {
            has_conflicts: true,
            conflicts,
            can_proceed: true,
            recommendation: Some(recommendation),
        }
    }

    /// Re-detect and apply `strategy` through `repo`, which must be the
    /// session of the same unit of work as the pattern write.
    ///
    /// REPLACE deletes and MERGE supersedes the existing patterns that sit
    /// under a candidate path (PARENT_CHILD). Ancestor patterns
    /// (CHILD_PARENT) are left alone. KEEP_BOTH writes nothing.
    pub fn apply<R>(
        &self,
        repo: &R,
        scope: &Scope,
        candidate_paths: &[String],
        strategy: ResolutionStrategy,
        new_pattern_id: Option<&str>,
    ) -> Result<ResolutionReport, ConflictError>
    where
        R: PatternRepository + ?Sized,
    {
        let check = self.detect(repo, scope, candidate_paths)?;
        let mut targets: Vec<String> = check
            .conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::ParentChild)
            .flat_map(|c| c.existing_patterns.iter().map(|p| p.pattern_id.clone()))
            .collect();
        targets.sort();
        targets.dedup();

        let affected = match strategy {
            ResolutionStrategy::Replace => {
                let deleted = repo.delete_patterns(&targets)?;
                tracing::info!(deleted, "REPLACE removed subsumed patterns");
                targets
            }
            ResolutionStrategy::Merge => {
                let superseding = new_pattern_id.ok_or(ConflictError::MissingSupersedingPattern)?;
                if targets.iter().any(|id| id == superseding) {
                    return Err(ConflictError::SelfSupersede(superseding.to_string()));
                }
                let updated = repo.mark_superseded(&targets, superseding)?;
                tracing::info!(updated, superseded_by = superseding, "MERGE superseded patterns");
                targets
            }
            ResolutionStrategy::KeepBoth => {
                if check.has_conflicts {
                    tracing::warn!(
                        conflicts = check.conflicts.len(),
                        "KEEP_BOTH leaves overlapping patterns; matches may be ambiguous"
                    );
                }
                Vec::new()
            }
        };

        self.events.emit_resolution_applied(&ResolutionAppliedEvent {
            strategy,
            affected_pattern_ids: affected.clone(),
            new_pattern_id: new_pattern_id.map(str::to_string),
        });

        Ok(ResolutionReport {
            strategy,
            check,
            affected_pattern_ids: affected,
            new_pattern_id: new_pattern_id.map(str::to_string),
        })
    }
}

fn impact_text(path: &str, conflict_type: ConflictType, existing: &[ExistingPatternRef]) -> String {
    let sightings: u64 = existing.iter().map(|p| p.times_seen).sum();
    match conflict_type {
        ConflictType::ParentChild => format!(
            "{path} would subsume {} existing pattern(s) ({sightings} sightings) below it",
            existing.len()
        ),
        ConflictType::ChildParent => format!(
            "{path} sits under {} existing pattern(s) ({sightings} sightings); \
             keeping both may make matches ambiguous",
            existing.len()
        ),
    }
}
