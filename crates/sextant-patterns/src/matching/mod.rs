//! MatchEngine: candidate fan-out, scoring, tie-break, verdict.

mod scoring;
mod verdict;

pub use scoring::{score, PenaltyPolicy, ScoreBreakdown};
pub use verdict::Thresholds;

use std::cmp::Ordering;

use chrono::Utc;
use sextant_core::config::MatchingConfig;
use sextant_core::errors::MatchError;
use sextant_core::models::{Fact, Pattern, PatternMatch, Verdict};
use sextant_core::traits::{AirlineFilter, PatternQuery, PatternRepository};
use sextant_core::PathNormalizer;

/// Verdict for one fact plus the breakdown of the winning candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub verdict: Verdict,
    /// Set only for EXACT/HIGH/PARTIAL/LOW matches.
    pub pattern_id: Option<String>,
    pub confidence: f64,
    pub best: Option<ScoreBreakdown>,
    pub candidates_considered: usize,
}

impl MatchOutcome {
    fn new_pattern() -> Self {
        Self {
            verdict: Verdict::NewPattern,
            pattern_id: None,
            confidence: 0.0,
            best: None,
            candidates_considered: 0,
        }
    }

    /// The persisted record of this outcome.
    pub fn to_match(&self, run_id: &str, fact_id: &str) -> PatternMatch {
        PatternMatch {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            fact_id: fact_id.to_string(),
            pattern_id: self.pattern_id.clone(),
            confidence: self.confidence,
            verdict: self.verdict,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    normalizer: PathNormalizer,
    thresholds: Thresholds,
    policy: PenaltyPolicy,
    top_k: usize,
}

impl MatchEngine {
    pub fn new(normalizer: PathNormalizer, config: &MatchingConfig) -> Self {
        Self {
            normalizer,
            thresholds: Thresholds::from_config(config),
            policy: PenaltyPolicy {
                per_relationship: config.effective_relationship_penalty(),
                cap: config.effective_max_relationship_penalty(),
            },
            top_k: config.effective_candidate_top_k(),
        }
    }

    /// Candidate query for `fact`: its section path, active patterns of its
    /// airline or generic ones, capped at `candidate_top_k`.
    pub fn candidate_query(&self, fact: &Fact) -> PatternQuery {
        PatternQuery {
            spec_version: Some(fact.spec_version.clone()),
            message_root: Some(fact.message_root.clone()),
            airline: AirlineFilter::for_fact(fact.airline_code.as_deref()),
            section_path: Some(self.normalizer.normalize(&fact.section_path)),
            include_superseded: false,
            limit: Some(self.top_k),
        }
    }

    /// Load candidates from `repo` and score `fact` against them.
    pub fn identify<R>(&self, repo: &R, fact: &Fact) -> Result<MatchOutcome, MatchError>
    where
        R: PatternRepository + ?Sized,
    {
        let candidates = repo.list_patterns(&self.candidate_query(fact))?;
        self.evaluate(fact, &candidates)
    }

    /// Score `fact` against an already loaded candidate set. Superseded
    /// candidates are skipped; candidates outside the fact's scope or
    /// section path are rejected.
    pub fn evaluate(&self, fact: &Fact, candidates: &[Pattern]) -> Result<MatchOutcome, MatchError> {
        let section_path = self.normalizer.normalize(&fact.section_path);
        let mut eligible: Vec<&Pattern> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !candidate.is_active() {
                continue;
            }
            let airline_ok = candidate.airline_code.is_none()
                || candidate.airline_code == fact.airline_code;
            if candidate.spec_version != fact.spec_version
                || candidate.message_root != fact.message_root
                || !airline_ok
                || self.normalizer.normalize(&candidate.section_path) != section_path
            {
                return Err(MatchError::CandidateOutOfScope {
                    pattern_id: candidate.id.clone(),
                    section_path,
                });
            }
            eligible.push(candidate);
        }
        if eligible.is_empty() {
            return Ok(MatchOutcome::new_pattern());
        }

        eligible.sort_by(|a, b| fan_out_order(a, b));
        eligible.truncate(self.top_k);

        let mut best: Option<(&Pattern, ScoreBreakdown)> = None;
        for candidate in eligible.iter().copied() {
            let breakdown = score(&candidate.id, fact, &candidate.decision_rule, self.policy);
            let better = match &best {
                None => true,
                Some((current, current_score)) => {
                    prefer(candidate, &breakdown, current, current_score) == Ordering::Less
                }
            };
            if better {
                best = Some((candidate, breakdown));
            }
        }

        let considered = eligible.len();
        let Some((winner, breakdown)) = best else {
            return Ok(MatchOutcome::new_pattern());
        };
        let verdict = self.thresholds.verdict(breakdown.score);
        tracing::debug!(
            fact_id = %fact.id,
            pattern_id = %winner.id,
            score = breakdown.score,
            verdict = %verdict,
            "fact scored"
        );
        Ok(MatchOutcome {
            verdict,
            pattern_id: verdict.is_match().then(|| winner.id.clone()),
            confidence: breakdown.score,
            best: Some(breakdown),
            candidates_considered: considered,
        })
    }
}

/// Airline-scoped first, then times_seen desc, last_seen_at desc, id asc.
fn fan_out_order(a: &Pattern, b: &Pattern) -> Ordering {
    b.airline_code
        .is_some()
        .cmp(&a.airline_code.is_some())
        .then(b.times_seen.cmp(&a.times_seen))
        .then(b.last_seen_at.cmp(&a.last_seen_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// `Less` when `(a, a_score)` beats `(b, b_score)`: higher score, then
/// higher times_seen, more recent last_seen_at, airline-scoped, lower id.
fn prefer(a: &Pattern, a_score: &ScoreBreakdown, b: &Pattern, b_score: &ScoreBreakdown) -> Ordering {
    b_score
        .score
        .total_cmp(&a_score.score)
        .then(b.times_seen.cmp(&a.times_seen))
        .then(b.last_seen_at.cmp(&a.last_seen_at))
        .then(b.airline_code.is_some().cmp(&a.airline_code.is_some()))
        .then_with(|| a.id.cmp(&b.id))
}
