//! PatternSynthesizer: derive, sign, and find-or-create patterns.

mod rule;
mod signature;

pub use rule::derive_rule;
pub use signature::signature_hash;

use chrono::Utc;
use sextant_core::config::SynthesisConfig;
use sextant_core::errors::SynthesisError;
use sextant_core::events::types::{PatternCreatedEvent, PatternSightedEvent};
use sextant_core::events::EventDispatcher;
use sextant_core::models::{ExampleRef, Fact, Pattern, Scope};
use sextant_core::traits::PatternRepository;
use sextant_core::PathNormalizer;

/// Result of one synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub pattern: Pattern,
    /// True when the call inserted a new pattern, false on a repeat sighting.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct PatternSynthesizer {
    normalizer: PathNormalizer,
    max_examples: usize,
    events: EventDispatcher,
}

impl PatternSynthesizer {
    pub fn new(normalizer: PathNormalizer, config: &SynthesisConfig) -> Self {
        Self {
            normalizer,
            max_examples: config.effective_max_examples(),
            events: EventDispatcher::default(),
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn max_examples(&self) -> usize {
        self.max_examples
    }

    /// Find-or-create the pattern for `facts` using `repo`, which must sit
    /// inside the caller's unit of work.
    pub fn synthesize<R>(&self, repo: &R, facts: &[&Fact]) -> Result<SynthesisOutcome, SynthesisError>
    where
        R: PatternRepository + ?Sized,
    {
        let (scope, section_path) = self.group_key(facts)?;
        let rule = derive_rule(facts)?;
        let signature = signature_hash(&scope.spec_version, &section_path, &rule)?;
        let example = latest_example(facts)?;

        if let Some(existing) = repo.find_by_signature(&scope, &signature)? {
            return self.record_sighting(repo, &existing.id, &example);
        }

        let now = Utc::now();
        let pattern = Pattern {
            id: uuid::Uuid::new_v4().to_string(),
            spec_version: scope.spec_version.clone(),
            message_root: scope.message_root.clone(),
            airline_code: scope.airline_code.clone(),
            section_path,
            decision_rule: rule,
            signature_hash: signature,
            times_seen: 1,
            examples: vec![example.clone()],
            superseded_by: None,
            created_at: now,
            last_seen_at: now,
        };

        match repo.create_pattern(&pattern) {
            Ok(()) => {
                tracing::debug!(
                    pattern_id = %pattern.id,
                    section_path = %pattern.section_path,
                    signature = %pattern.signature_hash,
                    "pattern created"
                );
                self.events.emit_pattern_created(&PatternCreatedEvent {
                    pattern_id: pattern.id.clone(),
                    section_path: pattern.section_path.clone(),
                    signature_hash: pattern.signature_hash.clone(),
                });
                Ok(SynthesisOutcome {
                    pattern,
                    created: true,
                })
            }
            Err(e) if e.is_unique_violation() => {
                // A concurrent writer inserted the same signature first.
                tracing::debug!(signature = %pattern.signature_hash, "signature race, recording as sighting");
                let winner = repo
                    .find_by_signature(&scope, &pattern.signature_hash)?
                    .ok_or(SynthesisError::Storage(e))?;
                self.record_sighting(repo, &winner.id, &example)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_sighting<R>(
        &self,
        repo: &R,
        pattern_id: &str,
        example: &ExampleRef,
    ) -> Result<SynthesisOutcome, SynthesisError>
    where
        R: PatternRepository + ?Sized,
    {
        let pattern = repo.increment_times_seen(pattern_id, example, self.max_examples)?;
        if !pattern.is_active() {
            tracing::debug!(pattern_id, "sighting recorded on a superseded pattern");
        }
        self.events.emit_pattern_sighted(&PatternSightedEvent {
            pattern_id: pattern.id.clone(),
            times_seen: pattern.times_seen,
        });
        Ok(SynthesisOutcome {
            pattern,
            created: false,
        })
    }

    /// Shared scope and normalized section path of the group.
    fn group_key(&self, facts: &[&Fact]) -> Result<(Scope, String), SynthesisError> {
        let first = facts.first().ok_or(SynthesisError::EmptyGroup)?;
        let scope = first.scope();
        let section_path = self.normalizer.normalize(&first.section_path);

        for fact in &facts[1..] {
            let other = fact.scope();
            if other.spec_version != scope.spec_version {
                return Err(mixed("spec_version", &scope.spec_version, &other.spec_version));
            }
            if other.message_root != scope.message_root {
                return Err(mixed("message_root", &scope.message_root, &other.message_root));
            }
            if other.airline_code != scope.airline_code {
                return Err(mixed(
                    "airline_code",
                    scope.airline_code.as_deref().unwrap_or("*"),
                    other.airline_code.as_deref().unwrap_or("*"),
                ));
            }
            let path = self.normalizer.normalize(&fact.section_path);
            if path != section_path {
                return Err(mixed("section_path", &section_path, &path));
            }
        }
        Ok((scope, section_path))
    }
}

fn mixed(field: &'static str, expected: &str, found: &str) -> SynthesisError {
    SynthesisError::MixedGroup {
        field,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// The most recently created fact of the group, stamped with the sighting time.
fn latest_example(facts: &[&Fact]) -> Result<ExampleRef, SynthesisError> {
    let latest = facts
        .iter()
        .max_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.ordinal.cmp(&b.ordinal))
                .then_with(|| b.id.cmp(&a.id))
        })
        .ok_or(SynthesisError::EmptyGroup)?;
    Ok(ExampleRef {
        fact_id: latest.id.clone(),
        timestamp: Utc::now(),
    })
}
