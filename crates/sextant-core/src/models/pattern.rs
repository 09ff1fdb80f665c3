//! Learned patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision_rule::DecisionRule;
use super::scope::Scope;

/// Pointer to one fact that sighted a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRef {
    pub fact_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub spec_version: String,
    pub message_root: String,
    pub airline_code: Option<String>,
    pub section_path: String,
    pub decision_rule: DecisionRule,
    pub signature_hash: String,
    pub times_seen: u64,
    /// The most recent sightings, oldest first.
    pub examples: Vec<ExampleRef>,
    pub superseded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Pattern {
    pub fn scope(&self) -> Scope {
        Scope {
            spec_version: self.spec_version.clone(),
            message_root: self.message_root.clone(),
            airline_code: self.airline_code.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.superseded_by.is_none()
    }

    /// Append an example, dropping the oldest ones beyond `max_examples`.
    pub fn push_example(&mut self, example: ExampleRef, max_examples: usize) {
        self.examples.push(example);
        if self.examples.len() > max_examples {
            let excess = self.examples.len() - max_examples;
            self.examples.drain(..excess);
        }
    }
}
