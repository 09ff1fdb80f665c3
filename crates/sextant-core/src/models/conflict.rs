//! Section-path overlap between a candidate and existing patterns.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    /// An existing pattern lives strictly under the candidate path.
    ParentChild,
    /// The candidate path lives strictly under an existing pattern.
    ChildParent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStrategy {
    Replace,
    Merge,
    KeepBoth,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentChild => "PARENT_CHILD",
            Self::ChildParent => "CHILD_PARENT",
        }
    }

    pub fn recommended_resolution(&self) -> ResolutionStrategy {
        match self {
            Self::ParentChild => ResolutionStrategy::Replace,
            Self::ChildParent => ResolutionStrategy::KeepBoth,
        }
    }
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::Merge => "MERGE",
            Self::KeepBoth => "KEEP_BOTH",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingPatternRef {
    pub pattern_id: String,
    pub section_path: String,
    pub times_seen: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub extracting_path: String,
    pub conflict_type: ConflictType,
    pub existing_patterns: Vec<ExistingPatternRef>,
    pub recommended_resolution: ResolutionStrategy,
    pub impact: String,
}

/// Advisory outcome of a conflict check. Never blocks the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCheck {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictRecord>,
    pub can_proceed: bool,
    pub recommendation: Option<ResolutionStrategy>,
}

impl ConflictCheck {
    pub fn clear() -> Self {
        Self {
            has_conflicts: false,
            conflicts: Vec::new(),
            can_proceed: true,
            recommendation: None,
        }
    }

    /// Ids of every existing pattern named by any conflict, deduplicated.
    pub fn conflicting_pattern_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .conflicts
            .iter()
            .flat_map(|c| c.existing_patterns.iter().map(|p| p.pattern_id.clone()))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
