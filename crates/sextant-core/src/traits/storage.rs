//! Repository traits implemented by the storage layer.
//!
//! Every call runs inside the caller's unit of work; implementations never
//! open their own transaction.

use crate::errors::StorageError;
use crate::models::{
    ExampleRef, Fact, Pattern, PatternMatch, Run, RunCounters, RunFailure, RunStatus, Scope,
};

/// Airline restriction applied to pattern listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AirlineFilter {
    #[default]
    Any,
    /// Generic patterns only.
    Generic,
    /// Patterns of exactly this airline.
    Exact(String),
    /// This airline's patterns plus generic ones.
    ExactOrGeneric(String),
}

impl AirlineFilter {
    /// The filter matching candidates for a fact carrying `airline_code`.
    pub fn for_fact(airline_code: Option<&str>) -> Self {
        match airline_code {
            Some(code) => Self::ExactOrGeneric(code.to_string()),
            None => Self::Generic,
        }
    }

    /// The filter selecting exactly `scope`'s airline partition.
    pub fn for_scope(scope: &Scope) -> Self {
        match &scope.airline_code {
            Some(code) => Self::Exact(code.clone()),
            None => Self::Generic,
        }
    }
}

/// Pattern listing filter. Results are ordered airline-scoped first, then
/// `times_seen` desc, `last_seen_at` desc, id asc.
#[derive(Debug, Clone, Default)]
pub struct PatternQuery {
    pub spec_version: Option<String>,
    pub message_root: Option<String>,
    pub airline: AirlineFilter,
    pub section_path: Option<String>,
    pub include_superseded: bool,
    pub limit: Option<usize>,
}

impl PatternQuery {
    /// Active patterns of exactly `scope`.
    pub fn in_scope(scope: &Scope) -> Self {
        Self {
            spec_version: Some(scope.spec_version.clone()),
            message_root: Some(scope.message_root.clone()),
            airline: AirlineFilter::for_scope(scope),
            ..Self::default()
        }
    }

    pub fn section_path(mut self, path: impl Into<String>) -> Self {
        self.section_path = Some(path.into());
        self
    }

    pub fn airline(mut self, filter: AirlineFilter) -> Self {
        self.airline = filter;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_superseded(mut self) -> Self {
        self.include_superseded = true;
        self
    }
}

pub trait PatternRepository {
    /// Fails with `StorageError::UniqueViolation` when the signature already
    /// exists in the pattern's scope.
    fn create_pattern(&self, pattern: &Pattern) -> Result<(), StorageError>;
    fn get_pattern(&self, id: &str) -> Result<Option<Pattern>, StorageError>;
    fn list_patterns(&self, query: &PatternQuery) -> Result<Vec<Pattern>, StorageError>;
    fn find_by_signature(
        &self,
        scope: &Scope,
        signature_hash: &str,
    ) -> Result<Option<Pattern>, StorageError>;
    /// Record a repeat sighting and return the updated pattern.
    fn increment_times_seen(
        &self,
        id: &str,
        example: &ExampleRef,
        max_examples: usize,
    ) -> Result<Pattern, StorageError>;
    /// Hard-delete; historical matches keep their rows with a null pattern id.
    fn delete_patterns(&self, ids: &[String]) -> Result<usize, StorageError>;
    fn mark_superseded(&self, ids: &[String], superseded_by: &str) -> Result<usize, StorageError>;
}

pub trait FactRepository {
    fn create_fact(&self, fact: &Fact) -> Result<(), StorageError>;
    fn create_facts(&self, facts: &[Fact]) -> Result<usize, StorageError>;
    fn get_fact(&self, id: &str) -> Result<Option<Fact>, StorageError>;
    /// Facts of a run in ordinal order.
    fn list_facts_by_run(&self, run_id: &str) -> Result<Vec<Fact>, StorageError>;
}

pub trait MatchRepository {
    fn create_match(&self, m: &PatternMatch) -> Result<(), StorageError>;
    fn create_matches(&self, matches: &[PatternMatch]) -> Result<usize, StorageError>;
    fn list_matches_by_run(&self, run_id: &str) -> Result<Vec<PatternMatch>, StorageError>;
}

pub trait RunRepository {
    fn create_run(&self, run: &Run) -> Result<(), StorageError>;
    fn finish_run(
        &self,
        id: &str,
        status: RunStatus,
        counters: &RunCounters,
        error: Option<&str>,
    ) -> Result<(), StorageError>;
    fn get_run(&self, id: &str) -> Result<Option<Run>, StorageError>;
    fn record_failure(&self, failure: &RunFailure) -> Result<(), StorageError>;
    fn list_failures(&self, run_id: &str) -> Result<Vec<RunFailure>, StorageError>;
}
