//! Session: repository view over one connection inside a unit of work.

use rusqlite::Connection;
use sextant_core::errors::StorageError;
use sextant_core::models::{
    ExampleRef, Fact, Pattern, PatternMatch, Run, RunCounters, RunFailure, RunStatus, Scope,
};
use sextant_core::traits::{
    FactRepository, MatchRepository, PatternQuery, PatternRepository, RunRepository,
};

use crate::queries;

/// Borrowed connection handed to `DatabaseManager::write` and `read`
/// closures. Inside `write` it sits on an open IMMEDIATE transaction.
pub struct Session<'c> {
    conn: &'c Connection,
}

impl<'c> Session<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }

    pub fn count_matches_for_pattern(&self, pattern_id: &str) -> Result<u64, StorageError> {
        queries::matches::count_matches_for_pattern(self.conn, pattern_id)
    }
}

impl PatternRepository for Session<'_> {
    fn create_pattern(&self, pattern: &Pattern) -> Result<(), StorageError> {
        queries::patterns::insert_pattern(self.conn, pattern)
    }

    fn get_pattern(&self, id: &str) -> Result<Option<Pattern>, StorageError> {
        queries::patterns::get_pattern(self.conn, id)
    }

    fn list_patterns(&self, query: &PatternQuery) -> Result<Vec<Pattern>, StorageError> {
        queries::patterns::list_patterns(self.conn, query)
    }

    fn find_by_signature(
        &self,
        scope: &Scope,
        signature_hash: &str,
    ) -> Result<Option<Pattern>, StorageError> {
        queries::patterns::find_by_signature(self.conn, scope, signature_hash)
    }

    fn increment_times_seen(
        &self,
        id: &str,
        example: &ExampleRef,
        max_examples: usize,
    ) -> Result<Pattern, StorageError> {
        queries::patterns::increment_times_seen(self.conn, id, example, max_examples)
    }

    fn delete_patterns(&self, ids: &[String]) -> Result<usize, StorageError> {
        queries::patterns::delete_patterns(self.conn, ids)
    }

    fn mark_superseded(&self, ids: &[String], superseded_by: &str) -> Result<usize, StorageError> {
        queries::patterns::mark_superseded(self.conn, ids, superseded_by)
    }
}

impl FactRepository for Session<'_> {
    fn create_fact(&self, fact: &Fact) -> Result<(), StorageError> {
        queries::facts::insert_fact(self.conn, fact)
    }

    fn create_facts(&self, facts: &[Fact]) -> Result<usize, StorageError> {
        queries::facts::insert_facts(self.conn, facts)
    }

    fn get_fact(&self, id: &str) -> Result<Option<Fact>, StorageError> {
        queries::facts::get_fact(self.conn, id)
    }

    fn list_facts_by_run(&self, run_id: &str) -> Result<Vec<Fact>, StorageError> {
        queries::facts::list_facts_by_run(self.conn, run_id)
    }
}

impl MatchRepository for Session<'_> {
    fn create_match(&self, m: &PatternMatch) -> Result<(), StorageError> {
        queries::matches::insert_match(self.conn, m)
    }

    fn create_matches(&self, matches: &[PatternMatch]) -> Result<usize, StorageError> {
        queries::matches::insert_matches(self.conn, matches)
    }

    fn list_matches_by_run(&self, run_id: &str) -> Result<Vec<PatternMatch>, StorageError> {
        queries::matches::list_matches_by_run(self.conn, run_id)
    }
}

impl RunRepository for Session<'_> {
    fn create_run(&self, run: &Run) -> Result<(), StorageError> {
        queries::runs::insert_run(self.conn, run)
    }

    fn finish_run(
        &self,
        id: &str,
        status: RunStatus,
        counters: &RunCounters,
        error: Option<&str>,
    ) -> Result<(), StorageError> {
        queries::runs::finish_run(self.conn, id, status, counters, error)
    }

    fn get_run(&self, id: &str) -> Result<Option<Run>, StorageError> {
        queries::runs::get_run(self.conn, id)
    }

    fn record_failure(&self, failure: &RunFailure) -> Result<(), StorageError> {
        queries::runs::insert_failure(self.conn, failure)
    }

    fn list_failures(&self, run_id: &str) -> Result<Vec<RunFailure>, StorageError> {
        queries::runs::list_failures(self.conn, run_id)
    }
}
