//! Pattern match queries.

use rusqlite::{params, Connection, Row};
use sextant_core::errors::StorageError;
use sextant_core::models::PatternMatch;

use super::{parse_enum, ts_from_sql, ts_to_sql};
use crate::to_storage_err;

pub fn insert_match(conn: &Connection, m: &PatternMatch) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO pattern_matches (id, run_id, fact_id, pattern_id, confidence, verdict,
            created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .map_err(to_storage_err)?
    .execute(params![
        m.id,
        m.run_id,
        m.fact_id,
        m.pattern_id,
        m.confidence,
        m.verdict.as_str(),
        ts_to_sql(&m.created_at),
    ])
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn insert_matches(conn: &Connection, matches: &[PatternMatch]) -> Result<usize, StorageError> {
    for m in matches {
        insert_match(conn, m)?;
    }
    Ok(matches.len())
}

/// Matches of a run in insertion order.
pub fn list_matches_by_run(
    conn: &Connection,
    run_id: &str,
) -> Result<Vec<PatternMatch>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, run_id, fact_id, pattern_id, confidence, verdict, created_at
             FROM pattern_matches WHERE run_id = ?1 ORDER BY rowid",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![run_id], row_to_match)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Number of matches still pointing at `pattern_id`.
pub fn count_matches_for_pattern(conn: &Connection, pattern_id: &str) -> Result<u64, StorageError> {
    let count: i64 = conn
        .prepare_cached("SELECT COUNT(*) FROM pattern_matches WHERE pattern_id = ?1")
        .map_err(to_storage_err)?
        .query_row(params![pattern_id], |row| row.get(0))
        .map_err(to_storage_err)?;
    Ok(count.max(0) as u64)
}

fn row_to_match(row: &Row<'_>) -> rusqlite::Result<PatternMatch> {
    let verdict: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(PatternMatch {
        id: row.get(0)?,
        run_id: row.get(1)?,
        fact_id: row.get(2)?,
        pattern_id: row.get(3)?,
        confidence: row.get(4)?,
        verdict: parse_enum(5, &verdict)?,
        created_at: ts_from_sql(6, &created_at)?,
    })
}
