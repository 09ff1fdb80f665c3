//! Run lifecycle and failure queries.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use sextant_core::errors::StorageError;
use sextant_core::models::{Run, RunCounters, RunFailure, RunStatus, Scope};

use super::{parse_enum, ts_from_sql, ts_to_sql};
use crate::to_storage_err;

pub fn insert_run(conn: &Connection, run: &Run) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO runs (id, kind, spec_version, message_root, airline_code, status,
            started_at, completed_at, fragments, facts, matches, patterns, failures, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .map_err(to_storage_err)?
    .execute(params![
        run.id,
        run.kind.as_str(),
        run.scope.spec_version,
        run.scope.message_root,
        run.scope.airline_code,
        run.status.as_str(),
        ts_to_sql(&run.started_at),
        run.completed_at.as_ref().map(ts_to_sql),
        run.counters.fragments as i64,
        run.counters.facts as i64,
        run.counters.matches as i64,
        run.counters.patterns as i64,
        run.counters.failures as i64,
        run.error,
    ])
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn finish_run(
    conn: &Connection,
    id: &str,
    status: RunStatus,
    counters: &RunCounters,
    error: Option<&str>,
) -> Result<(), StorageError> {
    let updated = conn
        .prepare_cached(
            "UPDATE runs SET status = ?2, completed_at = ?3, fragments = ?4, facts = ?5,
                matches = ?6, patterns = ?7, failures = ?8, error = ?9
             WHERE id = ?1",
        )
        .map_err(to_storage_err)?
        .execute(params![
            id,
            status.as_str(),
            ts_to_sql(&Utc::now()),
            counters.fragments as i64,
            counters.facts as i64,
            counters.matches as i64,
            counters.patterns as i64,
            counters.failures as i64,
            error,
        ])
        .map_err(to_storage_err)?;
    if updated == 0 {
        return Err(StorageError::NotFound {
            entity: "run",
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn get_run(conn: &Connection, id: &str) -> Result<Option<Run>, StorageError> {
    conn.prepare_cached(
        "SELECT id, kind, spec_version, message_root, airline_code, status, started_at,
            completed_at, fragments, facts, matches, patterns, failures, error
         FROM runs WHERE id = ?1",
    )
    .map_err(to_storage_err)?
    .query_row(params![id], row_to_run)
    .optional()
    .map_err(to_storage_err)
}

pub fn insert_failure(conn: &Connection, failure: &RunFailure) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO run_failures (run_id, kind, section_path, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .map_err(to_storage_err)?
    .execute(params![
        failure.run_id,
        failure.kind,
        failure.section_path,
        failure.detail,
        ts_to_sql(&failure.created_at),
    ])
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn list_failures(conn: &Connection, run_id: &str) -> Result<Vec<RunFailure>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT run_id, kind, section_path, detail, created_at
             FROM run_failures WHERE run_id = ?1 ORDER BY rowid",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![run_id], |row| {
            let created_at: String = row.get(4)?;
            Ok(RunFailure {
                run_id: row.get(0)?,
                kind: row.get(1)?,
                section_path: row.get(2)?,
                detail: row.get(3)?,
                created_at: ts_from_sql(4, &created_at)?,
            })
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<Run> {
    let kind: String = row.get(1)?;
    let status: String = row.get(5)?;
    let started_at: String = row.get(6)?;
    let completed_at: Option<String> = row.get(7)?;
    let counter = |idx: usize| -> rusqlite::Result<u64> { Ok(row.get::<_, i64>(idx)?.max(0) as u64) };
    Ok(Run {
        id: row.get(0)?,
        kind: parse_enum(1, &kind)?,
        scope: Scope {
            spec_version: row.get(2)?,
            message_root: row.get(3)?,
            airline_code: row.get(4)?,
        },
        status: parse_enum(5, &status)?,
        started_at: ts_from_sql(6, &started_at)?,
        completed_at: completed_at.map(|raw| ts_from_sql(7, &raw)).transpose()?,
        counters: RunCounters {
            fragments: counter(8)?,
            facts: counter(9)?,
            matches: counter(10)?,
            patterns: counter(11)?,
            failures: counter(12)?,
        },
        error: row.get(13)?,
    })
}
