//! Pattern table queries.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use sextant_core::errors::StorageError;
use sextant_core::models::{ExampleRef, Pattern, Scope};
use sextant_core::traits::{AirlineFilter, PatternQuery};

use super::{json_from_sql, json_to_sql, ts_from_sql, ts_to_sql};
use crate::to_storage_err;

const PATTERN_COLUMNS: &str = "id, spec_version, message_root, airline_code, section_path, \
     decision_rule, signature_hash, times_seen, examples, superseded_by, created_at, last_seen_at";

pub fn insert_pattern(conn: &Connection, p: &Pattern) -> Result<(), StorageError> {
    let rule = json_to_sql("decision_rule", &p.decision_rule)?;
    let examples = json_to_sql("examples", &p.examples)?;
    conn.prepare_cached(
        "INSERT INTO patterns (id, spec_version, message_root, airline_code, section_path,
            decision_rule, signature_hash, times_seen, examples, superseded_by, created_at,
            last_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .map_err(to_storage_err)?
    .execute(params![
        p.id,
        p.spec_version,
        p.message_root,
        p.airline_code,
        p.section_path,
        rule,
        p.signature_hash,
        p.times_seen as i64,
        examples,
        p.superseded_by,
        ts_to_sql(&p.created_at),
        ts_to_sql(&p.last_seen_at),
    ])
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn get_pattern(conn: &Connection, id: &str) -> Result<Option<Pattern>, StorageError> {
    let sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE id = ?1");
    conn.prepare_cached(&sql)
        .map_err(to_storage_err)?
        .query_row(params![id], row_to_pattern)
        .optional()
        .map_err(to_storage_err)
}

/// Signature lookup within one scope partition, superseded rows included.
pub fn find_by_signature(
    conn: &Connection,
    scope: &Scope,
    signature_hash: &str,
) -> Result<Option<Pattern>, StorageError> {
    let sql = format!(
        "SELECT {PATTERN_COLUMNS} FROM patterns
         WHERE spec_version = ?1 AND message_root = ?2
           AND COALESCE(airline_code, '') = COALESCE(?3, '')
           AND signature_hash = ?4"
    );
    conn.prepare_cached(&sql)
        .map_err(to_storage_err)?
        .query_row(
            params![
                scope.spec_version,
                scope.message_root,
                scope.airline_code,
                signature_hash
            ],
            row_to_pattern,
        )
        .optional()
        .map_err(to_storage_err)
}

pub fn list_patterns(conn: &Connection, query: &PatternQuery) -> Result<Vec<Pattern>, StorageError> {
    let mut sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE 1 = 1");
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(spec) = &query.spec_version {
        sql.push_str(" AND spec_version = ?");
        args.push(SqlValue::Text(spec.clone()));
    }
    if let Some(root) = &query.message_root {
        sql.push_str(" AND message_root = ?");
        args.push(SqlValue::Text(root.clone()));
    }
    match &query.airline {
        AirlineFilter::Any => {}
        AirlineFilter::Generic => sql.push_str(" AND airline_code IS NULL"),
        AirlineFilter::Exact(code) => {
            sql.push_str(" AND airline_code = ?");
            args.push(SqlValue::Text(code.clone()));
        }
        AirlineFilter::ExactOrGeneric(code) => {
            sql.push_str(" AND (airline_code = ? OR airline_code IS NULL)");
            args.push(SqlValue::Text(code.clone()));
        }
    }
    if let Some(path) = &query.section_path {
        sql.push_str(" AND section_path = ?");
        args.push(SqlValue::Text(path.clone()));
    }
    if !query.include_superseded {
        sql.push_str(" AND superseded_by IS NULL");
    }
    sql.push_str(
        " ORDER BY (airline_code IS NULL) ASC, times_seen DESC, last_seen_at DESC, id ASC",
    );
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        args.push(SqlValue::Integer(limit as i64));
    }

    let mut stmt = conn.prepare_cached(&sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params_from_iter(args), row_to_pattern)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Bump `times_seen`, refresh `last_seen_at` and push `example` into the ring.
pub fn increment_times_seen(
    conn: &Connection,
    id: &str,
    example: &ExampleRef,
    max_examples: usize,
) -> Result<Pattern, StorageError> {
    let mut pattern = get_pattern(conn, id)?.ok_or_else(|| StorageError::NotFound {
        entity: "pattern",
        id: id.to_string(),
    })?;
    pattern.push_example(example.clone(), max_examples);
    pattern.times_seen += 1;
    if example.timestamp > pattern.last_seen_at {
        pattern.last_seen_at = example.timestamp;
    }

    let examples = json_to_sql("examples", &pattern.examples)?;
    conn.prepare_cached(
        "UPDATE patterns SET times_seen = ?2, last_seen_at = ?3, examples = ?4 WHERE id = ?1",
    )
    .map_err(to_storage_err)?
    .execute(params![
        id,
        pattern.times_seen as i64,
        ts_to_sql(&pattern.last_seen_at),
        examples
    ])
    .map_err(to_storage_err)?;
    Ok(pattern)
}

pub fn delete_patterns(conn: &Connection, ids: &[String]) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached("DELETE FROM patterns WHERE id = ?1")
        .map_err(to_storage_err)?;
    let mut deleted = 0;
    for id in ids {
        deleted += stmt.execute(params![id]).map_err(to_storage_err)?;
    }
    Ok(deleted)
}

/// Point `ids` at `superseded_by`. The superseding pattern itself is skipped.
pub fn mark_superseded(
    conn: &Connection,
    ids: &[String],
    superseded_by: &str,
) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached("UPDATE patterns SET superseded_by = ?2 WHERE id = ?1 AND id != ?2")
        .map_err(to_storage_err)?;
    let mut updated = 0;
    for id in ids {
        updated += stmt.execute(params![id, superseded_by]).map_err(to_storage_err)?;
    }
    Ok(updated)
}

fn row_to_pattern(row: &Row<'_>) -> rusqlite::Result<Pattern> {
    let rule: String = row.get(5)?;
    let times_seen: i64 = row.get(7)?;
    let examples: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    let last_seen_at: String = row.get(11)?;
    Ok(Pattern {
        id: row.get(0)?,
        spec_version: row.get(1)?,
        message_root: row.get(2)?,
        airline_code: row.get(3)?,
        section_path: row.get(4)?,
        decision_rule: json_from_sql(5, &rule)?,
        signature_hash: row.get(6)?,
        times_seen: times_seen.max(0) as u64,
        examples: json_from_sql(8, &examples)?,
        superseded_by: row.get(9)?,
        created_at: ts_from_sql(10, &created_at)?,
        last_seen_at: ts_from_sql(11, &last_seen_at)?,
    })
}
