//! Fact table queries.

use rusqlite::{params, Connection, OptionalExtension, Row};
use sextant_core::errors::StorageError;
use sextant_core::models::Fact;

use super::{json_from_sql, json_to_sql, ts_from_sql, ts_to_sql};
use crate::to_storage_err;

const FACT_COLUMNS: &str = "id, run_id, spec_version, message_root, airline_code, section_path, \
     node_type, ordinal, attributes, children, references_json, confidence, snippet, masked, \
     created_at";

pub fn insert_fact(conn: &Connection, f: &Fact) -> Result<(), StorageError> {
    let attributes = json_to_sql("attributes", &f.attributes)?;
    let children = json_to_sql("children", &f.children)?;
    let references = json_to_sql("references", &f.references)?;
    conn.prepare_cached(
        "INSERT INTO facts (id, run_id, spec_version, message_root, airline_code, section_path,
            node_type, ordinal, attributes, children, references_json, confidence, snippet,
            masked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )
    .map_err(to_storage_err)?
    .execute(params![
        f.id,
        f.run_id,
        f.spec_version,
        f.message_root,
        f.airline_code,
        f.section_path,
        f.node_type,
        f.ordinal,
        attributes,
        children,
        references,
        f.confidence,
        f.snippet,
        f.masked,
        ts_to_sql(&f.created_at),
    ])
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn insert_facts(conn: &Connection, facts: &[Fact]) -> Result<usize, StorageError> {
    for fact in facts {
        insert_fact(conn, fact)?;
    }
    Ok(facts.len())
}

pub fn get_fact(conn: &Connection, id: &str) -> Result<Option<Fact>, StorageError> {
    let sql = format!("SELECT {FACT_COLUMNS} FROM facts WHERE id = ?1");
    conn.prepare_cached(&sql)
        .map_err(to_storage_err)?
        .query_row(params![id], row_to_fact)
        .optional()
        .map_err(to_storage_err)
}

pub fn list_facts_by_run(conn: &Connection, run_id: &str) -> Result<Vec<Fact>, StorageError> {
    let sql = format!("SELECT {FACT_COLUMNS} FROM facts WHERE run_id = ?1 ORDER BY ordinal, id");
    let mut stmt = conn.prepare_cached(&sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![run_id], row_to_fact)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

fn row_to_fact(row: &Row<'_>) -> rusqlite::Result<Fact> {
    let attributes: String = row.get(8)?;
    let children: String = row.get(9)?;
    let references: String = row.get(10)?;
    let created_at: String = row.get(14)?;
    Ok(Fact {
        id: row.get(0)?,
        run_id: row.get(1)?,
        spec_version: row.get(2)?,
        message_root: row.get(3)?,
        airline_code: row.get(4)?,
        section_path: row.get(5)?,
        node_type: row.get(6)?,
        ordinal: row.get(7)?,
        attributes: json_from_sql(8, &attributes)?,
        children: json_from_sql(9, &children)?,
        references: json_from_sql(10, &references)?,
        confidence: row.get(11)?,
        snippet: row.get(12)?,
        masked: row.get(13)?,
        created_at: ts_from_sql(14, &created_at)?,
    })
}
