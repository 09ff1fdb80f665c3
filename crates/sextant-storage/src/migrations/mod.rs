//! Schema migrations tracked through `PRAGMA user_version`.

mod v001_initial;

use rusqlite::Connection;
use sextant_core::errors::StorageError;

use crate::to_storage_err;

const MIGRATIONS: &[(u32, &str)] = &[(1, v001_initial::MIGRATION_SQL)];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: u32 = 1;

/// Apply every migration newer than the database's `user_version`.
pub fn run_migrations(conn: &Connection) -> Result<u32, StorageError> {
    let current = current_version(conn)?;
    let mut applied = current;
    for &(version, sql) in MIGRATIONS {
        if version <= current {
            continue;
        }
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))
        .map_err(|e| {
            // Leave no half-applied migration behind.
            let _ = conn.execute_batch("ROLLBACK;");
            StorageError::MigrationFailed {
                version,
                message: e.to_string(),
            }
        })?;
        applied = version;
        tracing::info!(version, "applied schema migration");
    }
    Ok(applied)
}

pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(to_storage_err)
}
