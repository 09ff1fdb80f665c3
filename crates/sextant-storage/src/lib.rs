//! # sextant-storage
//!
//! SQLite-backed repositories. All writes go through one serialized writer
//! connection in `BEGIN IMMEDIATE` units of work; reads use a pooled
//! read-only connection when the database is file-backed.

pub mod connection;
pub mod locks;
pub mod migrations;
pub mod queries;
pub mod session;

pub use connection::DatabaseManager;
pub use locks::{ExclusiveScopeGuard, ScopeLocks, SharedScopeGuard};
pub use session::Session;

use rusqlite::ErrorCode;
use sextant_core::errors::StorageError;

/// Map a rusqlite error onto the storage taxonomy.
pub(crate) fn to_storage_err(e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &e {
        let message = message.clone().unwrap_or_else(|| e.to_string());
        match failure.code {
            ErrorCode::ConstraintViolation
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                return StorageError::UniqueViolation {
                    constraint: message,
                };
            }
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                return StorageError::DbBusy { message };
            }
            _ => {}
        }
    }
    StorageError::SqliteError {
        message: e.to_string(),
    }
}
