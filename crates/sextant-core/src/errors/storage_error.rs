//! Storage-layer errors for SQLite operations.

use super::error_code::{self, SextantErrorCode};

/// Errors raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Database busy: {message}")]
    DbBusy { message: String },

    #[error("Serialization error in {field}: {message}")]
    Serialization { field: &'static str, message: String },
}

impl StorageError {
    /// True when the error is the expected signal of a concurrent insert.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl SextantErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UniqueViolation { .. } => error_code::UNIQUE_VIOLATION,
            Self::NotFound { .. } => error_code::NOT_FOUND,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::DbBusy { .. } => error_code::DB_BUSY,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
