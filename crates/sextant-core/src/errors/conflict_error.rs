//! Conflict resolution errors.

use super::error_code::{self, SextantErrorCode};
use super::StorageError;

/// Errors that can occur while applying a conflict resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error("MERGE requires the id of the superseding pattern")]
    MissingSupersedingPattern,

    #[error("Superseding pattern {0} cannot supersede itself")]
    SelfSupersede(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SextantErrorCode for ConflictError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            _ => error_code::CONFLICT_ERROR,
        }
    }
}
