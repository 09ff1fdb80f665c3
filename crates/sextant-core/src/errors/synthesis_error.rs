//! Pattern synthesis errors.

use super::error_code::{self, SextantErrorCode};
use super::StorageError;

/// Errors that can occur while synthesizing a pattern from a fact group.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("Cannot synthesize a pattern from an empty fact group")]
    EmptyGroup,

    #[error("Fact group is not homogeneous: {field} differs ({expected} vs {found})")]
    MixedGroup {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("Signature canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SextantErrorCode for SynthesisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            _ => error_code::SYNTHESIS_ERROR,
        }
    }
}
