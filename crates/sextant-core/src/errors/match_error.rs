//! Match engine errors.

use super::error_code::{self, SextantErrorCode};
use super::StorageError;

/// Errors that can occur while scoring a fact against the pattern library.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("Candidate {pattern_id} is outside the fact's section path {section_path}")]
    CandidateOutOfScope {
        pattern_id: String,
        section_path: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SextantErrorCode for MatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            _ => error_code::MATCH_ERROR,
        }
    }
}
