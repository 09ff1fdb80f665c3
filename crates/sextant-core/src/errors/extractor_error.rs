//! Errors surfaced by fact extractors.

use super::error_code::{self, SextantErrorCode};

/// Errors a `FactExtractor` may return for one fragment.
#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("Extractor unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed extractor payload: {0}")]
    MalformedPayload(String),

    #[error("Fragment markup could not be read: {0}")]
    InvalidFragment(String),

    #[error("Extractor timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl SextantErrorCode for ExtractorError {
    fn error_code(&self) -> &'static str {
        error_code::EXTRACTOR_ERROR
    }
}
