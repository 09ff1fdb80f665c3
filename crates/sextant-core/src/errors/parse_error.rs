//! Document parse errors. Always fatal to the run that hit them.

use super::error_code::{self, SextantErrorCode};

/// Errors raised while walking a source document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed markup at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Unexpected end of document with {open_elements} element(s) still open")]
    UnexpectedEof { open_elements: usize },

    #[error("Invalid UTF-8 in element name at byte {position}")]
    InvalidName { position: u64 },

    #[error("I/O error reading document: {message}")]
    Io { message: String },
}

impl SextantErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        error_code::PARSE_ERROR
    }
}
