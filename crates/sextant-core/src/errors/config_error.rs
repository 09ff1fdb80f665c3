//! Configuration errors.

use super::error_code::{self, SextantErrorCode};

/// Loading or validating `SextantConfig` failed. Every variant names where
/// the bad value came from.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}")]
    FileNotFound { path: String },

    #[error("Malformed TOML in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("{var}={value:?} is not a valid {expected}")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: &'static str,
    },

    #[error("{field} {message}")]
    ValidationFailed { field: String, message: String },
}

impl SextantErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
