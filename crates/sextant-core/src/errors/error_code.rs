//! SextantErrorCode trait for stable, machine-readable error codes.

/// Trait for mapping Sextant errors to stable error code strings.
/// Every error enum implements this so callers at an outer surface can
/// branch on the code without matching on message text.
pub trait SextantErrorCode {
    /// Returns the error code string (e.g., "PARSE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const OVERSIZE_FRAGMENT: &str = "OVERSIZE_FRAGMENT";
pub const EXTRACTOR_ERROR: &str = "EXTRACTOR_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const UNIQUE_VIOLATION: &str = "UNIQUE_VIOLATION";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const DB_BUSY: &str = "DB_BUSY";
pub const SYNTHESIS_ERROR: &str = "SYNTHESIS_ERROR";
pub const MATCH_ERROR: &str = "MATCH_ERROR";
pub const CONFLICT_ERROR: &str = "CONFLICT_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CANCELLED: &str = "CANCELLED";
pub const TIMEOUT: &str = "TIMEOUT";
