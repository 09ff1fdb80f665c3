//! Fragment-level errors. Recorded against the run, never fatal.

use super::error_code::{self, SextantErrorCode};

/// A failure confined to one extracted fragment.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FragmentError {
    #[error("Fragment at {path} is {size} bytes, over the {limit} byte limit")]
    Oversize { path: String, size: u64, limit: u64 },

    #[error("Fact extractor failed on {path}: {message}")]
    Extractor { path: String, message: String },

    #[error("Masking degraded on {path}: {message}")]
    Masking { path: String, message: String },
}

impl FragmentError {
    /// Section path of the fragment that failed.
    pub fn path(&self) -> &str {
        match self {
            Self::Oversize { path, .. }
            | Self::Extractor { path, .. }
            | Self::Masking { path, .. } => path,
        }
    }

    /// Failure kind as persisted in `run_failures.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Oversize { .. } => "oversize",
            Self::Extractor { .. } => "extractor",
            Self::Masking { .. } => "masking",
        }
    }
}

impl SextantErrorCode for FragmentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Oversize { .. } => error_code::OVERSIZE_FRAGMENT,
            Self::Extractor { .. } => error_code::EXTRACTOR_ERROR,
            Self::Masking { .. } => error_code::EXTRACTOR_ERROR,
        }
    }
}
