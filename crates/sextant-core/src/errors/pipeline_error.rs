//! Run-level errors and the result type that carries skipped fragments.

use super::error_code::{self, SextantErrorCode};
use super::{
    ConfigError, ConflictError, FragmentError, MatchError, ParseError, StorageError,
    SynthesisError,
};

/// Fatal run errors. Subsystem errors convert in through `From`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Fragment error: {0}")]
    Fragment(#[from] FragmentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("Conflict error: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Run timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl SextantErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::Fragment(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Synthesis(e) => e.error_code(),
            Self::Match(e) => e.error_code(),
            Self::Conflict(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::WorkerPool(_) => error_code::STORAGE_ERROR,
            Self::Cancelled => error_code::CANCELLED,
            Self::Timeout { .. } => error_code::TIMEOUT,
        }
    }
}

/// A run's report plus the fragment failures it recorded and skipped.
#[derive(Debug, Default)]
pub struct PipelineResult<T: Default = ()> {
    pub data: T,
    pub errors: Vec<FragmentError>,
}

impl<T: Default> PipelineResult<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: FragmentError) {
        self.errors.push(error);
    }

    /// No fragment was skipped.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Recorded failures of one kind (`oversize`, `extractor`, `masking`).
    pub fn errors_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a FragmentError> + 'a {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }
}
