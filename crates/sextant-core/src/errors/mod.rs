//! Error handling for Sextant.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod conflict_error;
pub mod error_code;
pub mod extractor_error;
pub mod fragment_error;
pub mod match_error;
pub mod parse_error;
pub mod pipeline_error;
pub mod storage_error;
pub mod synthesis_error;

pub use config_error::ConfigError;
pub use conflict_error::ConflictError;
pub use error_code::SextantErrorCode;
pub use extractor_error::ExtractorError;
pub use fragment_error::FragmentError;
pub use match_error::MatchError;
pub use parse_error::ParseError;
pub use pipeline_error::{PipelineError, PipelineResult};
pub use storage_error::StorageError;
pub use synthesis_error::SynthesisError;
