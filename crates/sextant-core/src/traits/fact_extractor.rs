//! The fact-extractor seam. Implementations are opaque producers (an LLM
//! service, or the rule-based extractor in `sextant-extract`); callers never
//! retry on their behalf.

use crate::errors::ExtractorError;
use crate::models::{FactExtraction, FragmentDescriptor};

pub trait FactExtractor: Send + Sync {
    /// Short identifier recorded in logs.
    fn name(&self) -> &str;

    fn extract(&self, fragment: &FragmentDescriptor) -> Result<FactExtraction, ExtractorError>;
}
