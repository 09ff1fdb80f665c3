//! Configuration system for Sextant.
//! TOML-based, layered resolution: env > project > user > defaults.

pub mod extraction_config;
pub mod matching_config;
pub mod pipeline_config;
pub mod privacy_config;
pub mod sextant_config;
pub mod synthesis_config;

pub use extraction_config::ExtractionConfig;
pub use matching_config::MatchingConfig;
pub use pipeline_config::PipelineConfig;
pub use privacy_config::PrivacyConfig;
pub use sextant_config::SextantConfig;
pub use synthesis_config::SynthesisConfig;
