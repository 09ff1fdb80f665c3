//! # sextant-core
//!
//! Shared foundation for the Sextant pattern engine: domain models, path
//! normalization, per-subsystem errors, layered configuration, tracing
//! setup, event hooks, and the repository / fact-extractor seams.

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod path;
pub mod tracing;
pub mod traits;
pub mod types;

pub use config::SextantConfig;
pub use models::{Fact, Pattern, PatternMatch, Scope, Verdict};
pub use path::PathNormalizer;
