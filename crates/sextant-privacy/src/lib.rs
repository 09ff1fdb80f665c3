//! # sextant-privacy
//!
//! PII masking applied to facts before they are persisted.

pub mod degradation;
pub mod engine;
pub mod patterns;
pub mod payload;
pub mod xml;

pub use degradation::{DegradationEvent, DegradationTracker};
pub use engine::{Detection, FactMaskReport, MaskOutcome, PIIMaskingEngine};
pub use patterns::Detector;
