//! # sextant-patterns
//!
//! Learns decision rules from fact groups, scores facts against the learned
//! library, and detects section-path overlaps between new and existing
//! patterns.

pub mod conflicts;
pub mod matching;
pub mod synthesis;

pub use conflicts::ConflictDetector;
pub use matching::{MatchEngine, MatchOutcome, ScoreBreakdown, Thresholds};
pub use synthesis::{PatternSynthesizer, SynthesisOutcome};
