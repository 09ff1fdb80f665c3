//! Seams between the core engine and its collaborators.

pub mod cancellation;
pub mod fact_extractor;
pub mod storage;

pub use cancellation::{Cancellable, CancellationToken, Interruption};
pub use fact_extractor::FactExtractor;
pub use storage::{
    AirlineFilter, FactRepository, MatchRepository, PatternQuery, PatternRepository,
    RunRepository,
};
