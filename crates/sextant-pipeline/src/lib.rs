//! # sextant-pipeline
//!
//! Orchestrates the three run kinds over a shared [`DatabaseManager`]:
//!
//! - **extract**: stream documents, extract facts per fragment, mask, persist.
//! - **identify**: score a run's facts against the library on a worker pool.
//! - **learn**: synthesize patterns from seed facts, applying the caller's
//!   conflict resolution inside the same unit of work.
//!
//! [`DatabaseManager`]: sextant_storage::DatabaseManager

mod extraction;
mod identify;
mod learn;
pub mod pipeline;
pub mod reports;
mod runs;
mod workers;

pub use learn::{LearnRequest, LearnSource};
pub use pipeline::Pipeline;
pub use reports::{ExtractionReport, IdentifyReport, LearnReport};
