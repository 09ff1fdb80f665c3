//! Domain models shared by every Sextant subsystem.

pub mod conflict;
pub mod decision_rule;
pub mod extracted;
pub mod fact;
pub mod fragment;
pub mod pattern;
pub mod pattern_match;
pub mod run;
pub mod scope;
pub mod verdict;

pub use conflict::{
    ConflictCheck, ConflictRecord, ConflictType, ExistingPatternRef, ResolutionStrategy,
};
pub use decision_rule::{ChildDescriptor, ChildStructure, DecisionRule, ExpectedRelationship};
pub use extracted::{ExtractedFact, ExtractorTelemetry, FactExtraction};
pub use fact::{is_broken_reference, ChildFact, Fact, ValueMap};
pub use fragment::FragmentDescriptor;
pub use pattern::{ExampleRef, Pattern};
pub use pattern_match::PatternMatch;
pub use run::{Run, RunCounters, RunFailure, RunKind, RunStatus};
pub use scope::Scope;
pub use verdict::Verdict;
