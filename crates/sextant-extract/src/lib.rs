//! # sextant-extract
//!
//! Single-pass, bounded-memory extraction of target subtrees from NDC
//! documents, plus a deterministic rule-based fact extractor.

pub mod extractor;
pub mod hasher;
pub mod rule_based;
pub mod trie;

pub use extractor::{Emission, StreamingSubtreeExtractor, WalkOutcome};
pub use rule_based::RuleBasedFactExtractor;
pub use trie::{PathTrie, TargetDescriptor};
