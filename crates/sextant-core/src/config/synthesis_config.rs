//! Synthesis configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Size of the per-pattern example ring. Default: 10.
    pub max_examples: Option<usize>,
}

impl SynthesisConfig {
    pub fn effective_max_examples(&self) -> usize {
        self.max_examples.unwrap_or(10)
    }
}
