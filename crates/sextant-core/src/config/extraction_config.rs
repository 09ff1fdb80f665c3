//! Extraction configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the streaming subtree extractor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum fragment size in bytes. Default: 1 MiB.
    pub max_fragment_bytes: Option<u64>,
    /// Prefix tokens stripped from the root segment of every path. Default: ["IATA_"].
    #[serde(default)]
    pub root_prefixes: Vec<String>,
    /// Maximum snippet length (chars) kept on a fact. Default: 500.
    pub max_snippet_length: Option<usize>,
    /// Facts per write transaction. Default: 100.
    pub batch_size: Option<usize>,
}

impl ExtractionConfig {
    pub fn effective_max_fragment_bytes(&self) -> u64 {
        self.max_fragment_bytes.unwrap_or(1024 * 1024)
    }

    pub fn effective_root_prefixes(&self) -> Vec<String> {
        if self.root_prefixes.is_empty() {
            vec!["IATA_".to_string()]
        } else {
            self.root_prefixes.clone()
        }
    }

    pub fn effective_max_snippet_length(&self) -> usize {
        self.max_snippet_length.unwrap_or(500)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(100)
    }
}
