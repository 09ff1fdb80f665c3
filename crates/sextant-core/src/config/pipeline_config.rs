//! Pipeline configuration.

use serde::{Deserialize, Serialize};

const MAX_DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for identify scoring. Default: available parallelism, capped at 8.
    pub workers: Option<usize>,
    /// Whole-run timeout in seconds. Default: 600.
    pub run_timeout_secs: Option<u64>,
}

impl PipelineConfig {
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_WORKERS)
        })
    }

    pub fn effective_run_timeout_secs(&self) -> u64 {
        self.run_timeout_secs.unwrap_or(600)
    }
}
