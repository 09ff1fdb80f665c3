//! Bounded rayon pool for identify scoring.

use rayon::{ThreadPool, ThreadPoolBuilder};
use sextant_core::errors::PipelineError;

pub(crate) fn build_pool(workers: usize) -> Result<ThreadPool, PipelineError> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("sextant-identify-{i}"))
        .build()
        .map_err(|e| PipelineError::WorkerPool(e.to_string()))
}
