//! Pipeline configuration with validation.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Default output path when none is configured.
pub const DEFAULT_OUTPUT_FILE: &str = "aggregate-results.ndjson";

/// Default per-queue capacity.
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;

/// Runtime configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Source NDJSON path
    #[garde(skip)]
    pub input_file: PathBuf,

    /// Destination NDJSON path
    #[garde(skip)]
    pub output_file: PathBuf,

    /// Number of parser worker threads
    #[garde(range(min = 1, max = 1024))]
    pub parser_threads: usize,

    /// Per-queue capacity; 0 disables backpressure entirely (unbounded)
    #[garde(skip)]
    pub queue_size: usize,
}

impl PipelineConfig {
    /// Build a configuration for `input_file` with the documented defaults:
    /// output `aggregate-results.ndjson`, one parser worker per hardware
    /// thread and queues bounded at 10000 items.
    #[must_use]
    pub fn new(input_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            parser_threads: default_parser_threads(),
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }

    /// Validate field ranges and return the configuration unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when a field is out of range.
    pub fn validated(self) -> PipelineResult<Self> {
        self.validate().map_err(|report| PipelineError::Config {
            message: report.to_string(),
        })?;
        Ok(self)
    }
}

/// Hardware concurrency, or 4 when it cannot be determined.
#[must_use]
pub fn default_parser_threads() -> usize {
    std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
}
