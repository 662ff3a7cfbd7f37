//! Pipeline error types.
//!
//! Stage loops never surface errors mid-stream; an internal failure is
//! either a counted drop or a reason to close the stage's output queue.
//! These types cover the edges of the pipeline: configuration, file
//! handling and stage thread lifecycle.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by the pipeline library.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration rejected by validation
    #[error("Configuration error: {message}")]
    Config {
        /// What was rejected and why
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stage thread could not be spawned or did not terminate cleanly
    #[error("Stage '{stage}' failed: {reason}")]
    Stage {
        /// Stage name
        stage: &'static str,
        /// Failure reason
        reason: String,
    },
}
