//! Error types for legality-sampler

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for sampling, merging and analysis
#[derive(Debug, Error)]
pub enum SamplerError {
    /// A required input file or directory does not exist
    #[error("Input not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Start/end indexes do not describe a non-empty slice of the class table
    #[error("Invalid range {start}..{end} for {len} classes")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// A shard could not finish its slice
    #[error("Shard {index} failed: {message}")]
    Shard { index: usize, message: String },

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] legality_config::ConfigError),
}

impl SamplerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SamplerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for sampler operations
pub type Result<T> = std::result::Result<T, SamplerError>;
