//! Error types for Hub and dataset access

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for Hub and dataset operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors that can occur while fetching models and datasets
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network timeout during download
    #[error("Network timeout for {repo} after {elapsed:?}")]
    NetworkTimeout { repo: String, elapsed: Duration },

    /// Model repository or local model directory not found
    #[error("Model not found: {repo}")]
    ModelNotFound { repo: String },

    /// File not found in repository
    #[error("File not found in {repo}: {file}")]
    FileNotFound { repo: String, file: String },

    /// Dataset repository or local dataset directory not found
    #[error("Dataset not found: {dataset}")]
    DatasetNotFound { dataset: String },

    /// No data files match the requested split
    #[error("Split '{split}' not found in {dataset}")]
    SplitNotFound { dataset: String, split: String },

    /// Invalid repository ID format
    #[error("Invalid repository ID format (expected 'org/name'): {repo_id}")]
    InvalidRepoId { repo_id: String },

    /// Missing authentication token
    #[error("Missing HF_TOKEN - set environment variable or huggingface_token")]
    MissingToken,

    /// Model config parsing error
    #[error("Failed to parse config.json: {message}")]
    ConfigParseError { message: String },

    /// Data file with an unknown extension
    #[error("Unsupported data file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Malformed record in a data file
    #[error("Invalid record in {path} (line {line}): {message}")]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Hub API failure other than a missing file
    #[error("Hub API error: {message}")]
    Api { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkTimeout { .. })
    }

    /// Whether the error means the requested thing does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound { .. }
                | Self::FileNotFound { .. }
                | Self::DatasetNotFound { .. }
                | Self::SplitNotFound { .. }
        )
    }
}
