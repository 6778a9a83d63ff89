//! Tokenizer error types.

use std::path::PathBuf;

use thiserror::Error;

/// Tokenizer errors
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("Tokenizer file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to load tokenizer: {0}")]
    Load(String),

    #[error("Failed to encode text: {0}")]
    Encode(String),

    #[error("Failed to save tokenizer: {0}")]
    Save(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tokenizer operations
pub type Result<T> = std::result::Result<T, TokenizerError>;
