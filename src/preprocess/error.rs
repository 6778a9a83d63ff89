//! Preprocessing errors

use thiserror::Error;

use crate::tokenizer::TokenizerError;

pub type Result<T> = std::result::Result<T, PreprocessError>;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Tokenization failed: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Record {index} has no text in column '{column}'")]
    MissingText { column: String, index: usize },

    #[error("block_size must be positive")]
    InvalidBlockSize,

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}
