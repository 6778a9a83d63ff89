//! Model loading and training errors

use thiserror::Error;

use crate::io::TensorIoError;
use crate::lora::AdapterError;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Weights error: {0}")]
    Weights(#[from] TensorIoError),

    #[error("Model config error: {0}")]
    Config(String),

    #[error("Missing weight: {0}")]
    MissingWeight(String),

    #[error("Shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Token id {id} out of range for vocabulary of {vocab_size}")]
    TokenOutOfRange { id: u32, vocab_size: usize },

    #[error("Resource exhausted: cannot allocate {bytes} bytes for {what}")]
    ResourceExhausted { what: String, bytes: usize },

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

impl ModelError {
    pub(crate) fn shape(name: &str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Whether retrying with a smaller batch may succeed
    #[must_use]
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }
}

impl From<ndarray::ShapeError> for ModelError {
    fn from(e: ndarray::ShapeError) -> Self {
        Self::Config(format!("array shape error: {e}"))
    }
}
