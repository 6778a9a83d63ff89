//! Tensor file errors

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TensorIoError>;

#[derive(Debug, Error)]
pub enum TensorIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SafeTensors error in {path}: {message}")]
    SafeTensors { path: PathBuf, message: String },

    #[error("Tensor '{name}' has unsupported dtype {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("Tensor '{name}' data does not match shape {shape:?}")]
    Shape { name: String, shape: Vec<usize> },
}
