//! Training driver errors

use thiserror::Error;

use crate::model::ModelError;

pub type Result<T> = std::result::Result<T, TrainError>;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Invalid training arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown optimizer: {0}")]
    UnknownOptimizer(String),

    #[error("Unknown scheduler: {0}")]
    UnknownScheduler(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Callback {name} failed: {message}")]
    Callback { name: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrainError {
    /// Whether a smaller batch might get past the failure
    #[must_use]
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            Self::ResourceExhausted(_) => true,
            Self::Model(e) => e.is_resource_exhausted(),
            _ => false,
        }
    }
}
