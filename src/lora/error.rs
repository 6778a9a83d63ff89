//! LoRA adapter errors

use thiserror::Error;

use crate::io::TensorIoError;

pub type Result<T> = std::result::Result<T, AdapterError>;

/// Adapter construction, save/load and merge errors
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SafeTensors error: {0}")]
    SafeTensors(#[from] TensorIoError),

    #[error("Dimension mismatch for {name}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Missing tensor: {0}")]
    MissingTensor(String),

    #[error("Unknown model family '{0}': set target_modules explicitly")]
    UnknownModelFamily(String),

    #[error("No modules match target_modules {0:?}")]
    NoTargetModules(Vec<String>),

    #[error("PEFT format error: {0}")]
    PeftFormat(String),

    #[error("Base model error: {0}")]
    BaseModel(String),
}
