//! Crate-level error aggregating every stage

use thiserror::Error;

use crate::config::ConfigError;
use crate::hf_pipeline::{FetchError, PublishError};
use crate::io::TensorIoError;
use crate::lora::AdapterError;
use crate::model::ModelError;
use crate::preprocess::PreprocessError;
use crate::tokenizer::TokenizerError;
use crate::train::TrainError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Hub error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Weights error: {0}")]
    TensorIo(#[from] TensorIoError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Training error: {0}")]
    Train(#[from] TrainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
