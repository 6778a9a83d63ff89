//! Hugging Face Hub integration
//!
//! This module provides:
//! - Model downloading with authentication and caching
//! - Dataset split loading from local directories or Hub dataset repos
//! - Publishing a trained model folder to a Hub model repository
//!
//! # Example
//!
//! ```ignore
//! use afinar::hf_pipeline::{load_dataset, HfModelFetcher};
//!
//! let fetcher = HfModelFetcher::new();
//! let artifact = fetcher.fetch_model("gpt2")?;
//! let train = load_dataset("tatsu-lab/alpaca", "train", None)?;
//! ```

pub mod dataset;
mod error;
mod fetcher;
pub mod publish;

pub use dataset::{load_dataset, process_data, Record, TextDataset};
pub use error::{FetchError, Result};
pub use fetcher::{
    shard_files, HfModelFetcher, ModelArtifact, ModelSource, WeightFormat, MODEL_CONFIG_FILE,
    WEIGHTS_FILE, WEIGHTS_INDEX_FILE,
};
pub use publish::{HfPublisher, PublishConfig, PublishError, PublishResult};
