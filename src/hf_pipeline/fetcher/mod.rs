//! Hugging Face model fetcher
//!
//! Downloads models from the Hub with authentication and caching.

mod hf_fetcher;
mod types;


pub use hf_fetcher::HfModelFetcher;
pub use types::{
    shard_files, ModelArtifact, ModelSource, WeightFormat, MODEL_CONFIG_FILE, WEIGHTS_FILE,
    WEIGHTS_INDEX_FILE,
};
