//! Job configuration
//!
//! Turns an untyped option mapping (YAML file, JSON payload, or an already
//! typed [`TrainingParams`]) into validated parameters, and resolves the
//! values that depend on the prepared tokenizer.
//!
//! # Example
//!
//! ```
//! use afinar::config::{normalize, UNSET};
//! use serde_json::json;
//!
//! let params = normalize(json!({
//!     "model_name": "gpt2",
//!     "data_path": "tatsu-lab/alpaca",
//!     "train_batch_size": "8",
//!     "use_peft": "true",
//! }))
//! .unwrap();
//!
//! assert_eq!(params.train_batch_size, 8);
//! assert!(params.use_peft);
//! assert_eq!(params.block_size, UNSET);
//! assert_eq!(params.resolve(2048).block_size(), 1024);
//! ```

mod error;
mod kinds;
mod lenient;
mod normalize;
mod params;
mod resolve;
mod validate;

#[cfg(test)]
mod tests;

pub use error::{ConfigError, Result};
pub use kinds::{IntervalStrategy, OptimizerKind, SchedulerType};
pub use normalize::{load_params, normalize, ParamsInput};
pub use params::{TrainingParams, FIELD_NAMES, REQUIRED_FIELDS, UNSET};
pub use resolve::{resolve_block_size, ResolvedParams, DEFAULT_BLOCK_SIZE};
pub use validate::is_valid_repo_id;
