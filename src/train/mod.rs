//! Training driver
//!
//! Turns run parameters into [`TrainingArguments`], registers the
//! adapter-aware callbacks and drives a [`TrainableModel`] through a
//! [`TrainingLoop`].
//!
//! # Example
//!
//! ```no_run
//! use afinar::config::TrainingParams;
//! use afinar::train::{build_callbacks, derive_logging_steps, Trainer, TrainingArguments};
//!
//! let params = TrainingParams::new("gpt2", "./data");
//! let logging_steps = derive_logging_steps(params.logging_steps, 1000, None, params.train_batch_size);
//! let args = TrainingArguments::from_params(&params, logging_steps).unwrap();
//! let trainer = Trainer::new(args, build_callbacks(params.use_peft, params.has_validation()));
//! ```
//!
//! [`TrainableModel`]: crate::model::TrainableModel

mod args;
pub mod callback;
mod collator;
mod error;
mod trainer;

#[cfg(test)]
mod tests;

pub use args::{derive_logging_steps, TrainingArguments, REPORT_TO};
pub use callback::{
    build_callbacks, CallbackAction, CallbackContext, CallbackManager, LoadBestAdapterCallback,
    LogEntry, MetricsLog, ProgressCallback, SaveAdapterCallback, TrainerCallback,
};
pub use collator::{default_data_collator, epoch_batches};
pub use error::{Result, TrainError};
pub use trainer::{
    checkpoint_dir, rotate_checkpoints, sorted_checkpoints, TrainResult, Trainer, TrainerState,
    TrainingLoop, CHECKPOINT_PREFIX, TRAINER_STATE_FILE,
};
