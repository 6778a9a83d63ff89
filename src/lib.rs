//! Afinar: causal language model fine-tuning
//!
//! A single job turns a pretrained causal LM and a text dataset into a
//! fine-tuned model directory:
//!
//! 1. [`config`]: normalize and validate the job parameters
//! 2. [`hf_pipeline`]: fetch the model and load the dataset splits
//! 3. [`tokenizer`]: prepare the tokenizer and its length limit
//! 4. [`preprocess`]: tokenize and regroup text into fixed-size blocks
//! 5. [`model`]: build a full or LoRA fine-tuning strategy
//! 6. [`train`]: run the training loop with callbacks and checkpoints
//! 7. [`pipeline`]: save, merge adapters and publish
//!
//! [`pipeline::train`] runs everything for one configuration.

pub mod cli;
pub mod config;
pub mod error;
pub mod hf_pipeline;
pub mod io;
pub mod lora;
pub mod model;
pub mod optim;
pub mod parameter;
pub mod pipeline;
pub mod preprocess;
pub mod quant;
pub mod tokenizer;
pub mod train;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use parameter::Parameter;
