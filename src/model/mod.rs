//! Model builder and fine-tuning strategies
//!
//! [`build_model`] loads a pretrained checkpoint and returns either a
//! [`FullFineTune`] or a [`LoraModel`] behind [`TrainableModel`].

mod adapted;
mod builder;
mod causal_lm;
mod config;
mod error;
mod full;
mod linear;
mod names;
mod resize;
mod trainable;


pub use adapted::LoraModel;
pub use builder::build_model;
pub use causal_lm::CausalLm;
pub use config::ModelConfig;
pub use error::{ModelError, Result};
pub use full::FullFineTune;
pub use linear::{BaseWeight, Linear};
pub use names::{find_embedding, find_head, is_embedding, is_head, module_of, natural_cmp};
pub use resize::{resize_rows, resize_token_embeddings};
pub use trainable::{Batch, ModelKind, ParameterCount, StepOutput, TrainableModel};
