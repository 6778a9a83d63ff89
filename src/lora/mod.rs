//! Low-rank adaptation (LoRA)
//!
//! Frozen base weights get a trainable update `(α/r)·B·A` with
//! A ∈ ℝ^(r × d_in) and B ∈ ℝ^(d_out × r). Adapters are stored in the
//! PEFT layout and can be merged back into the base model.

mod config;
mod error;
mod layer;
mod merge;
mod peft;
mod targets;


pub use config::LoraConfig;
pub use error::{AdapterError, Result};
pub use layer::{lora_a_name, lora_b_name, LoraLayer};
pub use merge::{merge_adapter, merge_weights, MergeReport};
pub use peft::{
    load_peft_adapter, save_peft_adapter, PeftAdapter, PeftAdapterConfig, ADAPTER_CONFIG_FILE,
    ADAPTER_WEIGHTS_FILE,
};
pub use targets::{ModelFamily, TargetModuleTable};
