//! Safetensors tensor I/O
//!
//! Weights are held as `f32` in memory regardless of their on-disk dtype;
//! `f16` and `bf16` files are widened on read.

mod error;
mod load;
mod save;

pub use error::{Result, TensorIoError};
pub use load::{decode_tensor, is_float, load_model_tensors, read_safetensors, TensorMap};
pub use save::{default_metadata, save_safetensors};
