//! Tokenizer loading and preparation
//!
//! Wraps a pretrained Hugging Face `tokenizer.json` (via the `tokenizers`
//! crate) together with its `tokenizer_config.json`, and applies the
//! run-level length clamp before preprocessing.
//!
//! # Example
//!
//! ```rust,ignore
//! use afinar::tokenizer::prepare_tokenizer;
//!
//! let tokenizer = prepare_tokenizer(model_dir, 1024)?;
//! let encoded = tokenizer.encode("Hello, world!")?;
//! ```

mod config;
mod error;
mod hf;
mod prepare;

#[cfg(test)]
mod tests;

pub use config::{
    TokenizerFileConfig, SPECIAL_TOKENS_FILE, TOKENIZER_CONFIG_FILE, TOKENIZER_FILE,
    UNBOUNDED_MAX_LENGTH,
};
pub use error::{Result, TokenizerError};
pub use hf::{Encoded, HfTokenizer};
pub use prepare::{clamp_max_length, prepare_tokenizer, MAX_TRUSTED_LENGTH};
