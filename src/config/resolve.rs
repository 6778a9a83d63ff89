//! Derived configuration values
//!
//! The block size depends on the tokenizer that is only known after the
//! tokenizer preparer ran. Resolution returns a fresh [`ResolvedParams`]
//! instead of writing the value back into [`TrainingParams`].

use tracing::warn;

use super::params::TrainingParams;

/// Ceiling applied when no block size was requested
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Resolve the block size against the tokenizer limit
///
/// * unset: `min(tokenizer_max, 1024)`, warning when the tokenizer allows more
/// * set to `b`: `min(b, tokenizer_max)`, warning when `b` exceeded the limit
#[must_use]
pub fn resolve_block_size(requested: Option<usize>, tokenizer_max: usize) -> usize {
    match requested {
        None => {
            if tokenizer_max > DEFAULT_BLOCK_SIZE {
                warn!(
                    "The chosen tokenizer supports a `model_max_length` ({tokenizer_max}) that is longer than \
                     the default `block_size` value of {DEFAULT_BLOCK_SIZE}. If you would like to use a longer \
                     `block_size` up to `tokenizer.model_max_length` you can override this default with \
                     `block_size`."
                );
                DEFAULT_BLOCK_SIZE
            } else {
                tokenizer_max
            }
        }
        Some(block_size) => {
            if block_size > tokenizer_max {
                warn!(
                    "The block_size passed ({block_size}) is larger than the maximum length for the model \
                     ({tokenizer_max}). Using block_size={tokenizer_max}."
                );
            }
            block_size.min(tokenizer_max)
        }
    }
}

/// Training parameters plus values derived at run time
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    params: TrainingParams,
    block_size: usize,
}

impl ResolvedParams {
    #[must_use]
    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Effective block size, always in `1..=tokenizer_max`
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl std::ops::Deref for ResolvedParams {
    type Target = TrainingParams;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl TrainingParams {
    /// Resolve derived values against the prepared tokenizer's limit
    #[must_use]
    pub fn resolve(&self, tokenizer_max: usize) -> ResolvedParams {
        ResolvedParams {
            params: self.clone(),
            block_size: resolve_block_size(self.requested_block_size(), tokenizer_max),
        }
    }
}
