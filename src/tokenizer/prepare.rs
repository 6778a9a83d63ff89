//! Tokenizer preparation for a training run

use std::path::Path;

use tracing::info;

use super::error::Result;
use super::hf::HfTokenizer;

/// Largest `model_max_length` taken at face value
pub const MAX_TRUSTED_LENGTH: usize = 2048;

/// Limit to use given the tokenizer's own and the configured value
///
/// Limits above [`MAX_TRUSTED_LENGTH`] are usually placeholders, so they
/// are replaced by the configured maximum.
#[must_use]
pub fn clamp_max_length(tokenizer_max: usize, configured_max: usize) -> usize {
    if tokenizer_max > MAX_TRUSTED_LENGTH {
        configured_max
    } else {
        tokenizer_max
    }
}

/// Load the tokenizer from a model directory and clamp its length limit
pub fn prepare_tokenizer(model_dir: &Path, configured_max: usize) -> Result<HfTokenizer> {
    let mut tokenizer = HfTokenizer::from_dir(model_dir)?;
    let original = tokenizer.model_max_length();
    let clamped = clamp_max_length(original, configured_max);
    if clamped != original {
        info!(
            from = original,
            to = clamped,
            "overriding tokenizer model_max_length"
        );
        tokenizer.set_model_max_length(clamped);
    }
    Ok(tokenizer)
}
