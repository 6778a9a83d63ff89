//! Text preprocessing
//!
//! Two stateless, batched maps over a split:
//!
//! 1. [`tokenize`]: text column to `input_ids` / `attention_mask`
//! 2. [`group_texts`]: per map batch, concatenate and re-chunk into
//!    `block_size` blocks with `labels` copied from `input_ids`

mod error;
mod group;
mod map;
mod tokenize;

#[cfg(test)]
mod tests;

pub use error::{PreprocessError, Result};
pub use group::{group_batch, group_texts, group_texts_with, LmBlock, LmDataset, GROUP_NUM_PROC};
pub use map::{map_batched, shard_range, MapOptions};
pub use tokenize::{tokenize, TokenizedDataset, TOKENIZE_NUM_PROC};
