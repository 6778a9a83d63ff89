//! Group stage: concatenate and re-chunk into fixed-size blocks

use tracing::info;

use crate::tokenizer::Encoded;

use super::error::{PreprocessError, Result};
use super::map::{map_batched, MapOptions};
use super::tokenize::TokenizedDataset;

/// Worker hint for grouping
pub const GROUP_NUM_PROC: usize = 4;

/// One training example of exactly `block_size` tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmBlock {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    /// Copy of `input_ids`; the model shifts internally
    pub labels: Vec<u32>,
}

/// A split ready for causal-LM training
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LmDataset {
    pub split: String,
    pub block_size: usize,
    pub blocks: Vec<LmBlock>,
}

impl LmDataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Group one map batch
///
/// Columns are concatenated across the batch and cut into `block_size`
/// chunks; a trailing remainder shorter than a block is dropped.
#[must_use]
pub fn group_batch(batch: &[Encoded], block_size: usize) -> Vec<LmBlock> {
    let input_ids: Vec<u32> = batch.iter().flat_map(|e| e.input_ids.iter().copied()).collect();
    let attention_mask: Vec<u32> = batch
        .iter()
        .flat_map(|e| e.attention_mask.iter().copied())
        .collect();
    let total = (input_ids.len() / block_size) * block_size;

    input_ids[..total]
        .chunks_exact(block_size)
        .zip(attention_mask[..total].chunks_exact(block_size))
        .map(|(ids, mask)| LmBlock {
            input_ids: ids.to_vec(),
            attention_mask: mask.to_vec(),
            labels: ids.to_vec(),
        })
        .collect()
}

/// Group a tokenized split into blocks
pub fn group_texts(dataset: &TokenizedDataset, block_size: usize) -> Result<LmDataset> {
    group_texts_with(dataset, block_size, MapOptions::with_num_proc(GROUP_NUM_PROC))
}

/// [`group_texts`] with explicit map options
pub fn group_texts_with(
    dataset: &TokenizedDataset,
    block_size: usize,
    options: MapOptions,
) -> Result<LmDataset> {
    if block_size == 0 {
        return Err(PreprocessError::InvalidBlockSize);
    }
    let blocks = map_batched(&dataset.records, options, |batch| {
        Ok(group_batch(batch, block_size))
    })?;

    let grouped = LmDataset {
        split: dataset.split.clone(),
        block_size,
        blocks,
    };
    info!(split = %grouped.split, block_size, blocks = grouped.len(), "grouped");
    Ok(grouped)
}
