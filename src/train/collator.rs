//! Stacking blocks into batches

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::error::{Result, TrainError};
use crate::model::Batch;
use crate::preprocess::LmBlock;

/// Stack equal-length blocks row by row
pub fn default_data_collator(blocks: &[&LmBlock]) -> Result<Batch> {
    let Some(first) = blocks.first() else {
        return Err(TrainError::InvalidArguments("cannot collate an empty batch".into()));
    };
    let seq_len = first.input_ids.len();
    if let Some(bad) = blocks
        .iter()
        .find(|b| b.input_ids.len() != seq_len || b.labels.len() != seq_len)
    {
        return Err(TrainError::InvalidArguments(format!(
            "blocks in a batch must share one length, got {seq_len} and {}",
            bad.input_ids.len()
        )));
    }

    let ids: Vec<u32> = blocks.iter().flat_map(|b| b.input_ids.iter().copied()).collect();
    let labels: Vec<u32> = blocks.iter().flat_map(|b| b.labels.iter().copied()).collect();
    let shape = (blocks.len(), seq_len);
    let input_ids = Array2::from_shape_vec(shape, ids)
        .map_err(|e| TrainError::InvalidArguments(e.to_string()))?;
    let labels = Array2::from_shape_vec(shape, labels)
        .map_err(|e| TrainError::InvalidArguments(e.to_string()))?;
    Ok(Batch::new(input_ids, labels))
}

/// Index batches for one pass; shuffled when a generator is given
#[must_use]
pub fn epoch_batches(len: usize, batch_size: usize, rng: Option<&mut StdRng>) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..len).collect();
    if let Some(rng) = rng {
        order.shuffle(rng);
    }
    order
        .chunks(batch_size.max(1))
        .map(<[usize]>::to_vec)
        .collect()
}
