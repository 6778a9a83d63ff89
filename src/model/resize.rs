//! Vocabulary resizing of embedding and head matrices

use ndarray::{s, Array1, Array2, ArrayView2, Axis, Ix2};
use tracing::info;

use super::config::ModelConfig;
use super::error::{ModelError, Result};
use super::names::{find_embedding, find_head};
use crate::io::TensorMap;

/// Grow or shrink a `[rows, dim]` matrix to `rows`
///
/// Added rows are the mean of the existing rows; shrinking truncates.
#[must_use]
pub fn resize_rows(matrix: ArrayView2<'_, f32>, rows: usize) -> Array2<f32> {
    let (current, dim) = matrix.dim();
    if rows <= current {
        return matrix.slice(s![..rows, ..]).to_owned();
    }
    let mean = matrix
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(dim));
    let mut resized = Array2::zeros((rows, dim));
    resized.slice_mut(s![..current, ..]).assign(&matrix);
    for mut row in resized.slice_mut(s![current.., ..]).rows_mut() {
        row.assign(&mean);
    }
    resized
}

fn resize_tensor(tensors: &mut TensorMap, name: &str, rows: usize) -> Result<()> {
    let value = tensors
        .get(name)
        .ok_or_else(|| ModelError::MissingWeight(name.to_string()))?;
    let matrix = value.view().into_dimensionality::<Ix2>().map_err(|_| {
        ModelError::Config(format!("{name} must be 2-D, got shape {:?}", value.shape()))
    })?;
    let resized = resize_rows(matrix, rows).into_dyn();
    tensors.insert(name.to_string(), resized);
    Ok(())
}

/// Resize the token embedding (and an untied head) to `vocab_size` rows
///
/// Returns whether anything changed. `config.json`'s `vocab_size` is
/// updated to match.
pub fn resize_token_embeddings(
    tensors: &mut TensorMap,
    config: &mut ModelConfig,
    vocab_size: usize,
) -> Result<bool> {
    let embedding = find_embedding(tensors)
        .ok_or_else(|| ModelError::MissingWeight("token embedding".to_string()))?;
    let current = tensors
        .get(&embedding)
        .and_then(|t| t.shape().first().copied())
        .unwrap_or(0);
    if current == vocab_size {
        config.set_vocab_size(vocab_size);
        return Ok(false);
    }

    info!(from = current, to = vocab_size, "resizing token embeddings");
    resize_tensor(tensors, &embedding, vocab_size)?;
    if let Some(head) = find_head(tensors) {
        resize_tensor(tensors, &head, vocab_size)?;
    }
    config.set_vocab_size(vocab_size);
    Ok(true)
}
