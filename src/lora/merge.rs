//! Folding a trained adapter back into full-precision base weights

use std::path::{Path, PathBuf};

use ndarray::{ArrayD, Ix2};
use tracing::info;

use super::error::{AdapterError, Result};
use super::peft::{load_peft_adapter, ADAPTER_CONFIG_FILE, ADAPTER_WEIGHTS_FILE};
use crate::hf_pipeline::{WEIGHTS_FILE, WEIGHTS_INDEX_FILE};
use crate::io::{default_metadata, load_model_tensors, save_safetensors};
use crate::model::{resize_token_embeddings, ModelConfig};
use crate::tokenizer::{HfTokenizer, TOKENIZER_FILE};

/// Outcome of [`merge_adapter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Number of weights that received an update
    pub merged_modules: usize,
    /// Vocabulary size of the written model
    pub vocab_size: usize,
    /// Directory holding the merged model
    pub output: PathBuf,
}

fn as_matrix<'a>(name: &str, value: &'a ArrayD<f32>) -> Result<ndarray::ArrayView2<'a, f32>> {
    value
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| AdapterError::DimensionMismatch {
            name: name.to_string(),
            expected: vec![0, 0],
            actual: value.shape().to_vec(),
        })
}

/// `base += scale · B·A`
///
/// `a` is `[r, in]` and `b` is `[out, r]`. `base` is `[out, in]`, or
/// `[in, out]` with `fan_in_fan_out`, in which case the update is transposed.
pub fn merge_weights(
    name: &str,
    base: &mut ArrayD<f32>,
    a: &ArrayD<f32>,
    b: &ArrayD<f32>,
    scale: f32,
    fan_in_fan_out: bool,
) -> Result<()> {
    let a = as_matrix(name, a)?;
    let b = as_matrix(name, b)?;
    let expected = if fan_in_fan_out {
        vec![a.ncols(), b.nrows()]
    } else {
        vec![b.nrows(), a.ncols()]
    };
    if base.shape() != expected.as_slice() || a.nrows() != b.ncols() {
        return Err(AdapterError::DimensionMismatch {
            name: name.to_string(),
            expected,
            actual: base.shape().to_vec(),
        });
    }
    let delta = b.dot(&a) * scale;
    let delta = if fan_in_fan_out { delta.reversed_axes() } else { delta };
    *base += &delta.into_dyn();
    Ok(())
}

/// Merge the adapter in `adapter` into the base model and write the result
/// to `target`
///
/// The base weights are reloaded from `base_model` in full precision. When
/// `target` already holds a tokenizer, the vocabulary is resized to it first.
/// Adapter-only files are removed from `target` afterwards.
pub fn merge_adapter(base_model: &Path, target: &Path, adapter: &Path) -> Result<MergeReport> {
    info!(base = %base_model.display(), "loading base model in full precision");
    let mut tensors = load_model_tensors(base_model)?;
    let mut config =
        ModelConfig::load(base_model).map_err(|e| AdapterError::BaseModel(e.to_string()))?;

    if target.join(TOKENIZER_FILE).exists() {
        let tokenizer =
            HfTokenizer::from_dir(target).map_err(|e| AdapterError::BaseModel(e.to_string()))?;
        resize_token_embeddings(&mut tensors, &mut config, tokenizer.len())
            .map_err(|e| AdapterError::BaseModel(e.to_string()))?;
    }

    let peft = load_peft_adapter(adapter)?;
    let scale = peft.config.scale();
    for (module, (a, b)) in &peft.modules {
        let name = format!("{module}.weight");
        let base = tensors
            .get_mut(&name)
            .ok_or_else(|| AdapterError::MissingTensor(name.clone()))?;
        merge_weights(&name, base, a, b, scale, peft.config.fan_in_fan_out)?;
    }

    std::fs::create_dir_all(target)?;
    save_safetensors(
        &target.join(WEIGHTS_FILE),
        tensors.iter().map(|(name, value)| (name.as_str(), value)),
        default_metadata(),
    )?;
    let stale_index = target.join(WEIGHTS_INDEX_FILE);
    if stale_index.exists() {
        std::fs::remove_file(stale_index)?;
    }
    config
        .save(target)
        .map_err(|e| AdapterError::BaseModel(e.to_string()))?;

    for file in [ADAPTER_CONFIG_FILE, ADAPTER_WEIGHTS_FILE] {
        let path = target.join(file);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
    }

    let report = MergeReport {
        merged_modules: peft.modules.len(),
        vocab_size: config.vocab_size().unwrap_or(0),
        output: target.to_path_buf(),
    };
    info!(
        modules = report.merged_modules,
        output = %target.display(),
        "merged adapter into base weights"
    );
    Ok(report)
}
