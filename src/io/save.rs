//! Writing `f32` arrays as safetensors

use std::collections::HashMap;
use std::path::Path;

use ndarray::ArrayD;
use safetensors::tensor::{Dtype, TensorView};

use super::error::{Result, TensorIoError};

/// Serialize named tensors to a safetensors file
///
/// `metadata` lands in the file header's `__metadata__` section.
pub fn save_safetensors<'a, I>(path: &Path, tensors: I, metadata: HashMap<String, String>) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a ArrayD<f32>)>,
{
    let tensor_data: Vec<(&str, Vec<u8>, Vec<usize>)> = tensors
        .into_iter()
        .map(|(name, array)| {
            // Logical order, so transposed views are written as they read
            let values: Vec<f32> = array.iter().copied().collect();
            let bytes = bytemuck::cast_slice::<f32, u8>(&values).to_vec();
            (name, bytes, array.shape().to_vec())
        })
        .collect();

    let views = tensor_data
        .iter()
        .map(|(name, bytes, shape)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (*name, view))
                .map_err(|e| TensorIoError::SafeTensors {
                    path: path.to_path_buf(),
                    message: format!("{name}: {e}"),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let bytes = safetensors::serialize(views, Some(metadata)).map_err(|e| {
        TensorIoError::SafeTensors {
            path: path.to_path_buf(),
            message: format!("serialization failed: {e}"),
        }
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Header metadata written with every file
#[must_use]
pub fn default_metadata() -> HashMap<String, String> {
    HashMap::from([("format".to_string(), "pt".to_string())])
}
