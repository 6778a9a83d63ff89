//! Reading safetensors files into `f32` arrays

use std::collections::BTreeMap;
use std::path::Path;

use half::{bf16, f16};
use ndarray::{ArrayD, IxDyn};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use tracing::debug;

use super::error::{Result, TensorIoError};
use crate::hf_pipeline::{shard_files, WEIGHTS_FILE, WEIGHTS_INDEX_FILE};

/// Named tensors in name order
pub type TensorMap = BTreeMap<String, ArrayD<f32>>;

/// Whether `dtype` is a floating-point type this crate can widen to `f32`
#[must_use]
pub fn is_float(dtype: Dtype) -> bool {
    matches!(dtype, Dtype::F32 | Dtype::F16 | Dtype::BF16)
}

/// Decode one tensor view into an `f32` array
///
/// Buffers may be unaligned, so `f32` data is copied rather than cast in place.
pub fn decode_tensor(name: &str, view: &TensorView<'_>) -> Result<ArrayD<f32>> {
    let bytes = view.data();
    let data: Vec<f32> = match view.dtype() {
        Dtype::F32 => bytemuck::pod_collect_to_vec::<u8, f32>(bytes),
        Dtype::F16 => bytes
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        Dtype::BF16 => bytes
            .chunks_exact(2)
            .map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        other => {
            return Err(TensorIoError::UnsupportedDtype {
                name: name.to_string(),
                dtype: format!("{other:?}"),
            })
        }
    };
    ArrayD::from_shape_vec(IxDyn(view.shape()), data).map_err(|_| TensorIoError::Shape {
        name: name.to_string(),
        shape: view.shape().to_vec(),
    })
}

/// Read every floating-point tensor of one file; other dtypes are skipped
pub fn read_safetensors(path: &Path) -> Result<TensorMap> {
    let buffer = std::fs::read(path)?;
    let tensors = SafeTensors::deserialize(&buffer).map_err(|e| TensorIoError::SafeTensors {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut out = TensorMap::new();
    for (name, view) in tensors.tensors() {
        if !is_float(view.dtype()) {
            debug!(tensor = %name, dtype = ?view.dtype(), "skipping non-float tensor");
            continue;
        }
        let array = decode_tensor(&name, &view)?;
        out.insert(name, array);
    }
    Ok(out)
}

/// Read the weights of a model directory, single file or sharded
pub fn load_model_tensors(dir: &Path) -> Result<TensorMap> {
    let single = dir.join(WEIGHTS_FILE);
    if single.is_file() {
        return read_safetensors(&single);
    }

    let index = dir.join(WEIGHTS_INDEX_FILE);
    let shards = shard_files(&index).map_err(|e| TensorIoError::SafeTensors {
        path: index.clone(),
        message: e.to_string(),
    })?;
    let mut out = TensorMap::new();
    for shard in shards {
        out.extend(read_safetensors(&dir.join(shard))?);
    }
    Ok(out)
}
