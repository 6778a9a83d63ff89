//! 8-bit quantization of frozen projection weights
//!
//! Row-wise symmetric quantization: every output row of a `[out, in]`
//! weight gets its own scale `absmax / 127`.
//!
//! Quantization: q = round(clamp(x / scale, -127, 127))
//! Dequantization: x ≈ q * scale

use ndarray::{Array2, ArrayView2, Axis};
use tracing::info;

use crate::model::{BaseWeight, CausalLm};

/// Largest representable magnitude
pub const INT8_MAX: f32 = 127.0;

/// Int8 weight with one scale per row
#[derive(Clone, Debug, PartialEq)]
pub struct Int8Weight {
    /// Quantized values in row-major order
    pub data: Vec<i8>,
    /// Scale factors (one per row)
    pub scales: Vec<f32>,
    pub rows: usize,
    pub cols: usize,
}

impl Int8Weight {
    /// Quantize a `[rows, cols]` matrix
    #[must_use]
    pub fn quantize(weight: ArrayView2<'_, f32>) -> Self {
        let (rows, cols) = weight.dim();
        let mut data = Vec::with_capacity(rows * cols);
        let mut scales = Vec::with_capacity(rows);

        for row in weight.axis_iter(Axis(0)) {
            let absmax = row.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
            let scale = if absmax > 0.0 { absmax / INT8_MAX } else { 1.0 };
            scales.push(scale);
            data.extend(
                row.iter()
                    .map(|&v| (v / scale).round().clamp(-INT8_MAX, INT8_MAX) as i8),
            );
        }

        Self {
            data,
            scales,
            rows,
            cols,
        }
    }

    /// Reconstruct the `f32` matrix
    #[must_use]
    pub fn dequantize(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.rows, self.cols), |(i, j)| {
            f32::from(self.data[i * self.cols + j]) * self.scales[i]
        })
    }

    #[must_use]
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Storage for values plus scales
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.data.len() + self.scales.len() * 4
    }
}

/// What [`prepare_for_int8_training`] converted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int8Summary {
    pub quantized: usize,
    /// Size of the converted projections before quantization
    pub f32_bytes: usize,
    pub int8_bytes: usize,
}

impl Int8Summary {
    #[must_use]
    pub fn compression_ratio(&self) -> f32 {
        self.f32_bytes as f32 / self.int8_bytes.max(1) as f32
    }
}

/// Prepare a model for adapter training on an int8 base
///
/// Every dense projection becomes an [`Int8Weight`]; embeddings, the head
/// and norm layers stay in f32. All base weights are frozen.
pub fn prepare_for_int8_training(model: &mut CausalLm) -> crate::model::Result<Int8Summary> {
    let mut summary = Int8Summary::default();
    for linear in model.linears_mut() {
        if !linear.quantize_base()? {
            continue;
        }
        if let BaseWeight::Int8 { weight, .. } = linear.base() {
            summary.quantized += 1;
            summary.f32_bytes += weight.data.len() * 4;
            summary.int8_bytes += weight.memory_bytes();
        }
    }
    model.freeze_base();
    info!(
        quantized = summary.quantized,
        f32_bytes = summary.f32_bytes,
        int8_bytes = summary.int8_bytes,
        "prepared model for int8 training ({:.1}x smaller)",
        summary.compression_ratio()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(200))]

        #[test]
        fn prop_roundtrip_error_within_half_step(
            values in proptest::collection::vec(-10.0f32..10.0, 12),
        ) {
            let weight = Array2::from_shape_vec((3, 4), values).unwrap();
            let q = Int8Weight::quantize(weight.view());
            let restored = q.dequantize();
            for ((i, j), orig) in weight.indexed_iter() {
                prop_assert!((orig - restored[[i, j]]).abs() <= q.scales[i] * 0.5 + 1e-5);
            }
        }
    }

    #[test]
    fn test_row_absmax_is_exact() {
        let weight = arr2(&[[1.0f32, -0.5], [0.0, 0.0], [-4.0, 2.0]]);
        let q = Int8Weight::quantize(weight.view());
        assert_eq!(q.data[0], 127);
        assert_eq!(q.data[4], -127);
        assert_eq!(q.scales[1], 1.0);
        assert_eq!(q.dequantize()[[0, 0]], 1.0);
        assert_eq!(q.dequantize()[[1, 1]], 0.0);
        assert_eq!(q.shape(), [3, 2]);
    }

    #[test]
    fn test_memory_is_one_byte_per_value_plus_row_scales() {
        let weight = Array2::from_elem((64, 32), 0.5f32);
        let q = Int8Weight::quantize(weight.view());
        assert_eq!(q.memory_bytes(), 64 * 32 + 64 * 4);

        let summary = Int8Summary {
            quantized: 1,
            f32_bytes: 64 * 32 * 4,
            int8_bytes: q.memory_bytes(),
        };
        assert!(summary.compression_ratio() > 3.5);
    }
}
