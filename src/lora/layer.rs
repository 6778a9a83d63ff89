//! LoRA layer: a trainable low-rank update beside a frozen weight
//!
//! For a frozen weight W ∈ ℝ^(d_out × d_in) the layer holds
//! A ∈ ℝ^(r × d_in) and B ∈ ℝ^(d_out × r); the effective weight is
//! W + (α/r)·B·A.

use ndarray::{Array2, ArrayD, IxDyn};
use rand::Rng;

use super::config::LoraConfig;
use super::error::{AdapterError, Result};
use crate::parameter::Parameter;

#[derive(Debug, Clone)]
pub struct LoraLayer {
    module: String,
    a: Parameter,
    b: Parameter,
    scale: f32,
    dropout: f32,
}

/// Parameter name of the down projection
#[must_use]
pub fn lora_a_name(module: &str) -> String {
    format!("{module}.lora_A.weight")
}

/// Parameter name of the up projection
#[must_use]
pub fn lora_b_name(module: &str) -> String {
    format!("{module}.lora_B.weight")
}

impl LoraLayer {
    /// Fresh adapter: A is Kaiming-uniform, B is zero, so the update starts at zero
    pub fn new<R: Rng>(module: &str, d_in: usize, d_out: usize, config: &LoraConfig, rng: &mut R) -> Self {
        let bound = 1.0 / (d_in.max(1) as f32).sqrt();
        let a = ArrayD::from_shape_fn(IxDyn(&[config.r, d_in]), |_| rng.gen_range(-bound..bound));
        Self {
            module: module.to_string(),
            a: Parameter::new(lora_a_name(module), a, true),
            b: Parameter::zeros(lora_b_name(module), &[d_out, config.r], true),
            scale: config.scale(),
            dropout: config.dropout,
        }
    }

    /// Adapter from stored matrices
    pub fn from_weights(
        module: &str,
        a: ArrayD<f32>,
        b: ArrayD<f32>,
        scale: f32,
        dropout: f32,
    ) -> Result<Self> {
        if a.ndim() != 2 || b.ndim() != 2 || a.shape()[0] != b.shape()[1] {
            return Err(AdapterError::DimensionMismatch {
                name: module.to_string(),
                expected: vec![b.shape().get(1).copied().unwrap_or(0)],
                actual: a.shape().to_vec(),
            });
        }
        Ok(Self {
            module: module.to_string(),
            a: Parameter::new(lora_a_name(module), a, true),
            b: Parameter::new(lora_b_name(module), b, true),
            scale,
            dropout,
        })
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.a.shape()[0]
    }

    #[must_use]
    pub fn d_in(&self) -> usize {
        self.a.shape()[1]
    }

    #[must_use]
    pub fn d_out(&self) -> usize {
        self.b.shape()[0]
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn dropout(&self) -> f32 {
        self.dropout
    }

    #[must_use]
    pub fn a(&self) -> &Parameter {
        &self.a
    }

    #[must_use]
    pub fn b(&self) -> &Parameter {
        &self.b
    }

    pub fn a_mut(&mut self) -> &mut Parameter {
        &mut self.a
    }

    pub fn b_mut(&mut self) -> &mut Parameter {
        &mut self.b
    }

    /// A and B, in that order
    pub fn params_mut(&mut self) -> [&mut Parameter; 2] {
        [&mut self.a, &mut self.b]
    }

    /// Replace A and B, checking shapes
    pub fn load(&mut self, a: ArrayD<f32>, b: ArrayD<f32>) -> Result<()> {
        for (param, value) in [(&mut self.a, a), (&mut self.b, b)] {
            if param.shape() != value.shape() {
                return Err(AdapterError::DimensionMismatch {
                    name: param.name().to_string(),
                    expected: param.shape().to_vec(),
                    actual: value.shape().to_vec(),
                });
            }
            param.set_value(value);
        }
        Ok(())
    }

    /// The weight update `scale · B·A`, shaped like the frozen weight
    pub fn delta(&self) -> Result<Array2<f32>> {
        let a = self.a.matrix().map_err(|e| AdapterError::PeftFormat(e.to_string()))?;
        let b = self.b.matrix().map_err(|e| AdapterError::PeftFormat(e.to_string()))?;
        Ok(b.dot(&a) * self.scale)
    }
}
