//! Projection weights with an optional LoRA adapter

use half::f16;
use ndarray::{CowArray, Ix2};

use super::error::{ModelError, Result};
use crate::lora::LoraLayer;
use crate::parameter::Parameter;
use crate::quant::Int8Weight;

/// Storage of a frozen or trainable base weight
#[derive(Debug, Clone)]
pub enum BaseWeight {
    Dense(Parameter),
    Int8 { name: String, weight: Int8Weight },
}

impl BaseWeight {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Dense(param) => param.name(),
            Self::Int8 { name, .. } => name,
        }
    }

    /// `[out, in]`
    #[must_use]
    pub fn shape(&self) -> [usize; 2] {
        match self {
            Self::Dense(param) => {
                let shape = param.shape();
                [shape[0], shape.get(1).copied().unwrap_or(1)]
            }
            Self::Int8 { weight, .. } => weight.shape(),
        }
    }

    /// The weight as an `f32` matrix, dequantizing when needed
    pub fn matrix(&self) -> Result<CowArray<'_, f32, Ix2>> {
        match self {
            Self::Dense(param) => Ok(CowArray::from(param.matrix()?)),
            Self::Int8 { weight, .. } => Ok(CowArray::from(weight.dequantize())),
        }
    }

    #[must_use]
    pub fn numel(&self) -> usize {
        let [rows, cols] = self.shape();
        rows * cols
    }
}

/// A 2-D weight of the checkpoint, addressed by its module path
///
/// Conv1D checkpoints (GPT-2) store weights as `[in, out]`; such a linear is
/// marked `fan_in_fan_out` and presents the `[out, in]` view for compute while
/// keeping the stored layout for export.
#[derive(Debug, Clone)]
pub struct Linear {
    module: String,
    base: BaseWeight,
    adapter: Option<LoraLayer>,
    fan_in_fan_out: bool,
}

impl Linear {
    pub fn new(module: impl Into<String>, weight: Parameter) -> Self {
        Self {
            module: module.into(),
            base: BaseWeight::Dense(weight),
            adapter: None,
            fan_in_fan_out: false,
        }
    }

    #[must_use]
    pub fn with_fan_in_fan_out(mut self, fan_in_fan_out: bool) -> Self {
        self.fan_in_fan_out = fan_in_fan_out;
        self
    }

    #[must_use]
    pub fn fan_in_fan_out(&self) -> bool {
        self.fan_in_fan_out
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn base(&self) -> &BaseWeight {
        &self.base
    }

    /// The dense base weight, `None` once quantized
    pub fn dense_mut(&mut self) -> Option<&mut Parameter> {
        match &mut self.base {
            BaseWeight::Dense(param) => Some(param),
            BaseWeight::Int8 { .. } => None,
        }
    }

    /// `[out, in]` regardless of the stored layout
    #[must_use]
    pub fn shape(&self) -> [usize; 2] {
        let [rows, cols] = self.base.shape();
        if self.fan_in_fan_out {
            [cols, rows]
        } else {
            [rows, cols]
        }
    }

    #[must_use]
    pub fn out_features(&self) -> usize {
        self.shape()[0]
    }

    #[must_use]
    pub fn in_features(&self) -> usize {
        self.shape()[1]
    }

    /// The `[out, in]` weight used by the forward pass
    pub fn weight(&self) -> Result<CowArray<'_, f32, Ix2>> {
        let matrix = self.base.matrix()?;
        Ok(if self.fan_in_fan_out {
            matrix.reversed_axes()
        } else {
            matrix
        })
    }

    /// Square projections take part in the residual stack
    #[must_use]
    pub fn is_square(&self, hidden: usize) -> bool {
        self.base.shape() == [hidden, hidden]
    }

    #[must_use]
    pub fn adapter(&self) -> Option<&LoraLayer> {
        self.adapter.as_ref()
    }

    pub fn adapter_mut(&mut self) -> Option<&mut LoraLayer> {
        self.adapter.as_mut()
    }

    pub fn attach(&mut self, adapter: LoraLayer) -> Result<()> {
        if adapter.d_in() != self.in_features() || adapter.d_out() != self.out_features() {
            return Err(ModelError::shape(
                &self.module,
                &self.shape(),
                &[adapter.d_out(), adapter.d_in()],
            ));
        }
        self.adapter = Some(adapter);
        Ok(())
    }

    /// Replace a dense base with its int8 form; returns whether it changed
    pub fn quantize_base(&mut self) -> Result<bool> {
        let BaseWeight::Dense(param) = &self.base else {
            return Ok(false);
        };
        let weight = Int8Weight::quantize(param.matrix()?);
        let name = param.name().to_string();
        self.base = BaseWeight::Int8 { name, weight };
        Ok(true)
    }

    /// Round a dense base through half precision
    pub fn round_to_f16(&mut self) {
        if let BaseWeight::Dense(param) = &mut self.base {
            param
                .value_mut()
                .mapv_inplace(|v| f16::from_f32(v).to_f32());
        }
    }
}
