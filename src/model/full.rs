//! Full fine-tuning: every weight is trained in f32

use std::path::Path;

use super::causal_lm::CausalLm;
use super::config::ModelConfig;
use super::error::Result;
use super::trainable::{Batch, ModelKind, ParameterCount, StepOutput, TrainableModel};
use crate::hf_pipeline::WEIGHTS_FILE;
use crate::io::{default_metadata, read_safetensors, save_safetensors};
use crate::lora::MergeReport;
use crate::parameter::Parameter;

#[derive(Debug, Clone)]
pub struct FullFineTune {
    lm: CausalLm,
}

impl FullFineTune {
    #[must_use]
    pub fn new(lm: CausalLm) -> Self {
        Self { lm }
    }

    #[must_use]
    pub fn inner(&self) -> &CausalLm {
        &self.lm
    }

    fn write_weights(&self, dir: &Path) -> Result<()> {
        let tensors = self.lm.base_tensors()?;
        save_safetensors(
            &dir.join(WEIGHTS_FILE),
            tensors.iter().map(|(name, value)| (name.as_str(), value)),
            default_metadata(),
        )?;
        Ok(())
    }
}

impl TrainableModel for FullFineTune {
    fn kind(&self) -> ModelKind {
        ModelKind::FullFineTune
    }

    fn config(&self) -> &ModelConfig {
        self.lm.config()
    }

    fn config_mut(&mut self) -> &mut ModelConfig {
        self.lm.config_mut()
    }

    fn trainable_parameters(&mut self) -> Vec<&mut Parameter> {
        self.lm
            .base_parameters_mut()
            .into_iter()
            .filter(|p| p.requires_grad())
            .collect()
    }

    fn num_parameters(&self) -> ParameterCount {
        self.lm.parameter_count()
    }

    fn forward_backward(&mut self, batch: &Batch, grad_scale: f32) -> Result<StepOutput> {
        self.lm.forward_backward(batch, grad_scale)
    }

    fn eval_loss(&mut self, batch: &Batch) -> Result<StepOutput> {
        self.lm.eval_loss(batch)
    }

    fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        self.lm.config().save(dir)?;
        self.write_weights(dir)
    }

    fn save_checkpoint(&self, dir: &Path) -> Result<()> {
        self.save(dir)
    }

    fn load_checkpoint(&mut self, dir: &Path) -> Result<()> {
        let tensors = read_safetensors(&dir.join(WEIGHTS_FILE))?;
        self.lm.load_base(&tensors)?;
        Ok(())
    }

    fn save_adapter(&self, _dir: &Path) -> Result<bool> {
        Ok(false)
    }

    fn load_adapter(&mut self, _dir: &Path) -> Result<bool> {
        Ok(false)
    }

    fn merge(&self, _base_dir: &Path, _target: &Path) -> Result<Option<MergeReport>> {
        Ok(None)
    }
}
