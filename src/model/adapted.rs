//! LoRA fine-tuning: frozen base, trainable low-rank adapters

use std::path::Path;

use tracing::info;

use super::causal_lm::CausalLm;
use super::config::ModelConfig;
use super::error::Result;
use super::trainable::{Batch, ModelKind, ParameterCount, StepOutput, TrainableModel};
use crate::hf_pipeline::WEIGHTS_FILE;
use crate::io::{default_metadata, read_safetensors, save_safetensors, TensorMap};
use crate::lora::{
    lora_a_name, lora_b_name, load_peft_adapter, merge_adapter, save_peft_adapter, LoraConfig,
    MergeReport, PeftAdapterConfig,
};
use crate::parameter::Parameter;

#[derive(Debug, Clone)]
pub struct LoraModel {
    lm: CausalLm,
    lora: LoraConfig,
    base_model: Option<String>,
}

impl LoraModel {
    /// Wrap a model whose adapters are already injected
    #[must_use]
    pub fn new(lm: CausalLm, lora: LoraConfig, base_model: Option<String>) -> Self {
        Self {
            lm,
            lora,
            base_model,
        }
    }

    #[must_use]
    pub fn inner(&self) -> &CausalLm {
        &self.lm
    }

    #[must_use]
    pub fn lora_config(&self) -> &LoraConfig {
        &self.lora
    }

    #[must_use]
    pub fn peft_config(&self) -> PeftAdapterConfig {
        PeftAdapterConfig::from_lora_config(&self.lora, self.base_model.as_deref())
    }
}

impl TrainableModel for LoraModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Lora
    }

    fn config(&self) -> &ModelConfig {
        self.lm.config()
    }

    fn config_mut(&mut self) -> &mut ModelConfig {
        self.lm.config_mut()
    }

    fn trainable_parameters(&mut self) -> Vec<&mut Parameter> {
        self.lm.adapter_parameters_mut()
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
        save_peft_adapter(dir, &self.peft_config(), self.lm.adapters())?;
        Ok(())
    }

    fn save_checkpoint(&self, dir: &Path) -> Result<()> {
        let mut tensors = self.lm.base_tensors()?;
        tensors.extend(self.lm.adapter_tensors());
        save_safetensors(
            &dir.join(WEIGHTS_FILE),
            tensors.iter().map(|(name, value)| (name.as_str(), value)),
            default_metadata(),
        )?;
        Ok(())
    }

    fn load_checkpoint(&mut self, dir: &Path) -> Result<()> {
        let tensors = read_safetensors(&dir.join(WEIGHTS_FILE))?;
        self.lm.load_adapters(&tensors)?;
        Ok(())
    }

    fn save_adapter(&self, dir: &Path) -> Result<bool> {
        self.save(dir)?;
        Ok(true)
    }

    fn load_adapter(&mut self, dir: &Path) -> Result<bool> {
        let adapter = load_peft_adapter(dir)?;
        let mut tensors = TensorMap::new();
        for (module, (a, b)) in adapter.modules {
            tensors.insert(lora_a_name(&module), a);
            tensors.insert(lora_b_name(&module), b);
        }
        let loaded = self.lm.load_adapters(&tensors)?;
        info!(modules = loaded, dir = %dir.display(), "loaded adapter weights");
        Ok(true)
    }

    fn merge(&self, base_dir: &Path, target: &Path) -> Result<Option<MergeReport>> {
        Ok(Some(merge_adapter(base_dir, target, target)?))
    }
}
