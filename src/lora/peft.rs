//! PEFT-compatible adapter files
//!
//! `adapter_config.json` follows the Hugging Face PEFT schema and
//! `adapter_model.safetensors` stores `base_model.model.{module}.lora_A.weight`
//! ([r, in]) and `...lora_B.weight` ([out, r]) for every adapted module.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use super::config::LoraConfig;
use super::error::{AdapterError, Result};
use super::layer::LoraLayer;
use crate::io::{default_metadata, read_safetensors, save_safetensors};

pub const ADAPTER_CONFIG_FILE: &str = "adapter_config.json";
pub const ADAPTER_WEIGHTS_FILE: &str = "adapter_model.safetensors";

const PEFT_PREFIX: &str = "base_model.model.";
const LORA_A_SUFFIX: &str = ".lora_A.weight";
const LORA_B_SUFFIX: &str = ".lora_B.weight";

/// PEFT adapter configuration matching the Hugging Face PEFT schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeftAdapterConfig {
    /// Always "LORA"
    pub peft_type: String,
    pub r: usize,
    pub lora_alpha: f32,
    /// Sorted target module names
    pub target_modules: Vec<String>,
    #[serde(default)]
    pub lora_dropout: f32,
    /// "none", "all" or "lora_only"
    pub bias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_model_name_or_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub fan_in_fan_out: bool,
    #[serde(default)]
    pub inference_mode: bool,
}

impl PeftAdapterConfig {
    /// Causal-LM adapter config for the given LoRA settings
    #[must_use]
    pub fn from_lora_config(config: &LoraConfig, base_model: Option<&str>) -> Self {
        let mut target_modules = config.target_modules.clone();
        target_modules.sort();
        target_modules.dedup();

        Self {
            peft_type: "LORA".to_string(),
            r: config.r,
            lora_alpha: config.alpha,
            target_modules,
            lora_dropout: config.dropout,
            bias: LoraConfig::BIAS.to_string(),
            base_model_name_or_path: base_model.map(String::from),
            task_type: Some(LoraConfig::TASK_TYPE.to_string()),
            fan_in_fan_out: config.fan_in_fan_out,
            inference_mode: false,
        }
    }

    #[must_use]
    pub fn with_inference_mode(mut self, inference_mode: bool) -> Self {
        self.inference_mode = inference_mode;
        self
    }

    /// `lora_alpha / r`
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.lora_alpha / self.r.max(1) as f32
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Adapter read back from disk: config plus `(A, B)` per module
#[derive(Debug, Clone)]
pub struct PeftAdapter {
    pub config: PeftAdapterConfig,
    pub modules: BTreeMap<String, (ArrayD<f32>, ArrayD<f32>)>,
}

impl PeftAdapter {
    /// Rebuild LoRA layers with the stored scale and dropout
    pub fn layers(&self) -> Result<Vec<LoraLayer>> {
        self.modules
            .iter()
            .map(|(module, (a, b))| {
                LoraLayer::from_weights(
                    module,
                    a.clone(),
                    b.clone(),
                    self.config.scale(),
                    self.config.lora_dropout,
                )
            })
            .collect()
    }
}

/// Write `adapter_config.json` and `adapter_model.safetensors` into `dir`
pub fn save_peft_adapter<'a>(
    dir: &Path,
    config: &PeftAdapterConfig,
    layers: impl IntoIterator<Item = &'a LoraLayer>,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(ADAPTER_CONFIG_FILE), config.to_json()?)?;

    let mut tensors: Vec<(String, &ArrayD<f32>)> = Vec::new();
    for layer in layers {
        tensors.push((
            format!("{PEFT_PREFIX}{}{LORA_A_SUFFIX}", layer.module()),
            layer.a().value(),
        ));
        tensors.push((
            format!("{PEFT_PREFIX}{}{LORA_B_SUFFIX}", layer.module()),
            layer.b().value(),
        ));
    }
    save_safetensors(
        &dir.join(ADAPTER_WEIGHTS_FILE),
        tensors.iter().map(|(name, value)| (name.as_str(), *value)),
        default_metadata(),
    )?;
    Ok(())
}

/// Read an adapter written by [`save_peft_adapter`] (or by PEFT itself)
pub fn load_peft_adapter(dir: &Path) -> Result<PeftAdapter> {
    let config_json = std::fs::read_to_string(dir.join(ADAPTER_CONFIG_FILE))?;
    let config = PeftAdapterConfig::from_json(&config_json)?;
    let tensors = read_safetensors(&dir.join(ADAPTER_WEIGHTS_FILE))?;

    let mut a_parts = BTreeMap::new();
    let mut b_parts = BTreeMap::new();
    for (name, value) in tensors {
        let bare = name.strip_prefix(PEFT_PREFIX).unwrap_or(&name);
        if let Some(module) = bare.strip_suffix(LORA_A_SUFFIX) {
            a_parts.insert(module.to_string(), value);
        } else if let Some(module) = bare.strip_suffix(LORA_B_SUFFIX) {
            b_parts.insert(module.to_string(), value);
        } else {
            return Err(AdapterError::PeftFormat(format!(
                "unexpected tensor '{name}' in {ADAPTER_WEIGHTS_FILE}"
            )));
        }
    }

    let mut modules = BTreeMap::new();
    for (module, a) in a_parts {
        let b = b_parts
            .remove(&module)
            .ok_or_else(|| AdapterError::MissingTensor(format!("{module}{LORA_B_SUFFIX}")))?;
        modules.insert(module, (a, b));
    }
    if let Some(module) = b_parts.into_keys().next() {
        return Err(AdapterError::MissingTensor(format!("{module}{LORA_A_SUFFIX}")));
    }

    Ok(PeftAdapter { config, modules })
}
