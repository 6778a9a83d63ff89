//! LoRA hyperparameters

use crate::config::TrainingParams;

/// Low-rank adapter settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoraConfig {
    /// Rank of the update
    pub r: usize,
    /// Scaling numerator; the update is multiplied by `alpha / r`
    pub alpha: f32,
    /// Dropout applied to the adapter input during training
    pub dropout: f32,
    /// Module name suffixes to adapt
    pub target_modules: Vec<String>,
    /// Base weights are stored `[in, out]`
    pub fan_in_fan_out: bool,
}

impl LoraConfig {
    pub const BIAS: &'static str = "none";
    pub const TASK_TYPE: &'static str = "CAUSAL_LM";

    #[must_use]
    pub fn new(r: usize, alpha: f32) -> Self {
        Self {
            r,
            alpha,
            dropout: 0.0,
            target_modules: Vec::new(),
            fan_in_fan_out: false,
        }
    }

    /// Adapter settings of a run, with already resolved target modules
    #[must_use]
    pub fn from_params(params: &TrainingParams, target_modules: Vec<String>) -> Self {
        Self {
            r: params.lora_r,
            alpha: params.lora_alpha as f32,
            dropout: params.lora_dropout as f32,
            target_modules,
            fan_in_fan_out: false,
        }
    }

    #[must_use]
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    #[must_use]
    pub fn with_targets<S: Into<String>>(mut self, targets: impl IntoIterator<Item = S>) -> Self {
        self.target_modules = targets.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_fan_in_fan_out(mut self, fan_in_fan_out: bool) -> Self {
        self.fan_in_fan_out = fan_in_fan_out;
        self
    }

    /// `alpha / r`
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.alpha / self.r as f32
    }

    /// Whether a full module path (e.g. `model.layers.0.self_attn.q_proj`)
    /// is targeted: exact match or a `.`-separated suffix match
    #[must_use]
    pub fn is_target(&self, module: &str) -> bool {
        self.target_modules.iter().any(|target| {
            module == target
                || module
                    .strip_suffix(target.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
