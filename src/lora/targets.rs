//! Default LoRA target projections per model family

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::{AdapterError, Result};

/// Model architectures with a known set of adapter targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Llama,
    Mistral,
    Qwen2,
    Gemma,
    CodeGen,
    Falcon,
    GptNeox,
    Gpt2,
    GptBigCode,
    Phi,
    Opt,
    Bloom,
}

impl ModelFamily {
    pub const ALL: [Self; 12] = [
        Self::Llama,
        Self::Mistral,
        Self::Qwen2,
        Self::Gemma,
        Self::CodeGen,
        Self::Falcon,
        Self::GptNeox,
        Self::Gpt2,
        Self::GptBigCode,
        Self::Phi,
        Self::Opt,
        Self::Bloom,
    ];

    /// Map a `config.json` `model_type` to a family
    ///
    /// Matching is case-insensitive and treats `-` like `_`.
    pub fn from_model_type(model_type: &str) -> Result<Self> {
        let normalized = model_type.trim().to_ascii_lowercase().replace('-', "_");
        let family = match normalized.as_str() {
            "llama" => Self::Llama,
            "mistral" => Self::Mistral,
            "qwen2" => Self::Qwen2,
            "gemma" => Self::Gemma,
            "codegen" | "codegen25" => Self::CodeGen,
            "falcon" | "refinedweb" | "refinedwebmodel" => Self::Falcon,
            "gpt_neox" => Self::GptNeox,
            "gpt2" => Self::Gpt2,
            "gpt_bigcode" => Self::GptBigCode,
            "phi" => Self::Phi,
            "opt" => Self::Opt,
            "bloom" => Self::Bloom,
            _ => return Err(AdapterError::UnknownModelFamily(model_type.to_string())),
        };
        Ok(family)
    }

    /// Whether the family stores projections as Conv1D `[in, out]` weights
    ///
    /// GPT-BigCode shares GPT-2's module names but uses plain linears.
    #[must_use]
    pub fn fan_in_fan_out(self) -> bool {
        matches!(self, Self::Gpt2)
    }

    fn default_targets(self) -> &'static [&'static str] {
        match self {
            Self::Llama | Self::Mistral | Self::Qwen2 | Self::Gemma => &[
                "q_proj",
                "k_proj",
                "v_proj",
                "o_proj",
                "gate_proj",
                "up_proj",
                "down_proj",
            ],
            Self::CodeGen => &[
                "q_proj",
                "k_proj",
                "v_proj",
                "o_proj",
                "down_proj",
                "up_proj",
                "gate_proj",
            ],
            Self::Falcon => &[
                "query_key_value",
                "dense",
                "dense_h_to_4h",
                "dense_4h_to_h",
            ],
            Self::GptNeox => &["query_key_value", "dense"],
            Self::Gpt2 | Self::GptBigCode => &["c_attn", "c_proj"],
            Self::Phi => &["q_proj", "k_proj", "v_proj", "dense"],
            Self::Opt => &["q_proj", "k_proj", "v_proj", "out_proj"],
            Self::Bloom => &["query_key_value"],
        }
    }
}

impl FromStr for ModelFamily {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_model_type(s)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Llama => "llama",
            Self::Mistral => "mistral",
            Self::Qwen2 => "qwen2",
            Self::Gemma => "gemma",
            Self::CodeGen => "codegen",
            Self::Falcon => "falcon",
            Self::GptNeox => "gpt_neox",
            Self::Gpt2 => "gpt2",
            Self::GptBigCode => "gpt_bigcode",
            Self::Phi => "phi",
            Self::Opt => "opt",
            Self::Bloom => "bloom",
        };
        f.write_str(name)
    }
}

/// Lookup table from model family to projection names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetModuleTable {
    entries: HashMap<ModelFamily, Vec<String>>,
}

impl Default for TargetModuleTable {
    fn default() -> Self {
        let entries = ModelFamily::ALL
            .iter()
            .map(|&family| {
                let targets = family
                    .default_targets()
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect();
                (family, targets)
            })
            .collect();
        Self { entries }
    }
}

impl TargetModuleTable {
    /// Table without entries
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace the targets of a family
    #[must_use]
    pub fn with_entry<S: Into<String>>(
        mut self,
        family: ModelFamily,
        targets: impl IntoIterator<Item = S>,
    ) -> Self {
        self.entries
            .insert(family, targets.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn get(&self, family: ModelFamily) -> Option<&[String]> {
        self.entries.get(&family).map(Vec::as_slice)
    }

    /// Target modules for a model
    ///
    /// An explicit list wins over the table; otherwise the family of
    /// `model_type` must be known and present.
    pub fn resolve(&self, model_type: Option<&str>, explicit: Option<Vec<String>>) -> Result<Vec<String>> {
        if let Some(targets) = explicit {
            return Ok(targets);
        }
        let model_type = model_type.unwrap_or("<missing model_type>");
        let family = ModelFamily::from_model_type(model_type)?;
        self.get(family)
            .map(<[String]>::to_vec)
            .ok_or_else(|| AdapterError::UnknownModelFamily(model_type.to_string()))
    }
}
