//! Training parameter schema
//!
//! `TrainingParams` is the flat, typed record every pipeline stage reads
//! from. Field names match the keys accepted in YAML/JSON job configs.

use serde::{Deserialize, Serialize};

use super::lenient;

/// Value of `block_size` and `logging_steps` meaning "derive it for me"
pub const UNSET: i64 = -1;

/// Every key accepted in a training config
pub const FIELD_NAMES: &[&str] = &[
    "model_name",
    "data_path",
    "project_name",
    "train_split",
    "valid_split",
    "text_column",
    "huggingface_token",
    "learning_rate",
    "num_train_epochs",
    "train_batch_size",
    "eval_batch_size",
    "warmup_ratio",
    "gradient_accumulation_steps",
    "optimizer",
    "scheduler",
    "weight_decay",
    "max_grad_norm",
    "seed",
    "add_eos_token",
    "block_size",
    "model_max_length",
    "use_peft",
    "lora_r",
    "lora_alpha",
    "lora_dropout",
    "target_modules",
    "logging_steps",
    "evaluation_strategy",
    "save_total_limit",
    "save_strategy",
    "auto_find_batch_size",
    "fp16",
    "push_to_hub",
    "use_int8",
    "repo_id",
];

/// Keys without a default
pub const REQUIRED_FIELDS: &[&str] = &["model_name", "data_path"];

/// Parameters for one causal-LM fine-tuning job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingParams {
    /// Hub model id or local model directory
    #[serde(deserialize_with = "lenient::string")]
    pub model_name: String,

    /// Hub dataset id or local dataset directory
    #[serde(deserialize_with = "lenient::string")]
    pub data_path: String,

    /// Output directory for checkpoints and the final artifact
    #[serde(default = "default_project_name", deserialize_with = "lenient::string")]
    pub project_name: String,

    #[serde(default = "default_train_split", deserialize_with = "lenient::string")]
    pub train_split: String,

    /// Optional validation split; `None` disables evaluation
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub valid_split: Option<String>,

    #[serde(default = "default_text_column", deserialize_with = "lenient::string")]
    pub text_column: String,

    /// Bearer token for the Hub
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing)]
    pub huggingface_token: Option<String>,

    #[serde(default = "default_learning_rate", deserialize_with = "lenient::f64_")]
    pub learning_rate: f64,

    #[serde(default = "default_epochs", deserialize_with = "lenient::usize_")]
    pub num_train_epochs: usize,

    #[serde(default = "default_train_batch_size", deserialize_with = "lenient::usize_")]
    pub train_batch_size: usize,

    #[serde(default = "default_eval_batch_size", deserialize_with = "lenient::usize_")]
    pub eval_batch_size: usize,

    #[serde(default = "default_warmup_ratio", deserialize_with = "lenient::f64_")]
    pub warmup_ratio: f64,

    #[serde(default = "default_one", deserialize_with = "lenient::usize_")]
    pub gradient_accumulation_steps: usize,

    /// Optimizer name (`adamw_torch`, `adamw_hf`, `sgd`, ...)
    #[serde(default = "default_optimizer", deserialize_with = "lenient::string")]
    pub optimizer: String,

    /// Learning-rate schedule name (`linear`, `cosine`, ...)
    #[serde(default = "default_scheduler", deserialize_with = "lenient::string")]
    pub scheduler: String,

    #[serde(default, deserialize_with = "lenient::f64_")]
    pub weight_decay: f64,

    #[serde(default = "default_max_grad_norm", deserialize_with = "lenient::f64_")]
    pub max_grad_norm: f64,

    #[serde(default = "default_seed", deserialize_with = "lenient::usize_")]
    pub seed: usize,

    /// Append the tokenizer's EOS token to every text record
    #[serde(default = "default_true", deserialize_with = "lenient::bool_")]
    pub add_eos_token: bool,

    /// Requested block size, or [`UNSET`]
    #[serde(default = "default_unset", deserialize_with = "lenient::i64_")]
    pub block_size: i64,

    /// Replacement for tokenizers reporting a limit above 2048
    #[serde(default = "default_model_max_length", deserialize_with = "lenient::usize_")]
    pub model_max_length: usize,

    #[serde(default, deserialize_with = "lenient::bool_")]
    pub use_peft: bool,

    #[serde(default = "default_lora_r", deserialize_with = "lenient::usize_")]
    pub lora_r: usize,

    #[serde(default = "default_lora_alpha", deserialize_with = "lenient::f64_")]
    pub lora_alpha: f64,

    #[serde(default = "default_lora_dropout", deserialize_with = "lenient::f64_")]
    pub lora_dropout: f64,

    /// Comma-separated projection names overriding the family table
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub target_modules: Option<String>,

    /// Logging interval in steps, or [`UNSET`]
    #[serde(default = "default_unset", deserialize_with = "lenient::i64_")]
    pub logging_steps: i64,

    #[serde(default = "default_strategy", deserialize_with = "lenient::string")]
    pub evaluation_strategy: String,

    #[serde(default = "default_one", deserialize_with = "lenient::usize_")]
    pub save_total_limit: usize,

    #[serde(default = "default_strategy", deserialize_with = "lenient::string")]
    pub save_strategy: String,

    #[serde(default, deserialize_with = "lenient::bool_")]
    pub auto_find_batch_size: bool,

    #[serde(default, deserialize_with = "lenient::bool_")]
    pub fp16: bool,

    #[serde(default, deserialize_with = "lenient::bool_")]
    pub push_to_hub: bool,

    #[serde(default, deserialize_with = "lenient::bool_")]
    pub use_int8: bool,

    /// Destination repository when `push_to_hub` is set
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub repo_id: Option<String>,
}

fn default_project_name() -> String {
    "project-name".to_string()
}

fn default_train_split() -> String {
    "train".to_string()
}

fn default_text_column() -> String {
    "text".to_string()
}

fn default_learning_rate() -> f64 {
    3e-5
}

fn default_epochs() -> usize {
    1
}

fn default_train_batch_size() -> usize {
    2
}

fn default_eval_batch_size() -> usize {
    4
}

fn default_warmup_ratio() -> f64 {
    0.1
}

fn default_one() -> usize {
    1
}

fn default_optimizer() -> String {
    "adamw_torch".to_string()
}

fn default_scheduler() -> String {
    "linear".to_string()
}

fn default_max_grad_norm() -> f64 {
    1.0
}

fn default_seed() -> usize {
    42
}

fn default_true() -> bool {
    true
}

fn default_unset() -> i64 {
    UNSET
}

fn default_model_max_length() -> usize {
    1024
}

fn default_lora_r() -> usize {
    16
}

fn default_lora_alpha() -> f64 {
    32.0
}

fn default_lora_dropout() -> f64 {
    0.05
}

fn default_strategy() -> String {
    "epoch".to_string()
}

impl TrainingParams {
    /// Parameters with every optional field at its default
    #[must_use]
    pub fn new(model_name: impl Into<String>, data_path: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            data_path: data_path.into(),
            project_name: default_project_name(),
            train_split: default_train_split(),
            valid_split: None,
            text_column: default_text_column(),
            huggingface_token: None,
            learning_rate: default_learning_rate(),
            num_train_epochs: default_epochs(),
            train_batch_size: default_train_batch_size(),
            eval_batch_size: default_eval_batch_size(),
            warmup_ratio: default_warmup_ratio(),
            gradient_accumulation_steps: default_one(),
            optimizer: default_optimizer(),
            scheduler: default_scheduler(),
            weight_decay: 0.0,
            max_grad_norm: default_max_grad_norm(),
            seed: default_seed(),
            add_eos_token: true,
            block_size: UNSET,
            model_max_length: default_model_max_length(),
            use_peft: false,
            lora_r: default_lora_r(),
            lora_alpha: default_lora_alpha(),
            lora_dropout: default_lora_dropout(),
            target_modules: None,
            logging_steps: UNSET,
            evaluation_strategy: default_strategy(),
            save_total_limit: default_one(),
            save_strategy: default_strategy(),
            auto_find_batch_size: false,
            fp16: false,
            push_to_hub: false,
            use_int8: false,
            repo_id: None,
        }
    }

    /// Set the output directory
    #[must_use]
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    /// Set the validation split
    #[must_use]
    pub fn with_valid_split(mut self, split: impl Into<String>) -> Self {
        self.valid_split = Some(split.into());
        self
    }

    /// Enable LoRA adapters with the given rank and alpha
    #[must_use]
    pub fn with_lora(mut self, r: usize, alpha: f64) -> Self {
        self.use_peft = true;
        self.lora_r = r;
        self.lora_alpha = alpha;
        self
    }

    /// Request a block size
    #[must_use]
    pub fn with_block_size(mut self, block_size: i64) -> Self {
        self.block_size = block_size;
        self
    }

    /// Whether a validation split is configured
    #[must_use]
    pub fn has_validation(&self) -> bool {
        self.valid_split.is_some()
    }

    /// Requested block size, `None` when unset
    #[must_use]
    pub fn requested_block_size(&self) -> Option<usize> {
        usize::try_from(self.block_size).ok().filter(|&b| b > 0)
    }

    /// Explicit target modules, split on commas
    #[must_use]
    pub fn target_module_list(&self) -> Option<Vec<String>> {
        self.target_modules.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
    }
}
