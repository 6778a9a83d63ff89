//! `config.json` of a pretrained model
//!
//! Only a few keys are interpreted; the rest are carried through so the
//! saved config stays loadable by other tooling.

use std::path::Path;

use serde_json::{Map, Value};

use super::error::{ModelError, Result};
use crate::hf_pipeline::MODEL_CONFIG_FILE;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    raw: Map<String, Value>,
}

impl ModelConfig {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MODEL_CONFIG_FILE);
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str(json)? {
            Value::Object(raw) => Ok(Self { raw }),
            _ => Err(ModelError::Config(format!(
                "{MODEL_CONFIG_FILE} must be a JSON object"
            ))),
        }
    }

    #[must_use]
    pub fn model_type(&self) -> Option<&str> {
        self.raw.get("model_type").and_then(Value::as_str)
    }

    #[must_use]
    pub fn vocab_size(&self) -> Option<usize> {
        self.get_usize("vocab_size")
    }

    pub fn set_vocab_size(&mut self, vocab_size: usize) {
        self.raw
            .insert("vocab_size".to_string(), Value::from(vocab_size as u64));
    }

    #[must_use]
    pub fn hidden_size(&self) -> Option<usize> {
        self.get_usize("hidden_size")
            .or_else(|| self.get_usize("n_embd"))
            .or_else(|| self.get_usize("d_model"))
    }

    /// Defaults to `true`, like the upstream config class
    #[must_use]
    pub fn use_cache(&self) -> bool {
        self.raw.get("use_cache").and_then(Value::as_bool).unwrap_or(true)
    }

    pub fn set_use_cache(&mut self, use_cache: bool) {
        self.raw.insert("use_cache".to_string(), Value::Bool(use_cache));
    }

    #[must_use]
    pub fn tie_word_embeddings(&self) -> bool {
        self.raw
            .get("tie_word_embeddings")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    #[must_use]
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(
            dir.join(MODEL_CONFIG_FILE),
            serde_json::to_string_pretty(&Value::Object(self.raw.clone()))?,
        )?;
        Ok(())
    }

    fn get_usize(&self, key: &str) -> Option<usize> {
        self.raw
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_and_passthrough() {
        let mut config =
            ModelConfig::from_json(r#"{"model_type": "llama", "vocab_size": 32000, "rope_theta": 10000.0}"#)
                .unwrap();
        assert_eq!(config.model_type(), Some("llama"));
        assert_eq!(config.vocab_size(), Some(32000));
        assert!(config.use_cache());
        assert!(config.tie_word_embeddings());

        config.set_use_cache(false);
        config.set_vocab_size(32001);

        let dir = TempDir::new().unwrap();
        config.save(dir.path()).unwrap();
        let reloaded = ModelConfig::load(dir.path()).unwrap();
        assert!(!reloaded.use_cache());
        assert_eq!(reloaded.vocab_size(), Some(32001));
        assert!(reloaded.as_json().contains_key("rope_theta"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(ModelConfig::from_json("[1, 2]").is_err());
    }
}
