//! `tokenizer_config.json` / `special_tokens_map.json` handling
//!
//! Only a handful of keys matter here (`model_max_length` and the special
//! token strings). Every other key is preserved verbatim so a saved
//! tokenizer round-trips through other tooling.

use std::path::Path;

use serde_json::{Map, Value};

use super::error::Result;

/// Serialized tokenizer model
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Tokenizer settings written next to the model
pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
/// Special token strings
pub const SPECIAL_TOKENS_FILE: &str = "special_tokens_map.json";

/// Placeholder limit reported by tokenizers without a real maximum
pub const UNBOUNDED_MAX_LENGTH: usize = usize::MAX;

/// Parsed tokenizer settings file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizerFileConfig {
    raw: Map<String, Value>,
    special: Map<String, Value>,
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Special tokens are either plain strings or `{"content": "..."}` objects
fn token_content(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("content").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

impl TokenizerFileConfig {
    /// Read both settings files from `dir`; absent files yield empty settings
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            raw: read_object(&dir.join(TOKENIZER_CONFIG_FILE))?,
            special: read_object(&dir.join(SPECIAL_TOKENS_FILE))?,
        })
    }

    /// Declared maximum sequence length
    ///
    /// Oversized placeholders (e.g. `1e30`) saturate to
    /// [`UNBOUNDED_MAX_LENGTH`]. A missing key is also unbounded.
    #[must_use]
    pub fn model_max_length(&self) -> usize {
        match self.raw.get("model_max_length") {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .or_else(|| {
                    n.as_f64().map(|f| {
                        if f >= usize::MAX as f64 {
                            UNBOUNDED_MAX_LENGTH
                        } else {
                            f.max(0.0) as usize
                        }
                    })
                })
                .unwrap_or(UNBOUNDED_MAX_LENGTH),
            _ => UNBOUNDED_MAX_LENGTH,
        }
    }

    pub fn set_model_max_length(&mut self, max_length: usize) {
        self.raw
            .insert("model_max_length".to_string(), Value::from(max_length as u64));
    }

    /// Look up a special token (`eos_token`, `bos_token`, ...)
    #[must_use]
    pub fn special_token(&self, key: &str) -> Option<String> {
        self.raw
            .get(key)
            .and_then(token_content)
            .or_else(|| self.special.get(key).and_then(token_content))
    }

    /// Write the settings files into `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::write(
            dir.join(TOKENIZER_CONFIG_FILE),
            serde_json::to_string_pretty(&Value::Object(self.raw.clone()))?,
        )?;
        if !self.special.is_empty() {
            std::fs::write(
                dir.join(SPECIAL_TOKENS_FILE),
                serde_json::to_string_pretty(&Value::Object(self.special.clone()))?,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_huge_placeholder_saturates() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(TOKENIZER_CONFIG_FILE),
            r#"{"model_max_length": 1000000000000000019884624838656}"#,
        )
        .unwrap();
        let config = TokenizerFileConfig::load(dir.path()).unwrap();
        assert_eq!(config.model_max_length(), UNBOUNDED_MAX_LENGTH);
    }

    #[test]
    fn test_missing_files_are_unbounded() {
        let dir = TempDir::new().unwrap();
        let config = TokenizerFileConfig::load(dir.path()).unwrap();
        assert_eq!(config.model_max_length(), UNBOUNDED_MAX_LENGTH);
        assert!(config.special_token("eos_token").is_none());
    }

    #[test]
    fn test_special_token_forms() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(TOKENIZER_CONFIG_FILE),
            r#"{"model_max_length": 512, "eos_token": {"content": "</s>", "lstrip": false}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(SPECIAL_TOKENS_FILE),
            r#"{"bos_token": "<s>"}"#,
        )
        .unwrap();
        let config = TokenizerFileConfig::load(dir.path()).unwrap();
        assert_eq!(config.model_max_length(), 512);
        assert_eq!(config.special_token("eos_token").as_deref(), Some("</s>"));
        assert_eq!(config.special_token("bos_token").as_deref(), Some("<s>"));
    }
}
