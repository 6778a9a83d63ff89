//! Hugging Face `tokenizer.json` integration via the `tokenizers` crate.

use std::path::Path;
use std::str::FromStr;

use super::config::{TokenizerFileConfig, TOKENIZER_FILE};
use super::error::{Result, TokenizerError};

/// Token ids and attention mask for one text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encoded {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl Encoded {
    #[must_use]
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Pretrained tokenizer plus its settings file
#[derive(Clone)]
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    config: TokenizerFileConfig,
    model_max_length: usize,
}

impl std::fmt::Debug for HfTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTokenizer")
            .field("vocab_size", &self.len())
            .field("model_max_length", &self.model_max_length)
            .field("eos_token", &self.eos_token())
            .finish()
    }
}

impl HfTokenizer {
    /// Load `tokenizer.json` and the optional settings files from a directory
    ///
    /// # Errors
    /// Returns error if `tokenizer.json` is missing or cannot be parsed.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(TOKENIZER_FILE);
        if !path.exists() {
            return Err(TokenizerError::MissingFile(path));
        }
        let inner = tokenizers::Tokenizer::from_file(&path)
            .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
        let config = TokenizerFileConfig::load(dir)?;
        Ok(Self::from_parts(inner, config))
    }

    /// Build from a `tokenizer.json` string with default settings
    ///
    /// # Errors
    /// Returns error if JSON parsing fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_str(json)
            .map_err(|e| TokenizerError::Load(e.to_string()))?;
        Ok(Self::from_parts(inner, TokenizerFileConfig::default()))
    }

    fn from_parts(inner: tokenizers::Tokenizer, config: TokenizerFileConfig) -> Self {
        let model_max_length = config.model_max_length();
        Self {
            inner,
            config,
            model_max_length,
        }
    }

    /// Vocabulary size including added tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum sequence length the tokenizer accepts
    #[must_use]
    pub fn model_max_length(&self) -> usize {
        self.model_max_length
    }

    pub(crate) fn set_model_max_length(&mut self, max_length: usize) {
        self.model_max_length = max_length;
        self.config.set_model_max_length(max_length);
    }

    /// End-of-sequence token string, if the tokenizer defines one
    #[must_use]
    pub fn eos_token(&self) -> Option<String> {
        self.config.special_token("eos_token").or_else(|| {
            ["</s>", "<|endoftext|>", "<eos>"]
                .iter()
                .find(|t| self.inner.token_to_id(t).is_some())
                .map(|t| (*t).to_string())
        })
    }

    #[must_use]
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    /// Encode one text, adding the tokenizer's special tokens
    pub fn encode(&self, text: &str) -> Result<Encoded> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Ok(Encoded {
            input_ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }

    /// Encode a batch of texts without padding
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Encoded>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// Write `tokenizer.json` and the settings files into `dir`
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.inner
            .save(dir.join(TOKENIZER_FILE), false)
            .map_err(|e| TokenizerError::Save(e.to_string()))?;
        self.config.save(dir)
    }
}
