//! Offline fixtures: a tiny model directory with a WordLevel tokenizer

use std::path::Path;

use ndarray::{ArrayD, IxDyn};
use serde_json::{json, Map, Value};

use crate::io::{default_metadata, save_safetensors};

pub(crate) const HIDDEN: usize = 4;

const WORDS: &[&str] = &[
    "the", "cat", "sat", "on", "mat", "a", "dog", "down", "hello", "world",
];

/// Builder for a model directory that every stage can load
#[derive(Debug, Clone)]
pub(crate) struct TinyModel {
    max_length: Option<usize>,
    model_type: String,
    tied: bool,
}

impl Default for TinyModel {
    fn default() -> Self {
        Self {
            max_length: Some(128),
            model_type: "llama".to_string(),
            tied: false,
        }
    }
}

fn fill(shape: &[usize], salt: usize, scale: f32) -> ArrayD<f32> {
    let mut i = 0usize;
    ArrayD::from_shape_fn(IxDyn(shape), |_| {
        i += 1;
        (((i * 7 + salt * 13) % 17) as f32 / 17.0 - 0.5) * scale
    })
}

impl TinyModel {
    pub(crate) fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    pub(crate) fn with_model_type(mut self, model_type: &str) -> Self {
        self.model_type = model_type.to_string();
        self
    }

    pub(crate) fn with_tied_embeddings(mut self, tied: bool) -> Self {
        self.tied = tied;
        self
    }

    /// Tokens in id order
    pub(crate) fn vocab(&self) -> Vec<&'static str> {
        let mut vocab = vec!["[UNK]", "</s>"];
        vocab.extend(WORDS);
        vocab
    }

    pub(crate) fn projection_names() -> Vec<String> {
        ["q_proj", "k_proj", "v_proj", "o_proj"]
            .iter()
            .map(|p| format!("model.layers.0.self_attn.{p}.weight"))
            .collect()
    }

    fn tokenizer_json(&self) -> Value {
        let vocab: Map<String, Value> = self
            .vocab()
            .iter()
            .enumerate()
            .map(|(id, token)| ((*token).to_string(), json!(id)))
            .collect();
        json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [{
                "id": 1,
                "content": "</s>",
                "single_word": false,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true
            }],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
        })
    }

    /// Write tokenizer, config and weights into `dir`
    pub(crate) fn write(&self, dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("tokenizer.json"),
            serde_json::to_string(&self.tokenizer_json()).unwrap(),
        )
        .unwrap();

        let mut tokenizer_config = json!({ "eos_token": "</s>" });
        if let Some(max_length) = self.max_length {
            tokenizer_config["model_max_length"] = json!(max_length);
        }
        std::fs::write(
            dir.join("tokenizer_config.json"),
            tokenizer_config.to_string(),
        )
        .unwrap();

        let vocab_size = self.vocab().len();
        let config = json!({
            "model_type": self.model_type,
            "vocab_size": vocab_size,
            "hidden_size": HIDDEN,
            "tie_word_embeddings": self.tied,
            "use_cache": true
        });
        std::fs::write(dir.join("config.json"), config.to_string()).unwrap();

        let mut tensors = vec![(
            "model.embed_tokens.weight".to_string(),
            fill(&[vocab_size, HIDDEN], 1, 1.0),
        )];
        for (salt, name) in Self::projection_names().into_iter().enumerate() {
            tensors.push((name, fill(&[HIDDEN, HIDDEN], salt + 2, 0.2)));
        }
        tensors.push((
            "model.layers.0.input_layernorm.weight".to_string(),
            ArrayD::ones(IxDyn(&[HIDDEN])),
        ));
        tensors.push(("model.norm.weight".to_string(), ArrayD::ones(IxDyn(&[HIDDEN]))));
        if !self.tied {
            tensors.push(("lm_head.weight".to_string(), fill(&[vocab_size, HIDDEN], 9, 1.0)));
        }
        save_safetensors(
            &dir.join("model.safetensors"),
            tensors.iter().map(|(name, value)| (name.as_str(), value)),
            default_metadata(),
        )
        .unwrap();
    }
}

/// Write texts as a JSON Lines split file
pub(crate) fn write_split(dir: &Path, split: &str, texts: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    let lines: Vec<String> = texts
        .iter()
        .map(|text| json!({ "text": text }).to_string())
        .collect();
    std::fs::write(dir.join(format!("{split}.jsonl")), lines.join("\n")).unwrap();
}
