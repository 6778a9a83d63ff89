//! Model artifact types

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::hf_pipeline::error::{FetchError, Result};

/// Model architecture description
pub const MODEL_CONFIG_FILE: &str = "config.json";
/// Single-file weights
pub const WEIGHTS_FILE: &str = "model.safetensors";
/// Index of sharded weights
pub const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";

/// How the weights of a model directory are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// `model.safetensors`
    SafeTensors,
    /// `model.safetensors.index.json` plus shard files
    ShardedSafeTensors,
}

impl WeightFormat {
    /// Detect the layout of a local model directory
    pub fn detect(dir: &Path) -> Result<Self> {
        if dir.join(WEIGHTS_FILE).is_file() {
            Ok(Self::SafeTensors)
        } else if dir.join(WEIGHTS_INDEX_FILE).is_file() {
            Ok(Self::ShardedSafeTensors)
        } else {
            Err(FetchError::FileNotFound {
                repo: dir.display().to_string(),
                file: WEIGHTS_FILE.to_string(),
            })
        }
    }
}

/// Where a model directory came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local,
    Hub { repo_id: String },
}

/// A model available on the local filesystem
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    /// Directory holding config, tokenizer and weights
    pub path: PathBuf,
    /// Weight layout
    pub format: WeightFormat,
    pub source: ModelSource,
}

impl ModelArtifact {
    /// Describe an existing local model directory
    pub fn from_local_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let path = dir.into();
        if !path.join(MODEL_CONFIG_FILE).is_file() {
            return Err(FetchError::ModelNotFound {
                repo: path.display().to_string(),
            });
        }
        let format = WeightFormat::detect(&path)?;
        Ok(Self {
            path,
            format,
            source: ModelSource::Local,
        })
    }
}

#[derive(Deserialize)]
struct ShardIndex {
    weight_map: std::collections::BTreeMap<String, String>,
}

/// Distinct shard file names listed by a `model.safetensors.index.json`
pub fn shard_files(index_path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(index_path)?;
    let index: ShardIndex = serde_json::from_str(&content)?;
    let shards: BTreeSet<String> = index.weight_map.into_values().collect();
    Ok(shards.into_iter().collect())
}
