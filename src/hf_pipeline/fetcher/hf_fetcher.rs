//! Hugging Face Hub model fetcher.
//!
//! Resolves a `model_name` to a local directory, downloading through the
//! `hf-hub` cache when it is not already a directory on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::hf_pipeline::error::{FetchError, Result};
use crate::tokenizer::{SPECIAL_TOKENS_FILE, TOKENIZER_CONFIG_FILE, TOKENIZER_FILE};

use super::types::{
    shard_files, ModelArtifact, ModelSource, WeightFormat, MODEL_CONFIG_FILE, WEIGHTS_FILE,
    WEIGHTS_INDEX_FILE,
};

/// Hub model fetcher
pub struct HfModelFetcher {
    /// Authentication token
    pub(crate) token: Option<String>,
    /// Cache directory, `None` for the hf-hub default
    pub(crate) cache_dir: Option<PathBuf>,
}

impl HfModelFetcher {
    /// Create a fetcher using the token from the environment
    ///
    /// A missing token is not an error; public repos can be pulled anonymously.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Self::resolve_token(),
            cache_dir: None,
        }
    }

    /// Create a fetcher preferring an explicit token over the environment
    #[must_use]
    pub fn with_token(token: Option<&str>) -> Self {
        Self {
            token: Self::resolve_token_with(token),
            cache_dir: None,
        }
    }

    /// Set cache directory
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Resolve token from multiple sources
    ///
    /// Priority:
    /// 1. HF_TOKEN environment variable
    /// 2. ~/.huggingface/token file
    #[must_use]
    pub fn resolve_token() -> Option<String> {
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.is_empty() {
                return Some(token);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let token_path = home.join(".huggingface").join("token");
            if let Ok(token) = std::fs::read_to_string(token_path) {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    return Some(token);
                }
            }
        }

        None
    }

    /// An explicit, non-empty token wins over [`Self::resolve_token`]
    #[must_use]
    pub fn resolve_token_with(explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .or_else(Self::resolve_token)
    }

    /// Check if client has authentication
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Parse and validate repository ID
    pub fn parse_repo_id(repo_id: &str) -> Result<(&str, &str)> {
        let parts: Vec<&str> = repo_id.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(FetchError::InvalidRepoId {
                repo_id: repo_id.to_string(),
            });
        }
        Ok((parts[0], parts[1]))
    }

    /// Accept `org/name` or a legacy single-segment id like `gpt2`
    pub(crate) fn check_hub_id(id: &str) -> Result<()> {
        if id.contains('/') {
            Self::parse_repo_id(id).map(|_| ())
        } else if id.is_empty() || id.chars().any(char::is_whitespace) {
            Err(FetchError::InvalidRepoId {
                repo_id: id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Build the hf-hub sync API client with optional authentication.
    pub(crate) fn build_api(&self) -> Result<hf_hub::api::sync::Api> {
        let mut api_builder = hf_hub::api::sync::ApiBuilder::new().with_progress(false);

        if let Some(cache_dir) = &self.cache_dir {
            api_builder = api_builder.with_cache_dir(cache_dir.clone());
        }
        if let Some(token) = &self.token {
            api_builder = api_builder.with_token(Some(token.clone()));
        }

        api_builder.build().map_err(|e| FetchError::Api {
            message: format!("Failed to initialize HF API: {e}"),
        })
    }

    /// Download a single file, mapping 404 responses to `FileNotFound`.
    pub(crate) fn download_file(
        repo: &hf_hub::api::sync::ApiRepo,
        repo_id: &str,
        file: &str,
    ) -> Result<PathBuf> {
        debug!(repo = repo_id, file, "downloading");
        repo.get(file).map_err(|e| {
            let message = e.to_string();
            if message.contains("404") {
                FetchError::FileNotFound {
                    repo: repo_id.to_string(),
                    file: file.to_string(),
                }
            } else {
                FetchError::Api {
                    message: format!("Download of {file} from {repo_id} failed: {message}"),
                }
            }
        })
    }

    /// Like [`Self::download_file`] but a missing file is `Ok(None)`
    fn download_optional(
        repo: &hf_hub::api::sync::ApiRepo,
        repo_id: &str,
        file: &str,
    ) -> Result<Option<PathBuf>> {
        match Self::download_file(repo, repo_id, file) {
            Ok(path) => Ok(Some(path)),
            Err(FetchError::FileNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve a model to a local directory
    ///
    /// An existing local directory is used as-is. Anything else is a Hub
    /// repo id whose config, tokenizer files and safetensors weights
    /// (single file or sharded) are downloaded.
    ///
    /// # Errors
    ///
    /// Returns error if the id is malformed, the repo or a required file is
    /// missing, or the download fails.
    pub fn fetch_model(&self, model_name: &str) -> Result<ModelArtifact> {
        let local = Path::new(model_name);
        if local.is_dir() {
            debug!(path = %local.display(), "using local model directory");
            return ModelArtifact::from_local_dir(local);
        }

        Self::check_hub_id(model_name)?;
        info!(model = model_name, "fetching model from the Hub");

        let api = self.build_api()?;
        let repo = api.model(model_name.to_string());

        let config_path =
            Self::download_file(&repo, model_name, MODEL_CONFIG_FILE).map_err(|e| match e {
                FetchError::FileNotFound { .. } => FetchError::ModelNotFound {
                    repo: model_name.to_string(),
                },
                other => other,
            })?;
        let path = config_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| FetchError::Api {
                message: format!("unexpected cache path {}", config_path.display()),
            })?;

        Self::download_file(&repo, model_name, TOKENIZER_FILE)?;
        for optional in [TOKENIZER_CONFIG_FILE, SPECIAL_TOKENS_FILE] {
            Self::download_optional(&repo, model_name, optional)?;
        }

        let format = if Self::download_optional(&repo, model_name, WEIGHTS_FILE)?.is_some() {
            WeightFormat::SafeTensors
        } else {
            let index = Self::download_file(&repo, model_name, WEIGHTS_INDEX_FILE)?;
            for shard in shard_files(&index)? {
                Self::download_file(&repo, model_name, &shard)?;
            }
            WeightFormat::ShardedSafeTensors
        };

        Ok(ModelArtifact {
            path,
            format,
            source: ModelSource::Hub {
                repo_id: model_name.to_string(),
            },
        })
    }
}

impl Default for HfModelFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HfModelFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfModelFetcher")
            .field("authenticated", &self.is_authenticated())
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}
