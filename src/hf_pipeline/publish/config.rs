//! Publishing configuration types

use serde::{Deserialize, Serialize};

/// Default Hub endpoint
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Configuration for publishing a folder to the Hub
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Repository ID (e.g., "username/my-model")
    pub repo_id: String,
    /// Repository type
    pub repo_type: RepoType,
    /// Whether the repository should be private
    pub private: bool,
    /// API token (if not set, resolved from env/file)
    #[serde(skip)]
    pub token: Option<String>,
    /// Hub base URL
    pub endpoint: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_id: String::new(),
            repo_type: RepoType::default(),
            private: false,
            token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl PublishConfig {
    /// Model repo config for `repo_id` with an optional explicit token
    #[must_use]
    pub fn model(repo_id: impl Into<String>, token: Option<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            token,
            ..Self::default()
        }
    }
}

/// Hub repository type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    /// Model repository
    #[default]
    Model,
    /// Dataset repository
    Dataset,
}

impl RepoType {
    /// API path segment for this repo type
    #[must_use]
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
        }
    }
}

impl std::fmt::Display for RepoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Dataset => write!(f, "dataset"),
        }
    }
}
