//! Hub publisher
//!
//! Creates model repositories and uploads files to them through the Hub
//! REST API.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::config::PublishConfig;
use super::result::{PublishError, PublishResult};
use crate::config::is_valid_repo_id;
use crate::hf_pipeline::HfModelFetcher;

/// Hub publisher
pub struct HfPublisher {
    config: PublishConfig,
    client: reqwest::blocking::Client,
    token: String,
}

/// Every file under `dir` with its `/`-separated path relative to `dir`
///
/// Sorted by relative path.
pub fn collect_files(dir: &Path) -> std::io::Result<Vec<(PathBuf, String)>> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, String)>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                let in_repo = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push((path.clone(), in_repo));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

impl HfPublisher {
    /// Create a new publisher with config
    pub fn new(config: PublishConfig) -> Result<Self, PublishError> {
        if !is_valid_repo_id(&config.repo_id) {
            return Err(PublishError::InvalidRepoId {
                repo_id: config.repo_id.clone(),
            });
        }

        let token = HfModelFetcher::resolve_token_with(config.token.as_deref())
            .ok_or(PublishError::AuthRequired)?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("afinar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::Http {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            client,
            token,
        })
    }

    fn api_base(&self) -> String {
        format!("{}/api", self.config.endpoint.trim_end_matches('/'))
    }

    /// Public URL of the repository
    #[must_use]
    pub fn repo_url(&self) -> String {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        match self.config.repo_type {
            super::config::RepoType::Model => format!("{endpoint}/{}", self.config.repo_id),
            other => format!("{endpoint}/{}/{}", other.api_path(), self.config.repo_id),
        }
    }

    /// Upload endpoint for one file
    #[must_use]
    pub fn upload_url(&self, path_in_repo: &str) -> String {
        format!(
            "{}/{}/{}/upload/main/{}",
            self.api_base(),
            self.config.repo_type.api_path(),
            self.config.repo_id,
            path_in_repo
        )
    }

    /// Create the repository
    ///
    /// POST `{endpoint}/api/repos/create`. An existing repository (HTTP 409)
    /// counts as success.
    pub fn create_repo(&self) -> Result<String, PublishError> {
        let url = format!("{}/repos/create", self.api_base());

        let mut body = serde_json::json!({
            "name": self.repo_name(),
            "type": self.config.repo_type.to_string(),
            "private": self.config.private,
        });

        if let Some(org) = self.repo_org() {
            body["organization"] = serde_json::Value::String(org.to_string());
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| PublishError::Http {
                message: format!("Create repo request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 409 {
            if status.as_u16() == 409 {
                debug!(repo = %self.config.repo_id, "repository already exists");
            }
            Ok(self.repo_url())
        } else {
            let body = response.text().unwrap_or_default();
            Err(PublishError::RepoCreationFailed {
                repo_id: self.config.repo_id.clone(),
                message: format!("HTTP {status}: {body}"),
            })
        }
    }

    /// Upload a local file to the repository
    pub fn upload_file(&self, local_path: &Path, path_in_repo: &str) -> Result<(), PublishError> {
        let content = std::fs::read(local_path)?;
        self.upload_bytes(content, path_in_repo)
    }

    /// Upload bytes directly to the repository
    ///
    /// PUT `{endpoint}/api/{type}s/{repo_id}/upload/main/{path}`
    pub fn upload_bytes(&self, content: Vec<u8>, path_in_repo: &str) -> Result<(), PublishError> {
        let response = self
            .client
            .put(self.upload_url(path_in_repo))
            .bearer_auth(&self.token)
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .send()
            .map_err(|e| PublishError::UploadFailed {
                path: path_in_repo.to_string(),
                message: format!("Upload request failed: {e}"),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            Err(PublishError::UploadFailed {
                path: path_in_repo.to_string(),
                message: format!("HTTP {status}: {body}"),
            })
        }
    }

    /// Upload every file under `folder`, keeping relative paths
    pub fn upload_folder(&self, folder: &Path) -> Result<usize, PublishError> {
        let files = collect_files(folder)?;
        for (local_path, path_in_repo) in &files {
            debug!(file = %path_in_repo, "uploading");
            self.upload_file(local_path, path_in_repo)?;
        }
        Ok(files.len())
    }

    /// Full publish flow: create repo, then upload the folder
    pub fn publish_folder(&self, folder: &Path) -> Result<PublishResult, PublishError> {
        let repo_url = self.create_repo()?;
        let files_uploaded = self.upload_folder(folder)?;
        info!(repo = %self.config.repo_id, files = files_uploaded, "upload complete");

        Ok(PublishResult {
            repo_id: self.config.repo_id.clone(),
            repo_url,
            private: self.config.private,
            files_uploaded,
        })
    }

    /// Part after the `/`
    fn repo_name(&self) -> &str {
        self.config
            .repo_id
            .split_once('/')
            .map_or(self.config.repo_id.as_str(), |(_, name)| name)
    }

    /// Part before the `/`
    fn repo_org(&self) -> Option<&str> {
        self.config.repo_id.split_once('/').map(|(org, _)| org)
    }
}

impl std::fmt::Debug for HfPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfPublisher")
            .field("repo_id", &self.config.repo_id)
            .field("repo_type", &self.config.repo_type)
            .field("private", &self.config.private)
            .finish_non_exhaustive()
    }
}
