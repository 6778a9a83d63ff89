//! Outcome of a publish and what can go wrong

use std::fmt;

use serde::Serialize;

/// Repository a folder was uploaded to
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub repo_id: String,
    pub repo_url: String,
    pub private: bool,
    /// Files sent, counting nested checkpoint files
    pub files_uploaded: usize,
}

impl fmt::Display for PublishResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visibility = if self.private { "private" } else { "public" };
        write!(
            f,
            "pushed {} files to {} ({visibility})",
            self.files_uploaded, self.repo_url
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("cannot create repository '{repo_id}': {message}")]
    RepoCreationFailed { repo_id: String, message: String },

    #[error("upload of '{path}' failed: {message}")]
    UploadFailed { path: String, message: String },

    /// No token in the job, the environment, or the token cache
    #[error("pushing to the hub needs a token: set huggingface_token or HF_TOKEN")]
    AuthRequired,

    #[error("'{repo_id}' is not a repository id of the form owner/name")]
    InvalidRepoId { repo_id: String },

    #[error("hub request failed: {message}")]
    Http { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
