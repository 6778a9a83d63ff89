//! Configuration error types

use thiserror::Error;

/// Errors raised while normalizing or validating training parameters
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown configuration field: {0}")]
    UnknownField(String),

    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid repository ID (expected 'owner/name'): {0:?}")]
    InvalidRepoId(Option<String>),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Configuration must be a mapping of option name to value, got {0}")]
    NotAMapping(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
