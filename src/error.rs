//! Structured error types for configuration loading and access.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Load errors (fatal at load/reload)
    FileUnreadable,
    FileMalformed,
    InvalidType,

    // Access errors (fatal at first use)
    MissingRequiredKey,

    // Concurrency
    ReloadInProgress,

    // Collaborators
    CredentialStore,
}

/// Fatal configuration errors.
///
/// Everything here is surfaced to the caller. Environment conversion failures
/// are not in this enum: they are non-fatal and reported as [`ConvertError`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file is missing or could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The config file parsed but is not a section -> key -> scalar mapping.
    #[error("invalid config structure in {}: {message}", path.display())]
    Structure { path: PathBuf, message: String },

    /// A known field holds a value of the wrong type.
    #[error("invalid config value: {message}")]
    InvalidType { message: String },

    /// A required field is absent from the merged layer.
    #[error("missing required config key {section}.{key}")]
    MissingRequiredKey {
        section: &'static str,
        key: &'static str,
    },

    /// Another reload is already running.
    #[error("config reload already in progress")]
    ReloadInProgress,

    /// The credential store failed to supply admin credentials.
    #[error("credential store error: {0}")]
    Credentials(#[source] anyhow::Error),
}

impl ConfigError {
    pub fn missing(section: &'static str, key: &'static str) -> Self {
        Self::MissingRequiredKey { section, key }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Read { .. } => ErrorCode::FileUnreadable,
            ConfigError::Parse { .. } | ConfigError::Structure { .. } => ErrorCode::FileMalformed,
            ConfigError::InvalidType { .. } => ErrorCode::InvalidType,
            ConfigError::MissingRequiredKey { .. } => ErrorCode::MissingRequiredKey,
            ConfigError::ReloadInProgress => ErrorCode::ReloadInProgress,
            ConfigError::Credentials(_) => ErrorCode::CredentialStore,
        }
    }

    /// True for errors raised while loading or reloading the file.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::FileUnreadable | ErrorCode::FileMalformed | ErrorCode::InvalidType
        )
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::InvalidType {
            message: err.to_string(),
        }
    }
}

/// A present environment variable whose value could not be converted.
///
/// Non-fatal: the override is skipped and the key keeps its prior value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid value for {var}: {value:?} ({reason})")]
pub struct ConvertError {
    pub var: String,
    pub value: String,
    pub reason: String,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
