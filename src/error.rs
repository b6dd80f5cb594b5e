//! Error types for bannercache

use std::time::Duration;
use thiserror::Error;

/// Result type alias for bannercache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid banner target: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

/// Object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Blob index error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob index lock poisoned")]
    Poisoned,
}

/// Origin image fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Origin request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Origin returned HTTP {0}")]
    Status(u16),

    #[error("Origin returned an empty image")]
    EmptyBody,

    #[error("Network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Classify a reqwest error, attributing timeouts to the given deadline.
    pub fn from_reqwest(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(deadline)
        } else if err.is_connect() {
            FetchError::Network("Failed to connect to origin".to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `bannercache init` to create one.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
