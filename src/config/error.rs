//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("HTTP client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host base URL")]
    InvalidBaseUrl,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Retry count exceeds maximum allowed (10)")]
    TooManyRetries,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
