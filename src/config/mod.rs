//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `INTERVIEW_CHATBOT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use interview_chatbot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Host configured: {}", config.host.is_configured());
//! ```

mod ai;
mod error;
mod host;
mod interaction;
mod logging;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use host::HostConfig;
pub use interaction::InteractionConfig;
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields an offline
/// configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Host platform endpoints (app data, app settings, chatbot)
    #[serde(default)]
    pub host: HostConfig,

    /// Assistant call timeouts and retries
    #[serde(default)]
    pub ai: AiConfig,

    /// Prompt framing and dismissal behaviour
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `INTERVIEW_CHATBOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `INTERVIEW_CHATBOT__HOST__BASE_URL=...` -> `host.base_url = ...`
    /// - `INTERVIEW_CHATBOT__AI__MAX_RETRIES=3` -> `ai.max_retries = 3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("INTERVIEW_CHATBOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.host.validate()?;
        self.ai.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
