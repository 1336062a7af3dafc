//! Host platform API configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the host's app-data, app-settings and chatbot endpoints live.
///
/// Leaving `base_url` unset runs against in-memory stores and the scripted
/// completion service.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// API root, e.g. `https://api.example.org`
    pub base_url: Option<String>,

    /// App item the interview belongs to
    pub item_id: Option<String>,

    /// Bearer token for the app context
    pub token: Option<Secret<String>>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl HostConfig {
    /// Check if a host is configured
    pub fn is_configured(&self) -> bool {
        self.base_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate host configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.is_configured() {
            return Ok(());
        }
        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidBaseUrl);
            }
        }
        if self.item_id.as_ref().map_or(true, |id| id.is_empty()) {
            return Err(ValidationError::MissingRequired("HOST__ITEM_ID"));
        }
        if self.token.is_none() {
            return Err(ValidationError::MissingRequired("HOST__TOKEN"));
        }
        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            item_id: None,
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
