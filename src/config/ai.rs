//! Assistant call configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timeout and retry settings for assistant calls
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AiConfig {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a retryable failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled on every retry
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate assistant call configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_retries > 10 {
            return Err(ValidationError::TooManyRetries);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            backoff_base_ms: default_backoff_base(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_base() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.backoff_base_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AiConfig {
            timeout_secs: 15,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = AiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validation_too_many_retries() {
        let config = AiConfig {
            max_retries: 11,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::TooManyRetries));
    }
}
