//! Completion Service Port - the assistant reply endpoint.
//!
//! The host exposes a chatbot endpoint that takes role-tagged prompt entries
//! and returns a single completion. Exchanges never call it directly; the
//! session builds the prompt and folds the completion back in.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl CompletionService for Echo {
//!     async fn complete(&self, prompt: &[PromptEntry]) -> Result<Completion, CompletionError> {
//!         let last = prompt.last().map(|e| e.content.clone()).unwrap_or_default();
//!         Ok(Completion::new(last))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::exchange::PromptEntry;

/// Port for generating assistant replies.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generates the assistant's next turn for `prompt`.
    async fn complete(&self, prompt: &[PromptEntry]) -> Result<Completion, CompletionError>;
}

/// A generated assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub completion: String,
}

impl Completion {
    pub fn new(completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
        }
    }
}

/// Errors from completion requests.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompletionError {
    /// Rate limited by the endpoint.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// The endpoint is down or returned a server error.
    #[error("completion service unavailable: {message}")]
    Unavailable { message: String },

    /// Credentials were rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The endpoint refused the prompt.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl CompletionError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if the same prompt may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited { .. }
                | CompletionError::Unavailable { .. }
                | CompletionError::Network(_)
                | CompletionError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(CompletionError::RateLimited { retry_after_secs: 2 }.is_retryable());
        assert!(CompletionError::unavailable("502").is_retryable());
        assert!(CompletionError::network("reset").is_retryable());
        assert!(CompletionError::Timeout { timeout_secs: 30 }.is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!CompletionError::AuthenticationFailed.is_retryable());
        assert!(!CompletionError::parse("bad json").is_retryable());
        assert!(!CompletionError::InvalidRequest("empty".into()).is_retryable());
    }

    #[test]
    fn completion_deserializes_from_host_shape() {
        let c: Completion = serde_json::from_str(r#"{"completion":"Hi"}"#).unwrap();
        assert_eq!(c, Completion::new("Hi"));
    }

    #[test]
    fn completion_service_is_object_safe() {
        fn _accepts(_: &dyn CompletionService) {}
    }
}
