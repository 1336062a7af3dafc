//! Timeout and retry wrapper around any completion service.
//!
//! Each attempt is bounded by a timeout. Retryable failures are retried with
//! exponential backoff (`base`, `2 * base`, `4 * base`, ...) up to
//! `max_retries` extra attempts.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::domain::exchange::PromptEntry;
use crate::ports::{Completion, CompletionError, CompletionService};

/// Retry policy for assistant calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempt_timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(60),
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl From<&AiConfig> for RetryPolicy {
    fn from(config: &AiConfig) -> Self {
        Self {
            attempt_timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_base.saturating_mul(1u32 << retry.min(16))
    }
}

pub struct RetryingCompletionService {
    inner: Arc<dyn CompletionService>,
    policy: RetryPolicy,
}

impl RetryingCompletionService {
    pub fn new(inner: Arc<dyn CompletionService>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, prompt: &[PromptEntry]) -> Result<Completion, CompletionError> {
        match timeout(self.policy.attempt_timeout, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout {
                timeout_secs: self.policy.attempt_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl CompletionService for RetryingCompletionService {
    async fn complete(&self, prompt: &[PromptEntry]) -> Result<Completion, CompletionError> {
        let mut retry = 0;
        loop {
            match self.attempt(prompt).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && retry < self.policy.max_retries => {
                    let delay = self.policy.backoff(retry);
                    warn!(error = %err, attempt = retry + 1, ?delay, "Completion failed, retrying");
                    sleep(delay).await;
                    retry += 1;
                }
                Err(err) => {
                    debug!(error = %err, attempts = retry + 1, "Completion failed");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::completion::MockCompletionService;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: Duration::from_millis(200),
            max_retries,
            backoff_base: Duration::from_millis(1),
        }
    }

    fn prompt() -> Vec<PromptEntry> {
        vec![PromptEntry::user("hi")]
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            backoff_base: Duration::from_millis(100),
            ..Default::default()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let mock = MockCompletionService::new()
            .with_error(CompletionError::unavailable("502"))
            .with_error(CompletionError::network("reset"))
            .with_reply("finally");
        let service = RetryingCompletionService::new(Arc::new(mock.clone()), fast_policy(2));

        let reply = service.complete(&prompt()).await.unwrap();
        assert_eq!(reply.completion, "finally");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let mock = MockCompletionService::new()
            .with_error(CompletionError::unavailable("1"))
            .with_error(CompletionError::unavailable("2"))
            .with_reply("too late");
        let service = RetryingCompletionService::new(Arc::new(mock.clone()), fast_policy(1));

        let err = service.complete(&prompt()).await.unwrap_err();
        assert_eq!(err, CompletionError::unavailable("2"));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let mock = MockCompletionService::new().with_error(CompletionError::AuthenticationFailed);
        let service = RetryingCompletionService::new(Arc::new(mock.clone()), fast_policy(3));

        assert!(service.complete(&prompt()).await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn slow_attempt_times_out() {
        let mock = MockCompletionService::new().with_delay(Duration::from_millis(500));
        let service = RetryingCompletionService::new(Arc::new(mock), fast_policy(0));

        let err = service.complete(&prompt()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout { .. }));
    }
}
