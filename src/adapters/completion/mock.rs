//! Scripted completion service for tests and offline runs.
//!
//! Replies are consumed in order; once the script runs out every call gets
//! the fallback reply. Every prompt is recorded for later inspection.
//!
//! # Example
//!
//! ```ignore
//! let service = MockCompletionService::new()
//!     .with_reply("Tell me more.")
//!     .with_error(CompletionError::unavailable("down"));
//!
//! let reply = service.complete(&prompt).await?;
//! assert_eq!(reply.completion, "Tell me more.");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::exchange::PromptEntry;
use crate::ports::{Completion, CompletionError, CompletionService};

const FALLBACK_REPLY: &str = "Could you tell me a bit more about that?";

/// A scripted outcome for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Success(String),
    Error(CompletionError),
}

#[derive(Debug, Clone)]
pub struct MockCompletionService {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<Vec<PromptEntry>>>>,
    fallback: String,
    delay: Duration,
}

impl Default for MockCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fallback: FALLBACK_REPLY.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Queues a successful reply.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        lock(&self.replies).push_back(MockReply::Success(content.into()));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: CompletionError) -> Self {
        lock(&self.replies).push_back(MockReply::Error(error));
        self
    }

    /// Reply used once the script is exhausted.
    pub fn with_fallback(mut self, content: impl Into<String>) -> Self {
        self.fallback = content.into();
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Every prompt received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<PromptEntry>> {
        lock(&self.calls).clone()
    }

    pub fn last_prompt(&self) -> Option<Vec<PromptEntry>> {
        lock(&self.calls).last().cloned()
    }

    fn next_reply(&self) -> MockReply {
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| MockReply::Success(self.fallback.clone()))
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, prompt: &[PromptEntry]) -> Result<Completion, CompletionError> {
        lock(&self.calls).push(prompt.to_vec());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Success(content) => Ok(Completion::new(content)),
            MockReply::Error(err) => Err(err),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
