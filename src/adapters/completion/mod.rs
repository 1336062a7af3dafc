//! Completion Service Adapters.
//!
//! - `MockCompletionService` - Scripted replies for tests and offline runs
//! - `RetryingCompletionService` - Per-attempt timeout with exponential backoff
//!
//! The host chatbot endpoint lives in `adapters::host`.

mod mock;
mod retrying;

pub use mock::{MockCompletionService, MockReply};
pub use retrying::{RetryPolicy, RetryingCompletionService};
