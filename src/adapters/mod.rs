//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `completion` - Scripted and retrying completion services
//! - `host` - HTTP client for the host's app API
//! - `memory` - In-memory record and settings stores

pub mod completion;
pub mod host;
pub mod memory;

pub use completion::{MockCompletionService, RetryPolicy, RetryingCompletionService};
pub use host::HostApiClient;
pub use memory::{InMemoryAppDataStore, InMemoryAppSettingsStore};
