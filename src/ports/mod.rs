//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the host platform. Adapters implement these ports.
//!
//! - `CompletionService` - Assistant replies from the chatbot endpoint
//! - `AppDataStore` - Per-member records (interaction snapshots)
//! - `AppSettingsStore` - Named builder settings documents

mod app_data_store;
mod app_settings_store;
mod completion_service;

pub use app_data_store::{AppDataFilter, AppDataRecord, AppDataStore, NewAppData, StoreError};
pub use app_settings_store::{AppSettingRecord, AppSettingsStore};
pub use completion_service::{Completion, CompletionError, CompletionService};
