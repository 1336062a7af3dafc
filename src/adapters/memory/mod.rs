//! In-memory store adapters for tests and offline runs.

mod app_data_store;
mod app_settings_store;

pub use app_data_store::InMemoryAppDataStore;
pub use app_settings_store::InMemoryAppSettingsStore;
