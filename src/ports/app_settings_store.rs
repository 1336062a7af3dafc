//! App Settings Store Port - named settings documents owned by the item.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::RecordId;

use super::StoreError;

/// Port for the host's app-settings documents.
#[async_trait]
pub trait AppSettingsStore: Send + Sync {
    async fn list(&self) -> Result<Vec<AppSettingRecord>, StoreError>;

    async fn create(&self, name: &str, data: Value) -> Result<AppSettingRecord, StoreError>;

    /// Overwrites the data of an existing document.
    async fn patch(&self, id: &RecordId, data: Value) -> Result<AppSettingRecord, StoreError>;
}

/// A stored settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettingRecord {
    pub id: RecordId,
    pub name: String,
    pub data: Value,
}
