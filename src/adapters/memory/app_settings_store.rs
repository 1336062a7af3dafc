//! In-Memory App Settings Store

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::foundation::RecordId;
use crate::domain::settings::{AllSettings, SettingName};
use crate::ports::{AppSettingRecord, AppSettingsStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAppSettingsStore {
    documents: Arc<RwLock<Vec<AppSettingRecord>>>,
}

impl InMemoryAppSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding all three documents of `settings`.
    pub fn seeded(settings: &AllSettings) -> Result<Self, StoreError> {
        let documents = vec![
            record(SettingName::Assistants, serde_json::to_value(&settings.assistants)?),
            record(SettingName::Chat, serde_json::to_value(&settings.chat)?),
            record(SettingName::Exchanges, serde_json::to_value(&settings.exchanges)?),
        ];
        Ok(Self {
            documents: Arc::new(RwLock::new(documents)),
        })
    }

    /// Stores a raw document under `name`, bypassing the port.
    pub async fn insert_raw(&self, name: &str, data: Value) {
        self.documents.write().await.push(AppSettingRecord {
            id: RecordId::new(Uuid::new_v4().to_string()),
            name: name.to_string(),
            data,
        });
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn record(name: SettingName, data: Value) -> AppSettingRecord {
    AppSettingRecord {
        id: RecordId::new(Uuid::new_v4().to_string()),
        name: name.as_str().to_string(),
        data,
    }
}

#[async_trait]
impl AppSettingsStore for InMemoryAppSettingsStore {
    async fn list(&self) -> Result<Vec<AppSettingRecord>, StoreError> {
        Ok(self.documents.read().await.clone())
    }

    async fn create(&self, name: &str, data: Value) -> Result<AppSettingRecord, StoreError> {
        let stored = AppSettingRecord {
            id: RecordId::new(Uuid::new_v4().to_string()),
            name: name.to_string(),
            data,
        };
        self.documents.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn patch(&self, id: &RecordId, data: Value) -> Result<AppSettingRecord, StoreError> {
        let mut documents = self.documents.write().await;
        let doc = documents
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.data = data;
        Ok(doc.clone())
    }
}
