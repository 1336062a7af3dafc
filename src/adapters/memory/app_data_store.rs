//! In-Memory App Data Store
//!
//! Keeps records in insertion order. Failures can be injected to exercise
//! the persistence error paths.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::foundation::{ParticipantId, RecordId};
use crate::ports::{AppDataFilter, AppDataRecord, AppDataStore, NewAppData, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAppDataStore {
    records: Arc<RwLock<Vec<AppDataRecord>>>,
    failures_remaining: Arc<AtomicUsize>,
    creates: Arc<AtomicUsize>,
    patches: Arc<AtomicUsize>,
}

impl InMemoryAppDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` write calls fail with `StoreError::Unavailable`.
    pub fn fail_next_writes(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of successful `create` calls.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of successful `patch` calls.
    pub fn patch_count(&self) -> usize {
        self.patches.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Snapshot of every stored record.
    pub async fn records(&self) -> Vec<AppDataRecord> {
        self.records.read().await.clone()
    }

    fn injected_failure(&self) -> Result<(), StoreError> {
        let took = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match took {
            Ok(_) => Err(StoreError::Unavailable("injected failure".to_string())),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl AppDataStore for InMemoryAppDataStore {
    async fn create(&self, owner: &ParticipantId, record: NewAppData) -> Result<AppDataRecord, StoreError> {
        self.injected_failure()?;
        let stored = AppDataRecord {
            id: RecordId::new(Uuid::new_v4().to_string()),
            owner: owner.clone(),
            data_type: record.data_type,
            data: record.data,
        };
        self.records.write().await.push(stored.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn patch(&self, id: &RecordId, data: Value) -> Result<AppDataRecord, StoreError> {
        self.injected_failure()?;
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.data = data;
        self.patches.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.injected_failure()?;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: &AppDataFilter) -> Result<Vec<AppDataRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }
}
