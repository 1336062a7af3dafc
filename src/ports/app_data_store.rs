//! App Data Store Port - the host's per-member record store.
//!
//! Records are free-form JSON documents owned by a member and tagged with a
//! `type` string. Every write replaces the whole document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::{ParticipantId, RecordId};

/// Port for the host's generic app-data records.
#[async_trait]
pub trait AppDataStore: Send + Sync {
    /// Creates a record owned by `owner`.
    async fn create(&self, owner: &ParticipantId, record: NewAppData) -> Result<AppDataRecord, StoreError>;

    /// Overwrites the data of an existing record.
    async fn patch(&self, id: &RecordId, data: Value) -> Result<AppDataRecord, StoreError>;

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError>;

    /// Lists records matching `filter`, oldest first.
    async fn list(&self, filter: &AppDataFilter) -> Result<Vec<AppDataRecord>, StoreError>;
}

/// Payload for a record to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppData {
    pub data: Value,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDataRecord {
    pub id: RecordId,
    pub owner: ParticipantId,
    #[serde(rename = "type")]
    pub data_type: String,
    pub data: Value,
}

/// Narrows a listing. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDataFilter {
    pub owner: Option<ParticipantId>,
    pub data_type: Option<String>,
}

impl AppDataFilter {
    pub fn of_type(data_type: impl Into<String>) -> Self {
        Self {
            owner: None,
            data_type: Some(data_type.into()),
        }
    }

    pub fn owned_by(mut self, owner: ParticipantId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn matches(&self, record: &AppDataRecord) -> bool {
        self.owner.as_ref().map_or(true, |o| o == &record.owner)
            && self.data_type.as_deref().map_or(true, |t| t == record.data_type)
    }
}

/// Errors from the host record stores.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(owner: &str, data_type: &str) -> AppDataRecord {
        AppDataRecord {
            id: RecordId::new("r-1"),
            owner: ParticipantId::new(owner).unwrap(),
            data_type: data_type.to_string(),
            data: json!({}),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(AppDataFilter::default().matches(&record("a", "Interaction")));
    }

    #[test]
    fn filter_checks_owner_and_type() {
        let filter = AppDataFilter::of_type("Interaction").owned_by(ParticipantId::new("a").unwrap());
        assert!(filter.matches(&record("a", "Interaction")));
        assert!(!filter.matches(&record("b", "Interaction")));
        assert!(!filter.matches(&record("a", "Note")));
    }

    #[test]
    fn new_app_data_uses_type_key() {
        let payload = NewAppData {
            data: json!({"x": 1}),
            data_type: "Interaction".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "Interaction");
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("503".into()).is_retryable());
        assert!(!StoreError::NotFound("r".into()).is_retryable());
    }
}
