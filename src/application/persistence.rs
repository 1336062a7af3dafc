//! Interaction snapshots in the host's app-data store.
//!
//! Each participant has at most one record of type [`INTERACTION_TYPE`]. The
//! recorder creates it once and patches the full snapshot after that. The
//! record id lives only in memory; a fresh recorder re-derives it through
//! [`InteractionRecorder::find`].

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::foundation::{ParticipantId, RecordId};
use crate::domain::interaction::Interaction;
use crate::ports::{AppDataFilter, AppDataRecord, AppDataStore, NewAppData, StoreError};

/// Type tag of interaction records.
pub const INTERACTION_TYPE: &str = "Interaction";

/// Outcome of pushing a snapshot to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// First snapshot stored as a new record.
    Created,
    /// Existing record overwritten.
    Patched,
    /// Nothing changed, nothing was sent.
    Unchanged,
    /// The store call failed; the in-memory state is still authoritative.
    Failed { reason: String, retryable: bool },
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PersistenceError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("stored interaction could not be decoded: {0}")]
    Decode(String),

    #[error("interaction could not be encoded: {0}")]
    Encode(String),
}

impl PersistenceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PersistenceError::Store(err) => err.is_retryable(),
            PersistenceError::Decode(_) | PersistenceError::Encode(_) => false,
        }
    }
}

impl From<PersistenceError> for SyncStatus {
    fn from(err: PersistenceError) -> Self {
        SyncStatus::Failed {
            retryable: err.is_retryable(),
            reason: err.to_string(),
        }
    }
}

/// Reads and writes one participant's interaction record.
pub struct InteractionRecorder {
    store: Arc<dyn AppDataStore>,
    participant: ParticipantId,
    record_id: Option<RecordId>,
}

impl InteractionRecorder {
    pub fn new(store: Arc<dyn AppDataStore>, participant: ParticipantId) -> Self {
        Self {
            store,
            participant,
            record_id: None,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    /// Id of the record once it has been created or found.
    pub fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    /// Loads the participant's stored interaction, remembering its record id.
    pub async fn find(&mut self) -> Result<Option<Interaction>, PersistenceError> {
        let filter = AppDataFilter::of_type(INTERACTION_TYPE).owned_by(self.participant.clone());
        let Some(record) = self.store.list(&filter).await?.into_iter().next() else {
            debug!(participant = %self.participant, "No stored interaction");
            return Ok(None);
        };

        let interaction = decode(&record)?;
        debug!(
            participant = %self.participant,
            record_id = %record.id,
            interaction_id = %interaction.id(),
            "Loaded stored interaction"
        );
        self.record_id = Some(record.id);
        Ok(Some(interaction))
    }

    /// Stores the full snapshot, creating the record on first success.
    pub async fn save(&mut self, interaction: &Interaction) -> Result<SyncStatus, PersistenceError> {
        let data = serde_json::to_value(interaction).map_err(|e| PersistenceError::Encode(e.to_string()))?;

        match &self.record_id {
            Some(id) => {
                self.store.patch(id, data).await?;
                debug!(record_id = %id, interaction_id = %interaction.id(), "Patched interaction");
                Ok(SyncStatus::Patched)
            }
            None => {
                let created = self
                    .store
                    .create(
                        &self.participant,
                        NewAppData {
                            data,
                            data_type: INTERACTION_TYPE.to_string(),
                        },
                    )
                    .await?;
                info!(
                    record_id = %created.id,
                    interaction_id = %interaction.id(),
                    "Created interaction record"
                );
                self.record_id = Some(created.id);
                Ok(SyncStatus::Created)
            }
        }
    }

    /// Like [`save`](Self::save), but folds failures into the status.
    pub async fn sync(&mut self, interaction: &Interaction) -> SyncStatus {
        match self.save(interaction).await {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    participant = %self.participant,
                    interaction_id = %interaction.id(),
                    error = %err,
                    "Failed to persist interaction"
                );
                err.into()
            }
        }
    }

    /// Deletes the participant's record. Returns false if there was none.
    pub async fn delete(&mut self) -> Result<bool, PersistenceError> {
        if self.record_id.is_none() {
            self.find_record_id().await?;
        }
        let Some(id) = self.record_id.take() else {
            return Ok(false);
        };
        self.store.delete(&id).await?;
        info!(participant = %self.participant, record_id = %id, "Deleted interaction record");
        Ok(true)
    }

    async fn find_record_id(&mut self) -> Result<(), PersistenceError> {
        let filter = AppDataFilter::of_type(INTERACTION_TYPE).owned_by(self.participant.clone());
        self.record_id = self.store.list(&filter).await?.into_iter().next().map(|r| r.id);
        Ok(())
    }
}

/// Decodes an interaction snapshot from a stored record.
pub fn decode(record: &AppDataRecord) -> Result<Interaction, PersistenceError> {
    serde_json::from_value(record.data.clone()).map_err(|e| PersistenceError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAppDataStore;
    use crate::domain::conversation::Agent;
    use crate::domain::foundation::AgentId;
    use crate::domain::settings::AllSettings;
    use serde_json::json;

    fn participant() -> ParticipantId {
        ParticipantId::new("member-1").unwrap()
    }

    fn interaction() -> Interaction {
        let agent = Agent::participant(AgentId::new("member-1"), "Member");
        Interaction::from_settings(agent, &AllSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn first_save_creates_then_patches() {
        let store = InMemoryAppDataStore::new();
        let mut recorder = InteractionRecorder::new(Arc::new(store.clone()), participant());
        let ix = interaction();

        assert_eq!(recorder.save(&ix).await.unwrap(), SyncStatus::Created);
        assert_eq!(recorder.save(&ix).await.unwrap(), SyncStatus::Patched);
        assert_eq!(recorder.save(&ix).await.unwrap(), SyncStatus::Patched);
        assert_eq!(store.create_count(), 1);
        assert_eq!(store.patch_count(), 2);
    }

    #[tokio::test]
    async fn find_restores_snapshot_and_record_id() {
        let store = Arc::new(InMemoryAppDataStore::new());
        let ix = interaction();
        InteractionRecorder::new(store.clone(), participant()).save(&ix).await.unwrap();

        let mut fresh = InteractionRecorder::new(store.clone(), participant());
        assert!(fresh.record_id().is_none());
        let found = fresh.find().await.unwrap().unwrap();

        assert_eq!(found, ix);
        assert!(fresh.record_id().is_some());
        assert_eq!(fresh.save(&ix).await.unwrap(), SyncStatus::Patched);
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn find_ignores_other_participants_and_types() {
        let store = Arc::new(InMemoryAppDataStore::new());
        let other = ParticipantId::new("member-2").unwrap();
        InteractionRecorder::new(store.clone(), other.clone()).save(&interaction()).await.unwrap();
        store
            .create(
                &participant(),
                NewAppData {
                    data: json!({}),
                    data_type: "Note".to_string(),
                },
            )
            .await
            .unwrap();

        let mut recorder = InteractionRecorder::new(store, participant());
        assert!(recorder.find().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_create_is_retried_on_next_save() {
        let store = InMemoryAppDataStore::new();
        let mut recorder = InteractionRecorder::new(Arc::new(store.clone()), participant());
        let ix = interaction();
        store.fail_next_writes(1);

        let status = recorder.sync(&ix).await;
        assert!(matches!(status, SyncStatus::Failed { retryable: true, .. }));
        assert!(recorder.record_id().is_none());

        assert_eq!(recorder.sync(&ix).await, SyncStatus::Created);
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn undecodable_record_is_reported() {
        let store = Arc::new(InMemoryAppDataStore::new());
        store
            .create(
                &participant(),
                NewAppData {
                    data: json!({ "garbage": true }),
                    data_type: INTERACTION_TYPE.to_string(),
                },
            )
            .await
            .unwrap();

        let mut recorder = InteractionRecorder::new(store, participant());
        let err = recorder.find().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Decode(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn delete_finds_record_when_not_loaded() {
        let store = Arc::new(InMemoryAppDataStore::new());
        InteractionRecorder::new(store.clone(), participant()).save(&interaction()).await.unwrap();

        let mut recorder = InteractionRecorder::new(store.clone(), participant());
        assert!(recorder.delete().await.unwrap());
        assert!(store.is_empty().await);
        assert!(!recorder.delete().await.unwrap());
    }
}
