//! Conversation review - researcher-side reads and resets of stored
//! interactions.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::conversation::Message;
use crate::domain::foundation::{InteractionId, ParticipantId, Timestamp};
use crate::ports::{AppDataFilter, AppDataStore};

use super::persistence::{decode, InteractionRecorder, PersistenceError, INTERACTION_TYPE};

/// One line of the review listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionSummary {
    pub participant: ParticipantId,
    pub interaction_id: InteractionId,
    pub started: bool,
    pub completed: bool,
    /// Exchanges dismissed so far.
    pub exchanges_done: usize,
    pub exchanges_total: usize,
    pub updated_at: Timestamp,
}

/// Everything said in one participant's interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub participant: ParticipantId,
    /// Messages of dismissed exchanges.
    pub past_messages: Vec<Message>,
    /// Messages of the exchange in progress, if any.
    pub live_messages: Vec<Message>,
    pub completed: bool,
}

impl Transcript {
    /// Past then live messages.
    pub fn all_messages(&self) -> impl Iterator<Item = &Message> {
        self.past_messages.iter().chain(self.live_messages.iter())
    }
}

pub struct ConversationReview {
    store: Arc<dyn AppDataStore>,
}

impl ConversationReview {
    pub fn new(store: Arc<dyn AppDataStore>) -> Self {
        Self { store }
    }

    /// Summaries of every stored interaction. Undecodable records are
    /// skipped with a warning.
    pub async fn list(&self) -> Result<Vec<InteractionSummary>, PersistenceError> {
        let records = self.store.list(&AppDataFilter::of_type(INTERACTION_TYPE)).await?;

        let mut summaries = Vec::with_capacity(records.len());
        for record in &records {
            let interaction = match decode(record) {
                Ok(interaction) => interaction,
                Err(err) => {
                    warn!(record_id = %record.id, owner = %record.owner, error = %err, "Skipping undecodable interaction");
                    continue;
                }
            };
            summaries.push(InteractionSummary {
                participant: record.owner.clone(),
                interaction_id: interaction.id(),
                started: interaction.is_started(),
                completed: interaction.is_completed(),
                exchanges_done: interaction.exchanges().iter().filter(|e| e.is_dismissed()).count(),
                exchanges_total: interaction.exchanges().len(),
                updated_at: interaction.updated_at(),
            });
        }
        Ok(summaries)
    }

    /// The participant's transcript, or `None` if they have no record.
    pub async fn transcript(&self, participant: &ParticipantId) -> Result<Option<Transcript>, PersistenceError> {
        let mut recorder = InteractionRecorder::new(Arc::clone(&self.store), participant.clone());
        let Some(interaction) = recorder.find().await? else {
            return Ok(None);
        };

        let live_messages = match interaction.current_exchange() {
            Some(exchange) if interaction.is_started() => exchange.live_messages().to_vec(),
            _ => Vec::new(),
        };
        Ok(Some(Transcript {
            participant: participant.clone(),
            past_messages: interaction.past_messages().into_iter().cloned().collect(),
            live_messages,
            completed: interaction.is_completed(),
        }))
    }

    /// Deletes the participant's record so their next visit starts afresh.
    pub async fn reset(&self, participant: &ParticipantId) -> Result<bool, PersistenceError> {
        let deleted = InteractionRecorder::new(Arc::clone(&self.store), participant.clone())
            .delete()
            .await?;
        if deleted {
            info!(participant = %participant, "Interaction reset");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAppDataStore;
    use crate::domain::conversation::Agent;
    use crate::domain::exchange::SubmitOutcome;
    use crate::domain::foundation::AgentId;
    use crate::domain::interaction::Interaction;
    use crate::domain::settings::AllSettings;
    use crate::ports::NewAppData;
    use serde_json::json;

    fn participant(id: &str) -> ParticipantId {
        ParticipantId::new(id).unwrap()
    }

    async fn store_interaction(store: &Arc<InMemoryAppDataStore>, id: &str, talk: bool) {
        let agent = Agent::participant(AgentId::new(id), "Member");
        let mut interaction = Interaction::from_settings(agent.clone(), &AllSettings::default()).unwrap();
        if talk {
            interaction.start().unwrap();
            let mut exchange = interaction.current_exchange().unwrap().clone();
            if let SubmitOutcome::AwaitReply(request) = exchange.submit(&agent, "hello").unwrap() {
                exchange.apply_reply(request.generation, "hi there");
            }
            interaction.update_exchange(exchange);
        }
        let mut recorder = InteractionRecorder::new(store.clone(), participant(id));
        recorder.save(&interaction).await.unwrap();
    }

    #[tokio::test]
    async fn list_summarizes_stored_interactions() {
        let store = Arc::new(InMemoryAppDataStore::new());
        store_interaction(&store, "member-1", true).await;
        store_interaction(&store, "member-2", false).await;

        let review = ConversationReview::new(store);
        let mut summaries = review.list().await.unwrap();
        summaries.sort_by(|a, b| a.participant.as_str().cmp(b.participant.as_str()));

        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].started);
        assert!(!summaries[1].started);
        assert_eq!(summaries[0].exchanges_total, 1);
        assert_eq!(summaries[0].exchanges_done, 0);
    }

    #[tokio::test]
    async fn list_skips_undecodable_records() {
        let store = Arc::new(InMemoryAppDataStore::new());
        store_interaction(&store, "member-1", false).await;
        store
            .create(
                &participant("member-9"),
                NewAppData {
                    data: json!("broken"),
                    data_type: INTERACTION_TYPE.to_string(),
                },
            )
            .await
            .unwrap();

        let summaries = ConversationReview::new(store).list().await.unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[tokio::test]
    async fn transcript_includes_live_buffer() {
        let store = Arc::new(InMemoryAppDataStore::new());
        store_interaction(&store, "member-1", true).await;

        let transcript = ConversationReview::new(store)
            .transcript(&participant("member-1"))
            .await
            .unwrap()
            .unwrap();

        assert!(transcript.past_messages.is_empty());
        let contents: Vec<_> = transcript.all_messages().map(|m| m.content()).collect();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1..], ["hello", "hi there"]);
        assert!(!transcript.completed);
    }

    #[tokio::test]
    async fn transcript_of_unknown_participant_is_none() {
        let review = ConversationReview::new(Arc::new(InMemoryAppDataStore::new()));
        assert!(review.transcript(&participant("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_deletes_record() {
        let store = Arc::new(InMemoryAppDataStore::new());
        store_interaction(&store, "member-1", true).await;
        let review = ConversationReview::new(store.clone());

        assert!(review.reset(&participant("member-1")).await.unwrap());
        assert!(store.is_empty().await);
        assert!(!review.reset(&participant("member-1")).await.unwrap());
    }
}
