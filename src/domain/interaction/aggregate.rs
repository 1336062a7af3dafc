//! Interaction aggregate - one participant's run through the exchanges.
//!
//! The interaction owns the ordered exchange list and the cursor pointing at
//! the current one. The cursor only moves through [`Interaction::advance`].
//!
//! # Invariants
//!
//! - `exchanges` is fixed at creation and never empty
//! - `current_exchange < exchanges.len()` at all times
//! - `completed` implies the cursor is on the last exchange and that
//!   exchange is completed

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::conversation::{Agent, Message};
use crate::domain::exchange::Exchange;
use crate::domain::foundation::{DomainError, ErrorCode, ExchangeId, InteractionId, Timestamp};

/// Where the cursor went after an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advancement {
    /// The cursor moved to this index and that exchange was activated.
    Moved(usize),
    /// The last exchange was left; the interaction is complete.
    Completed,
    /// Nothing happened, the interaction was already complete.
    AlreadyCompleted,
}

/// Interaction aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    id: InteractionId,
    participant: Agent,
    name: String,
    /// Interview description sent to the assistant.
    description: String,
    participant_instructions: String,
    participant_end_text: String,
    exchanges: Vec<Exchange>,
    /// Prompts carry the messages of dismissed exchanges.
    #[serde(default)]
    send_all_messages: bool,
    current_exchange: usize,
    started: bool,
    completed: bool,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Interaction {
    /// Creates a not-yet-started interaction.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `exchanges` is empty
    pub fn new(
        participant: Agent,
        name: impl Into<String>,
        description: impl Into<String>,
        participant_instructions: impl Into<String>,
        participant_end_text: impl Into<String>,
        exchanges: Vec<Exchange>,
    ) -> Result<Self, DomainError> {
        if exchanges.is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "An interaction needs at least one exchange",
            ));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: InteractionId::new(),
            participant,
            name: name.into(),
            description: description.into(),
            participant_instructions: participant_instructions.into(),
            participant_end_text: participant_end_text.into(),
            exchanges,
            send_all_messages: false,
            current_exchange: 0,
            started: false,
            completed: false,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> InteractionId {
        self.id
    }

    pub fn participant(&self) -> &Agent {
        &self.participant
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn participant_instructions(&self) -> &str {
        &self.participant_instructions
    }

    /// Sets whether prompts carry the messages of dismissed exchanges.
    pub fn with_send_all_messages(mut self, send_all_messages: bool) -> Self {
        self.send_all_messages = send_all_messages;
        self
    }

    pub fn sends_all_messages(&self) -> bool {
        self.send_all_messages
    }

    pub fn participant_end_text(&self) -> &str {
        &self.participant_end_text
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Index of the current exchange.
    pub fn current_index(&self) -> usize {
        self.current_exchange
    }

    /// The exchange under the cursor.
    ///
    /// Only `None` for a snapshot that was stored without exchanges.
    pub fn current_exchange(&self) -> Option<&Exchange> {
        self.exchanges.get(self.current_exchange)
    }

    pub fn exchange(&self, id: ExchangeId) -> Option<&Exchange> {
        self.exchanges.iter().find(|e| e.id() == id)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Messages of every dismissed exchange, in exchange order.
    pub fn past_messages(&self) -> Vec<&Message> {
        self.exchanges
            .iter()
            .filter(|e| e.is_dismissed())
            .flat_map(|e| e.messages())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts the interaction and activates the current exchange.
    ///
    /// Returns false if it was already started.
    pub fn start(&mut self) -> Result<bool, DomainError> {
        if self.started {
            return Ok(false);
        }
        let now = Timestamp::now();
        self.started = true;
        self.started_at = Some(now);
        self.activate_current()?;
        self.updated_at = now;
        Ok(true)
    }

    /// Moves the cursor past the current exchange.
    ///
    /// # Errors
    ///
    /// - `InteractionNotStarted` before `start`
    /// - `ExchangeNotCompleted` if the current exchange is still open
    pub fn advance(&mut self) -> Result<Advancement, DomainError> {
        if self.completed {
            return Ok(Advancement::AlreadyCompleted);
        }
        if !self.started {
            return Err(DomainError::new(
                ErrorCode::InteractionNotStarted,
                "Start the interaction before advancing",
            ));
        }
        let current = self.current_exchange().ok_or_else(|| self.missing_current())?;
        if !current.is_completed() {
            return Err(DomainError::new(
                ErrorCode::ExchangeNotCompleted,
                format!("Exchange {} is not completed yet", current.id()),
            ));
        }

        let now = Timestamp::now();
        self.updated_at = now;
        if self.current_exchange + 1 >= self.exchanges.len() {
            self.completed = true;
            self.completed_at = Some(now);
            return Ok(Advancement::Completed);
        }
        self.current_exchange += 1;
        self.activate_current()?;
        Ok(Advancement::Moved(self.current_exchange))
    }

    /// Replaces the exchange with the same id.
    ///
    /// Returns false (and changes nothing) when no exchange matches.
    pub fn update_exchange(&mut self, exchange: Exchange) -> bool {
        match self.exchanges.iter_mut().find(|e| e.id() == exchange.id()) {
            Some(slot) => {
                *slot = exchange;
                self.updated_at = Timestamp::now();
                true
            }
            None => {
                debug!(
                    interaction_id = %self.id,
                    exchange_id = %exchange.id(),
                    "Ignoring update for unknown exchange"
                );
                false
            }
        }
    }

    fn activate_current(&mut self) -> Result<(), DomainError> {
        let index = self.current_exchange;
        let exchange = self
            .exchanges
            .get_mut(index)
            .ok_or_else(|| DomainError::new(ErrorCode::ExchangeNotFound, "No current exchange"))?;
        exchange.activate()?;
        Ok(())
    }

    fn missing_current(&self) -> DomainError {
        DomainError::new(ErrorCode::ExchangeNotFound, "No current exchange")
            .with_detail("interaction_id", self.id.to_string())
            .with_detail("index", self.current_exchange.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exchange::{ExchangeConfig, ExchangeStatus, SubmitOutcome};
    use crate::domain::foundation::AgentId;

    fn member() -> Agent {
        Agent::participant(AgentId::new("member-1"), "Member")
    }

    fn exchange(name: &str, hard_limit: bool) -> Exchange {
        Exchange::new(ExchangeConfig {
            name: name.to_string(),
            participant_cue: format!("{} cue", name),
            nb_follow_up_questions: 0,
            hard_limit,
            ..Default::default()
        })
    }

    fn interaction(count: usize) -> Interaction {
        let exchanges = (0..count).map(|i| exchange(&format!("ex{}", i), true)).collect();
        Interaction::new(member(), "Interview", "desc", "welcome", "bye", exchanges).unwrap()
    }

    /// Submits one message to the current exchange, closing it under a hard limit.
    fn finish_current(ix: &mut Interaction) {
        let mut ex = ix.current_exchange().unwrap().clone();
        assert_eq!(ex.submit(&member(), "answer").unwrap(), SubmitOutcome::Advance);
        assert!(ix.update_exchange(ex));
    }

    mod creation {
        use super::*;

        #[test]
        fn rejects_empty_exchange_list() {
            let err = Interaction::new(member(), "n", "d", "i", "e", vec![]).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }

        #[test]
        fn starts_unstarted_on_first_exchange() {
            let ix = interaction(2);
            assert!(!ix.is_started());
            assert_eq!(ix.current_index(), 0);
            assert_eq!(ix.current_exchange().unwrap().status(), ExchangeStatus::Pending);
        }
    }

    mod start {
        use super::*;

        #[test]
        fn start_activates_current_exchange_with_cue() {
            let mut ix = interaction(2);
            assert!(ix.start().unwrap());

            let current = ix.current_exchange().unwrap();
            assert!(current.is_started());
            assert_eq!(current.messages()[0].content(), "ex0 cue");
            assert!(ix.started_at().is_some());
        }

        #[test]
        fn start_twice_keeps_first_timestamp() {
            let mut ix = interaction(1);
            ix.start().unwrap();
            let first = ix.started_at();
            assert!(!ix.start().unwrap());
            assert_eq!(ix.started_at(), first);
        }
    }

    mod advance {
        use super::*;

        #[test]
        fn advance_before_start_is_rejected() {
            let mut ix = interaction(2);
            assert_eq!(ix.advance().unwrap_err().code, ErrorCode::InteractionNotStarted);
        }

        #[test]
        fn advance_requires_completed_exchange() {
            let mut ix = interaction(2);
            ix.start().unwrap();
            assert_eq!(ix.advance().unwrap_err().code, ErrorCode::ExchangeNotCompleted);
            assert_eq!(ix.current_index(), 0);
        }

        #[test]
        fn advance_moves_cursor_and_activates_next() {
            let mut ix = interaction(2);
            ix.start().unwrap();
            finish_current(&mut ix);

            assert_eq!(ix.advance().unwrap(), Advancement::Moved(1));
            assert!(ix.current_exchange().unwrap().is_started());
            assert!(!ix.is_completed());
        }

        #[test]
        fn advancing_from_last_completes_without_moving_cursor() {
            let mut ix = interaction(2);
            ix.start().unwrap();
            finish_current(&mut ix);
            ix.advance().unwrap();
            finish_current(&mut ix);

            assert_eq!(ix.advance().unwrap(), Advancement::Completed);
            assert!(ix.is_completed());
            assert!(ix.completed_at().is_some());
            assert_eq!(ix.current_index(), 1);

            assert_eq!(ix.advance().unwrap(), Advancement::AlreadyCompleted);
            assert_eq!(ix.current_index(), 1);
        }
    }

    mod exchanges {
        use super::*;

        #[test]
        fn update_with_unknown_id_is_a_no_op() {
            let mut ix = interaction(1);
            let before = ix.clone();
            assert!(!ix.update_exchange(exchange("stranger", false)));
            assert_eq!(ix, before);
        }

        #[test]
        fn update_is_idempotent() {
            let mut ix = interaction(2);
            ix.start().unwrap();
            let mut ex = ix.current_exchange().unwrap().clone();
            ex.submit(&member(), "hi").unwrap();

            ix.update_exchange(ex.clone());
            let once = ix.exchanges().to_vec();
            ix.update_exchange(ex);
            assert_eq!(ix.exchanges(), once.as_slice());
        }

        #[test]
        fn past_messages_collects_dismissed_exchanges_in_order() {
            let mut ix = interaction(3);
            ix.start().unwrap();
            assert!(ix.past_messages().is_empty());

            finish_current(&mut ix);
            ix.advance().unwrap();
            finish_current(&mut ix);
            ix.advance().unwrap();

            let past: Vec<_> = ix.past_messages().iter().map(|m| m.content().to_string()).collect();
            assert_eq!(past, vec!["ex0 cue", "answer", "ex1 cue", "answer"]);
        }
    }

    #[test]
    fn snapshot_survives_json() {
        let mut ix = interaction(2);
        ix.start().unwrap();
        let json = serde_json::to_string(&ix).unwrap();
        assert!(json.contains("\"currentExchange\":0"));
        let back: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ix);
    }
}
