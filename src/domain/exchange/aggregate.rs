//! Exchange aggregate - one configured conversational unit.
//!
//! An exchange owns its thread of messages and decides, after every
//! participant message, whether its follow-up budget is used up. It never
//! touches the interaction cursor: it reports `SubmitOutcome::Advance` (or the
//! caller dismisses it) and the interaction moves on.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Agent, Message};
use crate::domain::foundation::{
    AgentId, DomainError, ErrorCode, ExchangeId, MessageId, StateMachine, Timestamp,
};

use super::ExchangeStatus;

/// Configuration frozen into an exchange when its interaction is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeConfig {
    pub id: ExchangeId,
    pub name: String,
    pub description: String,
    /// Snapshot of the persona, not a live reference to the settings.
    pub assistant: Agent,
    /// System instructions sent to the assistant.
    pub chatbot_instructions: String,
    /// Opening line shown as the assistant's first turn.
    pub participant_cue: String,
    /// Shown to the participant once the exchange is completed.
    pub participant_instructions_on_complete: String,
    pub nb_follow_up_questions: u32,
    /// Dismiss without a closing reply once the budget is used.
    pub hard_limit: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            id: ExchangeId::new(),
            name: String::new(),
            description: String::new(),
            assistant: Agent::assistant(
                AgentId::generate(),
                "Default Assistant",
                "Default assistant description",
            ),
            chatbot_instructions: String::new(),
            participant_cue: String::new(),
            participant_instructions_on_complete: String::new(),
            nb_follow_up_questions: 0,
            hard_limit: false,
        }
    }
}

/// Bookkeeping for the assistant call belonging to the latest generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReplyState {
    #[default]
    Idle,
    Pending {
        generation: u64,
    },
    Failed {
        generation: u64,
        reason: String,
    },
}

/// A request for an assistant turn answering `message`.
///
/// The generation token ties the eventual completion to the request that
/// caused it; replies for an older generation are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub exchange_id: ExchangeId,
    pub generation: u64,
    pub message: Message,
}

/// What a participant submission led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank content; nothing changed.
    Ignored,
    /// The message was recorded and needs an assistant reply.
    AwaitReply(ReplyRequest),
    /// The hard limit closed the exchange; the interaction must advance.
    Advance,
}

/// What happened to an assistant completion handed back to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyResolution {
    Applied(MessageId),
    /// The generation no longer matches (newer request, or dismissed).
    Stale,
}

/// The Exchange aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(flatten)]
    config: ExchangeConfig,
    messages: Vec<Message>,
    sent_message_count: u32,
    started: bool,
    completed: bool,
    dismissed: bool,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    dismissed_at: Option<Timestamp>,
    #[serde(default)]
    reply_generation: u64,
    #[serde(default)]
    reply: ReplyState,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Exchange {
    /// Creates a not-yet-started exchange from its configuration.
    pub fn new(config: ExchangeConfig) -> Self {
        let now = Timestamp::now();
        Self {
            config,
            messages: Vec::new(),
            sent_message_count: 0,
            started: false,
            completed: false,
            dismissed: false,
            started_at: None,
            completed_at: None,
            dismissed_at: None,
            reply_generation: 0,
            reply: ReplyState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> ExchangeId {
        self.config.id
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn assistant(&self) -> &Agent {
        &self.config.assistant
    }

    /// Every message ever recorded, including those of a dismissed exchange.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages still shown in the live thread; empty once dismissed.
    pub fn live_messages(&self) -> &[Message] {
        if self.dismissed {
            &[]
        } else {
            &self.messages
        }
    }

    pub fn sent_message_count(&self) -> u32 {
        self.sent_message_count
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn dismissed_at(&self) -> Option<Timestamp> {
        self.dismissed_at
    }

    pub fn reply_state(&self) -> &ReplyState {
        &self.reply
    }

    pub fn reply_generation(&self) -> u64 {
        self.reply_generation
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Derives the lifecycle status from flags and reply bookkeeping.
    pub fn status(&self) -> ExchangeStatus {
        if self.dismissed {
            return ExchangeStatus::Dismissed;
        }
        if !self.started {
            return ExchangeStatus::Pending;
        }
        match self.reply {
            ReplyState::Pending { .. } => ExchangeStatus::Processing,
            ReplyState::Failed { .. } => ExchangeStatus::ReplyFailed,
            ReplyState::Idle if self.completed => ExchangeStatus::Completed,
            ReplyState::Idle => ExchangeStatus::AwaitingInput,
        }
    }

    /// Messages preceding the one a reply request answers.
    pub fn thread_before(&self, message_id: MessageId) -> &[Message] {
        let end = self
            .messages
            .iter()
            .position(|m| m.id() == message_id)
            .unwrap_or(self.messages.len());
        &self.messages[..end]
    }

    // ───────────────────────────────────────────────────────────────
    // Transitions
    // ───────────────────────────────────────────────────────────────

    /// Makes this the active exchange.
    ///
    /// Seeds the thread with the cue on first activation. Returns false if
    /// the exchange had already been started.
    pub fn activate(&mut self) -> Result<bool, DomainError> {
        if self.started {
            return Ok(false);
        }
        self.status().transition_to(ExchangeStatus::AwaitingInput)?;

        let now = Timestamp::now();
        self.started = true;
        self.started_at = Some(now);
        if self.messages.is_empty() {
            let cue = Message::new(self.config.assistant.clone(), self.config.participant_cue.clone());
            self.messages.push(cue);
        }
        self.updated_at = now;
        Ok(true)
    }

    /// Records a participant message and applies the completion rule.
    pub fn submit(&mut self, participant: &Agent, content: &str) -> Result<SubmitOutcome, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        let status = self.status();
        if status == ExchangeStatus::Processing {
            return Err(DomainError::new(
                ErrorCode::ReplyInFlight,
                "Wait for the assistant reply before sending another message",
            ));
        }
        if !status.accepts_input() {
            return Err(DomainError::new(
                ErrorCode::ExchangeNotActive,
                format!("Exchange {} is not accepting messages ({})", self.id(), status),
            ));
        }

        let message = Message::new(participant.clone(), content);
        let now = Timestamp::now();
        self.messages.push(message.clone());
        self.sent_message_count += 1;
        self.updated_at = now;

        if self.sent_message_count > self.config.nb_follow_up_questions {
            self.mark_completed(now);
        }

        if self.completed && self.config.hard_limit {
            status.transition_to(ExchangeStatus::Dismissed)?;
            self.close(now);
            return Ok(SubmitOutcome::Advance);
        }

        status.transition_to(ExchangeStatus::Processing)?;
        Ok(SubmitOutcome::AwaitReply(self.issue_reply(message)))
    }

    /// Appends the assistant's reply if `generation` is still the one awaited.
    pub fn apply_reply(&mut self, generation: u64, content: impl Into<String>) -> ReplyResolution {
        if !self.is_awaiting(generation) {
            return ReplyResolution::Stale;
        }
        let reply = Message::new(self.config.assistant.clone(), content);
        let id = reply.id();
        self.messages.push(reply);
        self.reply = ReplyState::Idle;
        self.updated_at = Timestamp::now();
        ReplyResolution::Applied(id)
    }

    /// Marks the awaited reply as failed. Returns false for a stale generation.
    pub fn fail_reply(&mut self, generation: u64, reason: impl Into<String>) -> bool {
        if !self.is_awaiting(generation) {
            return false;
        }
        self.reply = ReplyState::Failed {
            generation,
            reason: reason.into(),
        };
        self.updated_at = Timestamp::now();
        true
    }

    /// Turns a reply nobody is waiting for anymore into a failed one, so it
    /// can be retried. Returns false when no reply was pending.
    pub fn interrupt_pending_reply(&mut self, reason: impl Into<String>) -> bool {
        let ReplyState::Pending { generation } = self.reply else {
            return false;
        };
        self.fail_reply(generation, reason)
    }

    /// Re-issues the reply request for the last participant message.
    pub fn retry_reply(&mut self) -> Result<ReplyRequest, DomainError> {
        if !matches!(self.reply, ReplyState::Failed { .. }) || self.dismissed {
            return Err(DomainError::new(
                ErrorCode::NoReplyToRetry,
                "The exchange has no failed reply to retry",
            ));
        }
        self.status().transition_to(ExchangeStatus::Processing)?;

        let message = self
            .messages
            .iter()
            .rev()
            .find(|m| !m.is_from_assistant())
            .cloned()
            .ok_or_else(|| {
                DomainError::new(ErrorCode::NoReplyToRetry, "No participant message to answer")
            })?;
        self.updated_at = Timestamp::now();
        Ok(self.issue_reply(message))
    }

    /// Closes a completed exchange.
    ///
    /// With `await_closing_reply`, dismissal is refused while the closing
    /// reply is still in flight; otherwise that reply is invalidated.
    pub fn dismiss(&mut self, await_closing_reply: bool) -> Result<(), DomainError> {
        if !self.completed {
            return Err(DomainError::new(
                ErrorCode::ExchangeNotCompleted,
                format!("Exchange {} cannot be dismissed before it is completed", self.id()),
            ));
        }
        let status = self.status();
        if await_closing_reply && status == ExchangeStatus::Processing {
            return Err(DomainError::new(
                ErrorCode::ReplyInFlight,
                "The closing reply has not arrived yet",
            ));
        }
        status.transition_to(ExchangeStatus::Dismissed)?;
        self.close(Timestamp::now());
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────
    // Helpers
    // ───────────────────────────────────────────────────────────────

    fn mark_completed(&mut self, now: Timestamp) {
        self.completed = true;
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }

    fn close(&mut self, now: Timestamp) {
        self.dismissed = true;
        self.dismissed_at = Some(now);
        self.reply = ReplyState::Idle;
        self.updated_at = now;
    }

    fn issue_reply(&mut self, message: Message) -> ReplyRequest {
        self.reply_generation += 1;
        self.reply = ReplyState::Pending {
            generation: self.reply_generation,
        };
        ReplyRequest {
            exchange_id: self.id(),
            generation: self.reply_generation,
            message,
        }
    }

    fn is_awaiting(&self, generation: u64) -> bool {
        !self.dismissed && self.reply == ReplyState::Pending { generation }
    }
}
