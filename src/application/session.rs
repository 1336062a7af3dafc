//! Interaction session - drives one participant through the interview.
//!
//! The session owns the participant's [`Interaction`], routes every exchange
//! mutation through [`Interaction::update_exchange`], and pushes the full
//! snapshot to the store after each change. Store failures never roll back
//! the in-memory state; they are reported as [`SyncStatus::Failed`] and the
//! next save (or [`InteractionSession::retry_sync`]) sends the snapshot again.
//!
//! # Replies
//!
//! `submit` only records the participant message and returns a
//! [`PendingReply`] carrying the prompt. The caller runs the completion
//! (through [`InteractionSession::completion_service`]) and hands the result
//! to `apply_reply`. Anything that happens in between, such as a dismissal,
//! invalidates the reply's generation and the late completion is dropped.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::InteractionConfig;
use crate::domain::conversation::{Agent, Message};
use crate::domain::exchange::{
    build_prompt, Exchange, PromptEntry, PromptFraming, ReplyRequest, ReplyResolution, SubmitOutcome,
};
use crate::domain::foundation::{DomainError, ErrorCode, ExchangeId, MessageId, ParticipantId};
use crate::domain::interaction::{Advancement, Interaction};
use crate::domain::settings::AllSettings;
use crate::ports::{AppDataStore, Completion, CompletionError, CompletionService};

use super::persistence::{InteractionRecorder, PersistenceError, SyncStatus};
use super::view::ParticipantView;

/// Failure reason recorded for a reply interrupted by a closed session.
pub const INTERRUPTED_REPLY: &str = "interrupted";

/// Behaviour switches for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub prompt_framing: PromptFraming,
    /// Prefix prompts with the messages of dismissed exchanges, even when the
    /// interaction's own chat setting leaves it off.
    pub send_all_messages: bool,
    /// Refuse dismissal while the closing reply is in flight.
    pub await_closing_reply: bool,
}

impl From<&InteractionConfig> for SessionOptions {
    fn from(config: &InteractionConfig) -> Self {
        Self {
            prompt_framing: config.prompt_framing,
            send_all_messages: config.send_all_messages,
            await_closing_reply: config.await_closing_reply,
        }
    }
}

/// An assistant reply the session is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub exchange_id: ExchangeId,
    pub generation: u64,
    pub prompt: Vec<PromptEntry>,
}

/// What a session operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Started,
    AlreadyStarted,
    /// Blank submission, nothing recorded.
    Ignored,
    AwaitingReply(PendingReply),
    Replied(MessageId),
    /// The reply belonged to an invalidated generation and was dropped.
    StaleReply,
    Advanced(Advancement),
}

/// Result of a session operation together with its persistence outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub sync: SyncStatus,
}

impl StepReport {
    fn unchanged(step: Step) -> Self {
        Self {
            step,
            sync: SyncStatus::Unchanged,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("failed to load interaction: {0}")]
    Load(#[from] PersistenceError),

    /// The assistant call failed; the exchange now shows a retryable failure.
    #[error("assistant reply failed: {source}")]
    Reply { source: CompletionError, sync: SyncStatus },
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Domain(_) => false,
            SessionError::Load(err) => err.is_retryable(),
            SessionError::Reply { source, .. } => source.is_retryable(),
        }
    }

    /// Domain error code, when the failure came from a rule violation.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            SessionError::Domain(err) => Some(err.code),
            _ => None,
        }
    }
}

pub struct InteractionSession {
    interaction: Interaction,
    recorder: InteractionRecorder,
    completion: Arc<dyn CompletionService>,
    options: SessionOptions,
    last_sync: SyncStatus,
}

impl InteractionSession {
    /// Loads the participant's interaction, or materializes and stores a new
    /// one from `settings`.
    ///
    /// A stored interaction is used as-is; later settings edits never reach it.
    /// A reply still pending in the stored snapshot is marked failed so it
    /// can be retried.
    pub async fn open(
        participant: Agent,
        store: Arc<dyn AppDataStore>,
        settings: &AllSettings,
        completion: Arc<dyn CompletionService>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let participant_id = ParticipantId::new(participant.id.as_str()).map_err(DomainError::from)?;
        let mut recorder = InteractionRecorder::new(store, participant_id);

        let (interaction, last_sync) = match recorder.find().await? {
            Some(mut existing) => {
                info!(interaction_id = %existing.id(), "Resuming interaction");
                if interrupt_pending_reply(&mut existing) {
                    let sync = recorder.sync(&existing).await;
                    (existing, sync)
                } else {
                    (existing, SyncStatus::Unchanged)
                }
            }
            None => {
                let fresh = Interaction::from_settings(participant, settings)?;
                info!(
                    interaction_id = %fresh.id(),
                    exchanges = fresh.exchanges().len(),
                    "Materialized interaction from settings"
                );
                let sync = recorder.sync(&fresh).await;
                (fresh, sync)
            }
        };

        Ok(Self {
            interaction,
            recorder,
            completion,
            options,
            last_sync,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Outcome of the most recent store call.
    pub fn last_sync(&self) -> &SyncStatus {
        &self.last_sync
    }

    /// Messages of every dismissed exchange, in exchange order.
    pub fn past_messages(&self) -> Vec<&Message> {
        self.interaction.past_messages()
    }

    /// The service used for assistant replies, for running a pending reply
    /// without holding the session.
    pub fn completion_service(&self) -> Arc<dyn CompletionService> {
        Arc::clone(&self.completion)
    }

    pub fn view(&self) -> ParticipantView {
        ParticipantView::of(&self.interaction, self.options.await_closing_reply)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts the interview and activates the first exchange.
    pub async fn start(&mut self) -> Result<StepReport, SessionError> {
        if !self.interaction.start()? {
            return Ok(StepReport::unchanged(Step::AlreadyStarted));
        }
        info!(interaction_id = %self.interaction.id(), "Interaction started");
        Ok(self.persist(Step::Started).await)
    }

    /// Records a participant message in the current exchange.
    ///
    /// Returns `AwaitingReply` with the prompt to complete, or `Advanced`
    /// when a hard limit closed the exchange.
    pub async fn submit(&mut self, content: &str) -> Result<StepReport, SessionError> {
        let mut exchange = self.active_exchange()?.clone();
        match exchange.submit(self.interaction.participant(), content)? {
            SubmitOutcome::Ignored => Ok(StepReport::unchanged(Step::Ignored)),
            SubmitOutcome::AwaitReply(request) => {
                let pending = self.pending_reply(&exchange, &request);
                self.interaction.update_exchange(exchange);
                debug!(
                    interaction_id = %self.interaction.id(),
                    exchange_id = %pending.exchange_id,
                    generation = pending.generation,
                    "Awaiting assistant reply"
                );
                Ok(self.persist(Step::AwaitingReply(pending)).await)
            }
            SubmitOutcome::Advance => {
                let exchange_id = exchange.id();
                self.interaction.update_exchange(exchange);
                let advancement = self.interaction.advance()?;
                info!(
                    interaction_id = %self.interaction.id(),
                    %exchange_id,
                    ?advancement,
                    "Hard limit reached, exchange dismissed"
                );
                Ok(self.persist(Step::Advanced(advancement)).await)
            }
        }
    }

    /// Folds the outcome of an assistant call back into its exchange.
    ///
    /// # Errors
    ///
    /// `SessionError::Reply` when the call failed. The exchange is left in
    /// its reply-failed state and the snapshot has been saved.
    pub async fn apply_reply(
        &mut self,
        pending: &PendingReply,
        result: Result<Completion, CompletionError>,
    ) -> Result<StepReport, SessionError> {
        let Some(exchange) = self.interaction.exchange(pending.exchange_id) else {
            debug!(exchange_id = %pending.exchange_id, "Reply for unknown exchange dropped");
            return Ok(StepReport::unchanged(Step::StaleReply));
        };
        let mut exchange = exchange.clone();

        match result {
            Ok(completion) => match exchange.apply_reply(pending.generation, completion.completion) {
                ReplyResolution::Applied(message_id) => {
                    self.interaction.update_exchange(exchange);
                    debug!(
                        exchange_id = %pending.exchange_id,
                        generation = pending.generation,
                        "Assistant reply applied"
                    );
                    Ok(self.persist(Step::Replied(message_id)).await)
                }
                ReplyResolution::Stale => {
                    debug!(
                        exchange_id = %pending.exchange_id,
                        generation = pending.generation,
                        "Stale assistant reply dropped"
                    );
                    Ok(StepReport::unchanged(Step::StaleReply))
                }
            },
            Err(err) => {
                if !exchange.fail_reply(pending.generation, err.to_string()) {
                    debug!(generation = pending.generation, error = %err, "Failure of stale reply ignored");
                    return Ok(StepReport::unchanged(Step::StaleReply));
                }
                self.interaction.update_exchange(exchange);
                warn!(
                    interaction_id = %self.interaction.id(),
                    exchange_id = %pending.exchange_id,
                    generation = pending.generation,
                    error = %err,
                    "Assistant reply failed"
                );
                let sync = self.retry_sync().await;
                Err(SessionError::Reply { source: err, sync })
            }
        }
    }

    /// Runs the completion for `pending` and applies the result.
    pub async fn fulfil(&mut self, pending: PendingReply) -> Result<StepReport, SessionError> {
        let result = self.completion.complete(&pending.prompt).await;
        self.apply_reply(&pending, result).await
    }

    /// Submits `content` and, if a reply is needed, waits for it.
    pub async fn send(&mut self, content: &str) -> Result<StepReport, SessionError> {
        let report = self.submit(content).await?;
        match report.step {
            Step::AwaitingReply(pending) => self.fulfil(pending).await,
            _ => Ok(report),
        }
    }

    /// Re-issues the failed reply of the current exchange.
    pub async fn retry_reply(&mut self) -> Result<StepReport, SessionError> {
        let mut exchange = self.active_exchange()?.clone();
        let request = exchange.retry_reply()?;
        let pending = self.pending_reply(&exchange, &request);
        self.interaction.update_exchange(exchange);
        info!(
            exchange_id = %pending.exchange_id,
            generation = pending.generation,
            "Retrying assistant reply"
        );
        Ok(self.persist(Step::AwaitingReply(pending)).await)
    }

    /// Closes the completed current exchange and moves on.
    pub async fn dismiss(&mut self) -> Result<StepReport, SessionError> {
        let mut exchange = self.active_exchange()?.clone();
        exchange.dismiss(self.options.await_closing_reply)?;
        let exchange_id = exchange.id();
        self.interaction.update_exchange(exchange);
        let advancement = self.interaction.advance()?;
        info!(
            interaction_id = %self.interaction.id(),
            %exchange_id,
            ?advancement,
            "Exchange dismissed"
        );
        Ok(self.persist(Step::Advanced(advancement)).await)
    }

    /// Sends the current snapshot again, typically after a failed save.
    pub async fn retry_sync(&mut self) -> SyncStatus {
        let sync = self.recorder.sync(&self.interaction).await;
        self.last_sync = sync.clone();
        sync
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn active_exchange(&self) -> Result<&Exchange, DomainError> {
        if !self.interaction.is_started() {
            return Err(DomainError::new(
                ErrorCode::InteractionNotStarted,
                "Start the interaction first",
            ));
        }
        if self.interaction.is_completed() {
            return Err(DomainError::new(
                ErrorCode::InteractionCompleted,
                "The interaction is already completed",
            ));
        }
        self.interaction
            .current_exchange()
            .ok_or_else(|| DomainError::new(ErrorCode::ExchangeNotFound, "No current exchange"))
    }

    fn pending_reply(&self, exchange: &Exchange, request: &ReplyRequest) -> PendingReply {
        let send_all = self.options.send_all_messages || self.interaction.sends_all_messages();
        let mut thread: Vec<Message> = if send_all {
            self.interaction.past_messages().into_iter().cloned().collect()
        } else {
            Vec::new()
        };
        thread.extend_from_slice(exchange.thread_before(request.message.id()));

        let prompt = build_prompt(
            &thread,
            &request.message,
            exchange,
            self.interaction.description(),
            self.options.prompt_framing,
        );
        PendingReply {
            exchange_id: request.exchange_id,
            generation: request.generation,
            prompt,
        }
    }

    async fn persist(&mut self, step: Step) -> StepReport {
        let sync = self.recorder.sync(&self.interaction).await;
        self.last_sync = sync.clone();
        StepReport { step, sync }
    }
}

/// A reply left pending in a stored snapshot belongs to a session that no
/// longer exists. Marks it failed so the participant can retry it.
fn interrupt_pending_reply(interaction: &mut Interaction) -> bool {
    if interaction.is_completed() {
        return false;
    }
    let Some(current) = interaction.current_exchange() else {
        return false;
    };
    let mut exchange = current.clone();
    if !exchange.interrupt_pending_reply(INTERRUPTED_REPLY) {
        return false;
    }
    warn!(
        interaction_id = %interaction.id(),
        exchange_id = %exchange.id(),
        generation = exchange.reply_generation(),
        "Pending reply from an earlier session marked failed"
    );
    interaction.update_exchange(exchange)
}
