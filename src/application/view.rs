//! What the participant sees at any point of the interview.

use crate::domain::conversation::{Agent, Message};
use crate::domain::exchange::{ExchangeStatus, ReplyState};
use crate::domain::foundation::ExchangeId;
use crate::domain::interaction::Interaction;

/// The three screens of the participant flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantView {
    /// Before start: the interview's instructions.
    Start { instructions: String },
    Conversation(ConversationView),
    /// After the last exchange is dismissed.
    Finished { end_text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    pub exchange_id: ExchangeId,
    pub exchange_name: String,
    /// One-based position of the exchange.
    pub position: usize,
    pub total: usize,
    pub assistant: Agent,
    /// Messages of the current exchange only.
    pub thread: Vec<Message>,
    pub processing: bool,
    pub reply_error: Option<String>,
    /// Shown once the exchange reached its follow-up limit.
    pub completion_notice: Option<String>,
    pub can_dismiss: bool,
}

impl ParticipantView {
    pub fn of(interaction: &Interaction, await_closing_reply: bool) -> Self {
        if !interaction.is_started() {
            return ParticipantView::Start {
                instructions: interaction.participant_instructions().to_string(),
            };
        }
        let current = match interaction.current_exchange() {
            Some(exchange) if !interaction.is_completed() => exchange,
            _ => {
                return ParticipantView::Finished {
                    end_text: interaction.participant_end_text().to_string(),
                }
            }
        };

        let processing = current.status() == ExchangeStatus::Processing;
        let reply_error = match current.reply_state() {
            ReplyState::Failed { reason, .. } => Some(reason.clone()),
            _ => None,
        };
        let completion_notice = current
            .is_completed()
            .then(|| current.config().participant_instructions_on_complete.clone());

        ParticipantView::Conversation(ConversationView {
            exchange_id: current.id(),
            exchange_name: current.config().name.clone(),
            position: interaction.current_index() + 1,
            total: interaction.exchanges().len(),
            assistant: current.assistant().clone(),
            thread: current.live_messages().to_vec(),
            processing,
            reply_error,
            completion_notice,
            can_dismiss: current.is_completed() && !(await_closing_reply && processing),
        })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ParticipantView::Finished { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exchange::{Exchange, ExchangeConfig, SubmitOutcome};
    use crate::domain::foundation::AgentId;

    fn member() -> Agent {
        Agent::participant(AgentId::new("member-1"), "Member")
    }

    fn interaction(max: u32) -> Interaction {
        let config = ExchangeConfig {
            name: "Habits".to_string(),
            participant_cue: "Tell me about your habits".to_string(),
            participant_instructions_on_complete: "Press done".to_string(),
            nb_follow_up_questions: max,
            ..Default::default()
        };
        Interaction::new(
            member(),
            "Interview",
            "desc",
            "Read this first",
            "Goodbye",
            vec![Exchange::new(config)],
        )
        .unwrap()
    }

    fn submit(ix: &mut Interaction, content: &str) -> u64 {
        let mut exchange = ix.current_exchange().unwrap().clone();
        let generation = match exchange.submit(&member(), content).unwrap() {
            SubmitOutcome::AwaitReply(request) => request.generation,
            other => panic!("unexpected {:?}", other),
        };
        ix.update_exchange(exchange);
        generation
    }

    fn conversation(view: ParticipantView) -> ConversationView {
        match view {
            ParticipantView::Conversation(c) => c,
            other => panic!("Expected conversation, got {:?}", other),
        }
    }

    #[test]
    fn unstarted_interaction_shows_instructions() {
        let view = ParticipantView::of(&interaction(1), false);
        assert_eq!(
            view,
            ParticipantView::Start {
                instructions: "Read this first".to_string()
            }
        );
    }

    #[test]
    fn started_interaction_shows_cue_thread() {
        let mut ix = interaction(1);
        ix.start().unwrap();

        let view = conversation(ParticipantView::of(&ix, false));
        assert_eq!(view.exchange_name, "Habits");
        assert_eq!((view.position, view.total), (1, 1));
        assert_eq!(view.thread.len(), 1);
        assert_eq!(view.thread[0].content(), "Tell me about your habits");
        assert!(!view.can_dismiss);
        assert!(view.completion_notice.is_none());
    }

    #[test]
    fn completed_exchange_offers_dismissal() {
        let mut ix = interaction(0);
        ix.start().unwrap();
        submit(&mut ix, "I run");

        let view = conversation(ParticipantView::of(&ix, false));
        assert!(view.processing);
        assert!(view.can_dismiss);
        assert_eq!(view.completion_notice.as_deref(), Some("Press done"));

        let strict = conversation(ParticipantView::of(&ix, true));
        assert!(!strict.can_dismiss);
    }

    #[test]
    fn failed_reply_is_visible() {
        let mut ix = interaction(2);
        ix.start().unwrap();
        let generation = submit(&mut ix, "hello");
        let mut exchange = ix.current_exchange().unwrap().clone();
        exchange.fail_reply(generation, "timed out");
        ix.update_exchange(exchange);

        let view = conversation(ParticipantView::of(&ix, false));
        assert_eq!(view.reply_error.as_deref(), Some("timed out"));
        assert!(!view.processing);
    }

    #[test]
    fn completed_interaction_shows_end_text() {
        let mut ix = interaction(0);
        ix.start().unwrap();
        let generation = submit(&mut ix, "done");
        let mut exchange = ix.current_exchange().unwrap().clone();
        exchange.apply_reply(generation, "thanks");
        exchange.dismiss(false).unwrap();
        ix.update_exchange(exchange);
        ix.advance().unwrap();

        let view = ParticipantView::of(&ix, false);
        assert!(view.is_finished());
        assert_eq!(
            view,
            ParticipantView::Finished {
                end_text: "Goodbye".to_string()
            }
        );
    }
}
