//! Property tests for interaction progression.
//!
//! Random sequences of participant actions are applied to an interaction and
//! the structural guarantees are checked after every step.

use proptest::prelude::*;

use interview_chatbot::domain::conversation::Agent;
use interview_chatbot::domain::exchange::{ExchangeStatus, SubmitOutcome};
use interview_chatbot::domain::foundation::AgentId;
use interview_chatbot::domain::interaction::Interaction;
use interview_chatbot::domain::settings::{AllSettings, ExchangeSettings, ExchangesSettings};

#[derive(Debug, Clone)]
enum Action {
    Submit(String),
    Reply,
    Fail,
    Retry,
    Dismiss,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => "[ a-z]{0,8}".prop_map(Action::Submit),
        3 => Just(Action::Reply),
        1 => Just(Action::Fail),
        1 => Just(Action::Retry),
        2 => Just(Action::Dismiss),
    ]
}

fn limits() -> impl Strategy<Value = Vec<(u32, bool)>> {
    prop::collection::vec((0u32..4, any::<bool>()), 1..5)
}

fn member() -> Agent {
    Agent::participant(AgentId::new("member-1"), "Member")
}

fn interaction(limits: &[(u32, bool)]) -> Interaction {
    let settings = AllSettings {
        exchanges: ExchangesSettings {
            exchanges_list: limits
                .iter()
                .map(|(max, hard)| ExchangeSettings {
                    nb_follow_up_questions: *max,
                    hard_limit: *hard,
                    ..Default::default()
                })
                .collect(),
        },
        ..Default::default()
    };
    let mut ix = Interaction::from_settings(member(), &settings).unwrap();
    ix.start().unwrap();
    ix
}

/// Applies one action the way the session does, ignoring refused ones.
fn apply(ix: &mut Interaction, action: &Action) {
    if ix.is_completed() {
        return;
    }
    let Some(current) = ix.current_exchange() else {
        return;
    };
    let mut exchange = current.clone();
    let generation = exchange.reply_generation();

    let advance = match action {
        Action::Submit(content) => matches!(exchange.submit(&member(), content), Ok(SubmitOutcome::Advance)),
        Action::Reply => {
            exchange.apply_reply(generation, "reply");
            false
        }
        Action::Fail => {
            exchange.fail_reply(generation, "down");
            false
        }
        Action::Retry => {
            let _ = exchange.retry_reply();
            false
        }
        Action::Dismiss => exchange.dismiss(false).is_ok(),
    };

    assert!(ix.update_exchange(exchange));
    if advance {
        ix.advance().unwrap();
    }
}

proptest! {
    #[test]
    fn cursor_stays_in_bounds(limits in limits(), actions in prop::collection::vec(action(), 0..40)) {
        let mut ix = interaction(&limits);
        for action in &actions {
            apply(&mut ix, action);
            prop_assert!(ix.current_index() < ix.exchanges().len());
            prop_assert!(ix.current_exchange().unwrap().is_started());
        }
    }

    #[test]
    fn dismissed_exchanges_are_completed_and_precede_cursor(
        limits in limits(),
        actions in prop::collection::vec(action(), 0..40),
    ) {
        let mut ix = interaction(&limits);
        for action in &actions {
            apply(&mut ix, action);
            for (index, exchange) in ix.exchanges().iter().enumerate() {
                if exchange.is_dismissed() {
                    prop_assert!(exchange.is_completed());
                    prop_assert!(index <= ix.current_index());
                }
                if index > ix.current_index() {
                    prop_assert!(!exchange.is_started());
                    prop_assert_eq!(exchange.status(), ExchangeStatus::Pending);
                }
            }
            prop_assert_eq!(
                ix.is_completed(),
                ix.exchanges().last().map(|e| e.is_dismissed()).unwrap_or(false)
            );
        }
    }

    #[test]
    fn accepted_submission_counts_exactly_once(
        limits in limits(),
        content in "[a-z]{1,8}",
    ) {
        let mut ix = interaction(&limits);
        let before = ix.current_exchange().unwrap().sent_message_count();
        let messages = ix.current_exchange().unwrap().messages().len();

        apply(&mut ix, &Action::Submit(content.clone()));

        let first = &ix.exchanges()[0];
        prop_assert_eq!(first.sent_message_count(), before + 1);
        prop_assert_eq!(first.messages().len(), messages + 1);
        prop_assert_eq!(first.messages().last().unwrap().content(), content.as_str());
    }

    #[test]
    fn messages_are_append_only(limits in limits(), actions in prop::collection::vec(action(), 0..30)) {
        let mut ix = interaction(&limits);
        for action in &actions {
            let before: Vec<Vec<_>> = ix.exchanges().iter().map(|e| e.messages().to_vec()).collect();
            apply(&mut ix, action);
            for (old, exchange) in before.iter().zip(ix.exchanges()) {
                prop_assert!(exchange.messages().starts_with(old));
            }
        }
    }

    #[test]
    fn updating_with_same_exchange_is_idempotent(limits in limits()) {
        let mut ix = interaction(&limits);
        let snapshot = ix.current_exchange().unwrap().clone();

        prop_assert!(ix.update_exchange(snapshot.clone()));
        let once = ix.exchanges().to_vec();
        prop_assert!(ix.update_exchange(snapshot));
        prop_assert_eq!(ix.exchanges(), once.as_slice());
    }
}
