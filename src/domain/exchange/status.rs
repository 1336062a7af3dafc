//! Exchange lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where an exchange stands in its lifecycle.
///
/// The status is derived from the exchange's persisted flags and reply
/// bookkeeping; it is never stored on its own.
///
/// - `Pending`: not yet the current exchange
/// - `AwaitingInput`: active, waiting for the participant
/// - `Processing`: an assistant reply is in flight
/// - `ReplyFailed`: the last assistant call failed and can be retried
/// - `Completed`: follow-up budget used, waiting for dismissal
/// - `Dismissed`: closed, messages moved into the interaction history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    Pending,
    AwaitingInput,
    Processing,
    ReplyFailed,
    Completed,
    Dismissed,
}

impl ExchangeStatus {
    /// Returns true if a participant message would be accepted.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::AwaitingInput | Self::ReplyFailed | Self::Completed)
    }
}

impl StateMachine for ExchangeStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ExchangeStatus::*;
        matches!(
            (self, target),
            (Pending, AwaitingInput)
                | (AwaitingInput, Processing)
                // hard limit reached on submission
                | (AwaitingInput, Dismissed)
                | (Processing, AwaitingInput)
                | (Processing, Completed)
                | (Processing, ReplyFailed)
                // dismissal while the closing reply is in flight
                | (Processing, Dismissed)
                | (ReplyFailed, Processing)
                | (ReplyFailed, Dismissed)
                | (Completed, Processing)
                | (Completed, Dismissed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ExchangeStatus::*;
        match self {
            Pending => vec![AwaitingInput],
            AwaitingInput => vec![Processing, Dismissed],
            Processing => vec![AwaitingInput, Completed, ReplyFailed, Dismissed],
            ReplyFailed => vec![Processing, Dismissed],
            Completed => vec![Processing, Dismissed],
            Dismissed => vec![],
        }
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExchangeStatus::Pending => "Pending",
            ExchangeStatus::AwaitingInput => "Awaiting Input",
            ExchangeStatus::Processing => "Processing",
            ExchangeStatus::ReplyFailed => "Reply Failed",
            ExchangeStatus::Completed => "Completed",
            ExchangeStatus::Dismissed => "Dismissed",
        };
        write!(f, "{}", s)
    }
}
