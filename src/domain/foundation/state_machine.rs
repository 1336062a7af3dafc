//! State machine trait for lifecycle status enums.
//!
//! Exchange lifecycles are expressed as status enums; this trait gives every
//! such enum a uniform way to validate a transition before the owning
//! aggregate mutates its flags.

use super::{DomainError, ErrorCode};

/// Trait for status enums that represent state machines.
///
/// Implementors list the legal edges; `transition_to` and `is_terminal`
/// come for free.
///
/// ```ignore
/// let next = ExchangeStatus::Completed.transition_to(ExchangeStatus::Dismissed)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Closed,
        Open,
        Locked,
        Removed,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Door::*;
            match self {
                Closed => vec![Open, Locked, Removed],
                Open => vec![Closed],
                Locked => vec![Closed],
                Removed => vec![],
            }
        }
    }

    #[test]
    fn legal_edge_returns_target() {
        assert_eq!(Door::Closed.transition_to(Door::Open), Ok(Door::Open));
    }

    #[test]
    fn illegal_edge_reports_invalid_transition() {
        let err = Door::Open.transition_to(Door::Locked).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert!(err.message.contains("Open"));
    }

    #[test]
    fn state_without_edges_is_terminal() {
        assert!(Door::Removed.is_terminal());
        assert!(!Door::Locked.is_terminal());
    }
}
