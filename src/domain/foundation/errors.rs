//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Not found errors
    ExchangeNotFound,

    // State errors
    InvalidStateTransition,
    InteractionNotStarted,
    InteractionCompleted,
    ExchangeNotActive,
    ExchangeNotCompleted,
    ReplyInFlight,
    NoReplyToRetry,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ExchangeNotFound => "EXCHANGE_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::InteractionNotStarted => "INTERACTION_NOT_STARTED",
            ErrorCode::InteractionCompleted => "INTERACTION_COMPLETED",
            ErrorCode::ExchangeNotActive => "EXCHANGE_NOT_ACTIVE",
            ErrorCode::ExchangeNotCompleted => "EXCHANGE_NOT_COMPLETED",
            ErrorCode::ReplyInFlight => "REPLY_IN_FLIGHT",
            ErrorCode::NoReplyToRetry => "NO_REPLY_TO_RETRY",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("participant_id");
        assert_eq!(format!("{}", err), "Field 'participant_id' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("state_transition", "Cannot go back");
        assert_eq!(
            format!("{}", err),
            "Field 'state_transition' has invalid format: Cannot go back"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::ReplyInFlight, "Reply pending");
        assert_eq!(format!("{}", err), "[REPLY_IN_FLIGHT] Reply pending");
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::new(ErrorCode::ExchangeNotFound, "missing")
            .with_detail("exchange_id", "abc");
        assert_eq!(err.details.get("exchange_id"), Some(&"abc".to_string()));
    }

    #[test]
    fn validation_error_converts_to_validation_failed() {
        let err: DomainError = ValidationError::empty_field("content").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
