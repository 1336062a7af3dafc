//! Message entity for interview threads.
//!
//! Messages are immutable records of what a participant or an assistant
//! said. Each message carries a snapshot of its sender and the time it was
//! sent; threads keep them in insertion order.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp};

use super::Agent;

/// An immutable utterance within an exchange.
///
/// # Invariants
///
/// - `id` is unique within its exchange
/// - `sent_at` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    content: String,
    sender: Agent,
    sent_at: Timestamp,
}

impl Message {
    /// Creates a message sent now by `sender`.
    pub fn new(sender: Agent, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender,
            sent_at: Timestamp::now(),
        }
    }

    /// Reconstitutes a message from persistence.
    pub fn reconstitute(id: MessageId, sender: Agent, content: String, sent_at: Timestamp) -> Self {
        Self {
            id,
            content,
            sender,
            sent_at,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sender(&self) -> &Agent {
        &self.sender
    }

    pub fn sent_at(&self) -> Timestamp {
        self.sent_at
    }

    /// Returns true if an assistant persona authored this message.
    pub fn is_from_assistant(&self) -> bool {
        self.sender.is_assistant()
    }
}
