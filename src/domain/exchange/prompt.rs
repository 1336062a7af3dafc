//! Prompt construction for assistant calls.
//!
//! Turns an exchange's configuration and thread into the ordered,
//! role-tagged entries the completion service expects.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{AgentRole, Message};

use super::Exchange;

/// Role of an entry in a completion prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl From<AgentRole> for PromptRole {
    fn from(role: AgentRole) -> Self {
        match role {
            AgentRole::Assistant => PromptRole::Assistant,
            AgentRole::User => PromptRole::User,
        }
    }
}

/// One role-tagged entry of a completion prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub role: PromptRole,
    pub content: String,
}

impl PromptEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// How the leading system instructions are framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptFraming {
    /// Persona, interaction description and exchange instructions as
    /// separate system entries.
    #[default]
    SeparateSystemMessages,
    /// Exchange instructions and cue joined into a single system entry.
    CombinedInstructions,
}

/// Builds the prompt for an assistant reply to `new_message`.
///
/// `thread` is everything the assistant should see before the new message,
/// oldest first. The result always starts with at least one system entry and
/// ends with `new_message` as a user entry.
pub fn build_prompt(
    thread: &[Message],
    new_message: &Message,
    exchange: &Exchange,
    interaction_description: &str,
    framing: PromptFraming,
) -> Vec<PromptEntry> {
    let config = exchange.config();
    let mut prompt: Vec<PromptEntry> = match framing {
        PromptFraming::SeparateSystemMessages => [
            config.assistant.description_text(),
            interaction_description,
            config.chatbot_instructions.as_str(),
        ]
        .into_iter()
        .filter(|text| !text.is_empty())
        .map(PromptEntry::system)
        .collect(),
        PromptFraming::CombinedInstructions => {
            let combined = [config.chatbot_instructions.as_str(), config.participant_cue.as_str()]
                .into_iter()
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            vec![PromptEntry::system(combined)]
        }
    };
    if prompt.is_empty() {
        prompt.push(PromptEntry::system(""));
    }

    prompt.reserve(thread.len() + 1);
    prompt.extend(thread.iter().map(|msg| PromptEntry {
        role: msg.sender().role.into(),
        content: msg.content().to_string(),
    }));
    prompt.push(PromptEntry::user(new_message.content()));
    prompt
}
