//! Agents: the participant and the assistant personas that author messages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::AgentId;

/// Which side of the conversation an agent speaks for.
///
/// Prompt building dispatches on this discriminant; it is the only place
/// where an agent's role decides behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// The human participant.
    #[default]
    User,
    /// An LLM-backed assistant persona.
    Assistant,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::User => "user",
            AgentRole::Assistant => "assistant",
        };
        write!(f, "{}", s)
    }
}

/// A conversational participant.
///
/// Messages embed a copy of their sender, so editing an assistant in the
/// builder settings never rewrites an existing conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub role: AgentRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Agent {
    /// Creates the human side of an interview.
    pub fn participant(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            role: AgentRole::User,
            name: name.into(),
            description: None,
            image_url: None,
        }
    }

    /// Creates an assistant persona.
    pub fn assistant(id: AgentId, name: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            id,
            role: AgentRole::Assistant,
            name: name.into(),
            description: (!description.is_empty()).then_some(description),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Returns the description, or an empty string when none was configured.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn is_assistant(&self) -> bool {
        self.role == AgentRole::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_has_user_role() {
        let agent = Agent::participant(AgentId::new("m-1"), "Ada");
        assert_eq!(agent.role, AgentRole::User);
        assert!(!agent.is_assistant());
    }

    #[test]
    fn assistant_drops_empty_description() {
        let agent = Agent::assistant(AgentId::new("a-1"), "Interviewer", "");
        assert!(agent.description.is_none());
        assert_eq!(agent.description_text(), "");
    }

    #[test]
    fn agent_serializes_camel_case_without_empty_options() {
        let agent = Agent::assistant(AgentId::new("a-1"), "Interviewer", "Asks questions")
            .with_image_url("https://example.org/bot.png");
        let json = serde_json::to_value(&agent).unwrap();

        assert_eq!(json["role"], "assistant");
        assert_eq!(json["imageUrl"], "https://example.org/bot.png");

        let bare = serde_json::to_value(Agent::participant(AgentId::new("m"), "M")).unwrap();
        assert!(bare.get("description").is_none());
    }
}
