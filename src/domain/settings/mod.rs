//! Builder settings documents.
//!
//! Three named documents configure an interview: the assistant catalogue,
//! the chat framing and the ordered exchange list. They are the only input
//! to materializing a participant's interaction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::conversation::AgentRole;
use crate::domain::foundation::{AgentId, ExchangeId, ValidationError};

/// Name under which a settings document is stored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingName {
    Assistants,
    Chat,
    Exchanges,
}

impl SettingName {
    pub const ALL: [SettingName; 3] = [Self::Assistants, Self::Chat, Self::Exchanges];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingName::Assistants => "assistants",
            SettingName::Chat => "chat",
            SettingName::Exchanges => "exchanges",
        }
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assistants" => Ok(SettingName::Assistants),
            "chat" => Ok(SettingName::Chat),
            "exchanges" => Ok(SettingName::Exchanges),
            other => Err(ValidationError::invalid_format(
                "setting_name",
                format!("unknown settings document '{}'", other),
            )),
        }
    }
}

/// An assistant persona as configured by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantSettings {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Role as stored by the builder. Ignored on materialization, where the
    /// persona always speaks as the assistant.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role: Option<AgentRole>,
}

impl AssistantSettings {
    /// True when neither a name nor a description was filled in.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.description.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantsSettings {
    pub assistants_list: Vec<AssistantSettings>,
}

impl Default for AssistantsSettings {
    fn default() -> Self {
        Self {
            assistants_list: vec![AssistantSettings {
                id: AgentId::generate(),
                ..Default::default()
            }],
        }
    }
}

impl AssistantsSettings {
    /// Looks up a catalogue entry by id.
    pub fn find(&self, id: &AgentId) -> Option<&AssistantSettings> {
        if id.is_blank() {
            return None;
        }
        self.assistants_list.iter().find(|a| &a.id == id)
    }
}

/// Interview-wide texts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatSettings {
    /// Interaction name shown to researchers.
    pub name: String,
    /// Sent to the assistant with every prompt.
    pub description: String,
    /// Start screen text.
    pub participant_instructions: String,
    /// Completion screen text.
    pub participant_end_text: String,
    /// Prefix prompts with the messages of dismissed exchanges.
    pub send_all_to_chatbot: bool,
}

/// One entry of the configured exchange list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExchangeSettings {
    pub id: ExchangeId,
    pub name: String,
    pub assistant: AssistantSettings,
    pub description: String,
    pub chatbot_instructions: String,
    pub participant_cue: String,
    pub participant_instructions_on_complete: String,
    pub nb_follow_up_questions: u32,
    pub hard_limit: bool,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            id: ExchangeId::new(),
            name: String::new(),
            assistant: AssistantSettings::default(),
            description: String::new(),
            chatbot_instructions: String::new(),
            participant_cue: String::new(),
            participant_instructions_on_complete: String::new(),
            nb_follow_up_questions: 0,
            hard_limit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExchangesSettings {
    pub exchanges_list: Vec<ExchangeSettings>,
}

impl Default for ExchangesSettings {
    fn default() -> Self {
        Self {
            exchanges_list: vec![ExchangeSettings::default()],
        }
    }
}

/// The three settings documents resolved together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllSettings {
    pub assistants: AssistantsSettings,
    pub chat: ChatSettings,
    pub exchanges: ExchangesSettings,
}
