//! Builds a fresh interaction from the builder settings.

use crate::domain::conversation::{Agent, AgentRole};
use crate::domain::exchange::{Exchange, ExchangeConfig};
use crate::domain::foundation::{AgentId, DomainError};
use crate::domain::settings::{AllSettings, AssistantSettings, AssistantsSettings, ExchangeSettings};

use super::Interaction;

pub const DEFAULT_INTERACTION_NAME: &str = "Interaction";
pub const DEFAULT_ASSISTANT_NAME: &str = "Default Assistant";
pub const DEFAULT_ASSISTANT_DESCRIPTION: &str = "Default assistant description";

impl Interaction {
    /// Materializes a new interaction for `participant` from `settings`.
    ///
    /// Every configured exchange is merged over the structural defaults and
    /// its persona is forced to the assistant role. An empty exchange list
    /// yields a single default exchange.
    pub fn from_settings(participant: Agent, settings: &AllSettings) -> Result<Self, DomainError> {
        let participant = Agent {
            role: AgentRole::User,
            ..participant
        };

        let mut exchanges: Vec<Exchange> = settings
            .exchanges
            .exchanges_list
            .iter()
            .map(|entry| Exchange::new(exchange_config(entry, &settings.assistants)))
            .collect();
        if exchanges.is_empty() {
            exchanges.push(Exchange::new(exchange_config(
                &ExchangeSettings::default(),
                &settings.assistants,
            )));
        }

        let chat = &settings.chat;
        let interaction = Interaction::new(
            participant,
            non_blank_or(&chat.name, DEFAULT_INTERACTION_NAME),
            chat.description.clone(),
            chat.participant_instructions.clone(),
            chat.participant_end_text.clone(),
            exchanges,
        )?;
        Ok(interaction.with_send_all_messages(chat.send_all_to_chatbot))
    }
}

fn exchange_config(entry: &ExchangeSettings, catalogue: &AssistantsSettings) -> ExchangeConfig {
    ExchangeConfig {
        id: entry.id,
        name: entry.name.clone(),
        description: entry.description.clone(),
        assistant: resolve_assistant(&entry.assistant, catalogue),
        chatbot_instructions: entry.chatbot_instructions.clone(),
        participant_cue: entry.participant_cue.clone(),
        participant_instructions_on_complete: entry.participant_instructions_on_complete.clone(),
        nb_follow_up_questions: entry.nb_follow_up_questions,
        hard_limit: entry.hard_limit,
    }
}

/// Snapshots the persona for an exchange.
///
/// A blank persona that names a catalogue entry by id takes that entry.
/// Remaining blank fields fall back to the default assistant.
fn resolve_assistant(configured: &AssistantSettings, catalogue: &AssistantsSettings) -> Agent {
    let source = if configured.is_blank() {
        catalogue.find(&configured.id).unwrap_or(configured)
    } else {
        configured
    };

    let id = if source.id.is_blank() {
        AgentId::generate()
    } else {
        source.id.clone()
    };
    let name = non_blank_or(&source.name, DEFAULT_ASSISTANT_NAME);
    let description = non_blank_or(&source.description, DEFAULT_ASSISTANT_DESCRIPTION);

    let agent = Agent::assistant(id, name, description);
    match &source.image_url {
        Some(url) if !url.is_empty() => agent.with_image_url(url.clone()),
        _ => agent,
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
