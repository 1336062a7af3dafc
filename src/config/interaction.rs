//! Interview behaviour configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::exchange::PromptFraming;

/// Knobs for how exchanges talk to the assistant.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct InteractionConfig {
    /// How system instructions are laid out in prompts
    #[serde(default)]
    pub prompt_framing: PromptFraming,

    /// Prefix prompts with the messages of dismissed exchanges for every
    /// interaction, regardless of the builder's chat setting
    #[serde(default)]
    pub send_all_messages: bool,

    /// Refuse dismissal while the closing reply is in flight
    #[serde(default)]
    pub await_closing_reply: bool,

    /// YAML or JSON settings file used when no host is configured
    pub settings_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_defaults() {
        let config = InteractionConfig::default();
        assert_eq!(config.prompt_framing, PromptFraming::SeparateSystemMessages);
        assert!(!config.send_all_messages);
        assert!(!config.await_closing_reply);
        assert!(config.settings_path.is_none());
    }
}
