//! Exchange module - one configured conversational unit and its prompts.
//!
//! An interaction is an ordered list of exchanges. Each exchange is driven by
//! an assistant persona and closes once the participant has used the
//! configured number of follow-up questions.

mod aggregate;
mod prompt;
mod status;

pub use aggregate::{
    Exchange, ExchangeConfig, ReplyRequest, ReplyResolution, ReplyState, SubmitOutcome,
};
pub use prompt::{build_prompt, PromptEntry, PromptFraming, PromptRole};
pub use status::ExchangeStatus;
