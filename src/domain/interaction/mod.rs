//! Interaction module - a participant's ordered run through the exchanges.

mod aggregate;
mod template;

pub use aggregate::{Advancement, Interaction};
pub use template::{DEFAULT_ASSISTANT_DESCRIPTION, DEFAULT_ASSISTANT_NAME, DEFAULT_INTERACTION_NAME};
