//! Conversation primitives shared by every exchange.
//!
//! Agents and the messages they author.

mod agent;
mod message;

pub use agent::{Agent, AgentRole};
pub use message::Message;
