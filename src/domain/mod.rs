//! Domain layer containing the interview state and its rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, state machine)
//! - `conversation` - Agents and messages
//! - `exchange` - Exchange lifecycle and prompt building
//! - `interaction` - Ordered exchanges, cursor and materialization
//! - `settings` - Builder settings documents

pub mod conversation;
pub mod exchange;
pub mod foundation;
pub mod interaction;
pub mod settings;
