//! Interview Chatbot - Structured Research Interviews
//!
//! This crate runs a participant through a sequence of configured exchanges,
//! each a short conversation with an assistant persona, and keeps the whole
//! interaction stored on the host platform so it can be resumed and reviewed.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
