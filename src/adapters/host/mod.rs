//! Host platform adapters (reqwest).

mod client;

pub use client::HostApiClient;
