//! Client side of the aquarium controller's HTTP API.
//!
//! The controller exposes a tiny JSON API: a status endpoint, a command
//! endpoint and a dedicated feed endpoint. This module holds the wire types,
//! the `Backend` trait the poll controller is written against, and the
//! `reqwest`-based implementation.

pub mod client;
pub mod config;
pub mod payload;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used items
pub use client::HttpBackend;
pub use config::BackendConfig;
pub use payload::{Command, CommandResponse, StatusData, StatusResponse};
pub use traits::Backend;
