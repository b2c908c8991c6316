//! Polling controller and dashboard state.
//!
//! This module keeps the dashboard's view of the aquarium up to date: it
//! polls the backend on a fixed interval, retries failed polls a bounded
//! number of times, folds successful responses into the sensor snapshot and
//! the rolling pH history, and issues operator commands.

pub mod commands;
pub mod config;
pub mod data;
pub mod poller;
pub mod reconciler;
pub mod store;

// Re-export commonly used items
pub use config::PollerConfig;
pub use data::{ConnectionStatus, DashboardState, HistoryEntry, PhHistory, SensorSnapshot};
pub use poller::{PollController, PollOutcome};
pub use store::StateStore;
