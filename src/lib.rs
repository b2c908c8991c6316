//! # Aquarium Dashboard
//!
//! Operator dashboard for a networked aquarium controller. The crate polls
//! the controller for pH, fish detection and feeder state, keeps a rolling
//! pH history, and lets an operator trigger a manual feed or toggle
//! automatic feeding.
//!
//! ## Features
//!
//! - **Resilient polling**: fixed-interval polls with a settle delay and a
//!   bounded number of automatic retries
//! - **Rolling history**: the most recent pH readings for trend charts
//! - **Operator commands**: manual feed and automatic-mode toggle
//! - **Web dashboard**: JSON API, live WebSocket updates and a built-in page
//! - **Library + Binary**: embed the controller or run the standalone server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aquarium_dashboard::{BackendConfig, HttpBackend, PollController, PollerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = HttpBackend::new(BackendConfig::new("http://aquarium.local"))?;
//!     let controller = PollController::new(Arc::new(backend), PollerConfig::default());
//!
//!     controller.poll().await;
//!     println!("pH: {:.1}", controller.store().snapshot().sensors.ph);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod monitor;
pub mod web;

// Re-export public API
pub use backend::{Backend, BackendConfig, HttpBackend, StatusData};
pub use error::{DashboardError, Result};
pub use monitor::{
    ConnectionStatus, DashboardState, HistoryEntry, PhHistory, PollController, PollOutcome,
    PollerConfig, SensorSnapshot, StateStore,
};
pub use web::{start_web_server, AppState, WebConfig};

/// The default interval between scheduled polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 3000;
