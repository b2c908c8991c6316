//! Local web surface for the aquarium dashboard.
//!
//! Serves the controller's state as JSON and over a WebSocket, accepts
//! operator commands, and renders a small built-in dashboard page.

pub mod config;
pub mod handlers;
pub mod router;
pub mod websocket;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{DashboardError, Result};
use crate::monitor::PollController;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;
use uuid::Uuid;

type ClientRegistry = Arc<Mutex<HashMap<Uuid, DateTime<Utc>>>>;

fn lock(clients: &ClientRegistry) -> MutexGuard<'_, HashMap<Uuid, DateTime<Utc>>> {
    clients.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: PollController,
    pub config: WebConfig,
    /// Where `/video_feed` redirects to
    pub video_feed_url: String,
    clients: ClientRegistry,
}

/// A reserved WebSocket connection. The slot is released on drop.
pub(crate) struct ClientSlot {
    id: Uuid,
    clients: ClientRegistry,
}

impl ClientSlot {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for ClientSlot {
    fn drop(&mut self) {
        lock(&self.clients).remove(&self.id);
    }
}

impl AppState {
    pub fn new(
        controller: PollController,
        config: WebConfig,
        video_feed_url: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            config,
            video_feed_url: video_feed_url.into(),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of connected WebSocket clients.
    pub fn client_count(&self) -> usize {
        lock(&self.clients).len()
    }

    /// Take a connection slot, or `None` when the limit is reached.
    pub(crate) fn reserve_client(&self) -> Option<ClientSlot> {
        let mut clients = lock(&self.clients);
        if clients.len() >= self.config.max_websocket_connections {
            return None;
        }

        let id = Uuid::new_v4();
        clients.insert(id, Utc::now());
        Some(ClientSlot {
            id,
            clients: self.clients.clone(),
        })
    }
}

/// Serve the dashboard until Ctrl-C, then stop the poll controller.
pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = state.config.socket_addr()?;
    let controller = state.controller.clone();
    let app = create_app(state)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DashboardError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("Dashboard available at http://{}/", addr);
    info!("API endpoint: http://{}/api/state", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DashboardError::web_server_error(format!("Server error: {}", e)))?;

    controller.stop();
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
