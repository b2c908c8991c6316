//! WebSocket handler streaming dashboard state to browsers.

use crate::web::{AppState, ClientSlot};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};

/// WebSocket upgrade handler.
///
/// The connection slot is taken before the upgrade; it is released when the
/// socket closes or the upgrade never completes.
pub async fn websocket_handler(
    State(app): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(slot) = app.reserve_client() else {
        warn!(
            "Rejecting WebSocket client: all {} connections in use",
            app.config.max_websocket_connections
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many WebSocket connections").into_response();
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_websocket(socket, app, slot)),
        Err(rejection) => rejection.into_response(),
    }
}

/// Push the current state, then every change, until the client goes away.
async fn handle_websocket(socket: WebSocket, app: AppState, slot: ClientSlot) {
    let client_id = slot.id();
    info!("WebSocket client connected: {}", client_id);

    let (mut sender, mut receiver) = socket.split();
    let mut updates = WatchStream::new(app.controller.store().subscribe());

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(other) => debug!("Ignoring message from {}: {:?}", client_id, other),
                Err(e) => {
                    warn!("WebSocket error for client {}: {}", client_id, e);
                    break;
                }
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        while let Some(state) = updates.next().await {
            let json = match serde_json::to_string(&state) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize state for {}: {}", client_id, e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json)).await {
                debug!("Stopped sending to {}: {}", client_id, e);
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            debug!("Receive task completed for client {}", client_id);
            send_task.abort();
        }
        _ = &mut send_task => {
            debug!("Send task completed for client {}", client_id);
            recv_task.abort();
        }
    }

    drop(slot);
    info!("WebSocket client disconnected: {}", client_id);
}
