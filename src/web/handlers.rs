//! HTTP handlers for the dashboard API.

use crate::error::DashboardError;
use crate::monitor::{DashboardState, PollOutcome};
use crate::web::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::error;

/// Body of `POST /api/auto_mode`. Without `enabled` the mode is toggled.
#[derive(Debug, Default, Deserialize)]
pub struct AutoModeRequest {
    pub enabled: Option<bool>,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::Request(_)
            | DashboardError::Http { .. }
            | DashboardError::BackendFailure(_)
            | DashboardError::MissingData => StatusCode::BAD_GATEWAY,
            DashboardError::AlreadyRunning => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Current dashboard state.
pub async fn get_state(State(app): State<AppState>) -> Json<DashboardState> {
    Json(app.controller.store().snapshot())
}

/// Health check endpoint.
pub async fn health_check(State(app): State<AppState>) -> Json<Value> {
    let backend_connected = app
        .controller
        .store()
        .read(|state| state.connection.is_connected);

    Json(json!({
        "status": "ok",
        "service": "aquarium-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "backend_connected": backend_connected,
        "clients": app.client_count(),
    }))
}

/// Trigger a manual feed and return the refreshed state.
pub async fn feed(State(app): State<AppState>) -> Result<Json<DashboardState>, DashboardError> {
    app.controller.feed().await?;
    Ok(Json(app.controller.store().snapshot()))
}

/// Set or toggle automatic feeding.
pub async fn set_auto_mode(
    State(app): State<AppState>,
    body: Option<Json<AutoModeRequest>>,
) -> Result<Json<Value>, DashboardError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let enabled = match request.enabled {
        Some(enabled) => {
            app.controller.set_auto_mode(enabled).await?;
            enabled
        }
        None => app.controller.toggle_auto_mode().await?,
    };

    Ok(Json(json!({ "success": true, "auto_mode": enabled })))
}

/// Operator-initiated reconnect.
pub async fn retry(State(app): State<AppState>) -> Json<Value> {
    let outcome: PollOutcome = app.controller.manual_retry().await;
    Json(json!({
        "outcome": outcome,
        "state": app.controller.store().snapshot(),
    }))
}

/// Send the browser straight to the backend's MJPEG stream.
pub async fn video_feed(State(app): State<AppState>) -> Redirect {
    Redirect::temporary(&app.video_feed_url)
}

/// Serve `index.html` from the configured static directory.
pub async fn serve_index(path: PathBuf) -> Result<Html<String>, StatusCode> {
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Html(content)),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Built-in dashboard page.
pub async fn default_index(State(app): State<AppState>) -> Html<String> {
    Html(DEFAULT_INDEX_HTML.replace(
        "__VIDEO_REFRESH_MS__",
        &app.config.video_refresh_ms.to_string(),
    ))
}

const DEFAULT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Aquarium Monitoring System</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #eff6ff; color: #1e3a8a; margin: 0; padding: 24px; }
        .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 20px; }
        .card { background: white; border-radius: 12px; padding: 20px; box-shadow: 0 4px 16px rgba(0,0,0,0.08); }
        .ok { color: #16a34a; } .bad { color: #dc2626; }
        button { width: 100%; padding: 12px; margin-bottom: 10px; border: 0; border-radius: 8px; font-weight: 600; cursor: pointer; }
        img { width: 100%; border-radius: 8px; background: #e5e7eb; }
        ol { font-family: monospace; font-size: 0.9rem; }
    </style>
</head>
<body>
    <h1>Aquarium Monitoring System</h1>
    <div class="card">
        <strong>Connection:</strong> <span id="conn" class="bad">Disconnected</span>
        <div id="error" class="bad"></div>
        <button id="retry">Retry connection</button>
    </div>
    <div class="grid">
        <div class="card">
            <h2>Camera Feed</h2>
            <img id="video" src="/video_feed" alt="Live camera feed">
        </div>
        <div class="card">
            <h2>System Controls</h2>
            <button id="auto">Auto Mode</button>
            <div id="autoLast"></div>
            <button id="feed">Run Motor</button>
            <div id="feedLast"></div>
            <p>Water pH: <strong id="ph">7.0</strong> <span id="voltage"></span> <span id="sensor"></span></p>
            <p>Fish: <strong id="fish">Not Detected</strong></p>
            <p id="counts"></p>
            <h3>pH history</h3>
            <ol id="history"></ol>
        </div>
    </div>
    <script>
        const $ = (id) => document.getElementById(id);
        const post = (url, body) => fetch(url, {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(body || {})
        });

        function render(state) {
            const s = state.sensors;
            $('conn').textContent = state.connection.is_connected ? 'Connected' : 'Disconnected';
            $('conn').className = state.connection.is_connected ? 'ok' : 'bad';
            $('error').textContent = state.last_error || '';
            $('auto').textContent = state.auto_mode ? 'Auto Mode (ON)' : 'Auto Mode (OFF)';
            $('feed').textContent = s.motor_initialized ? 'Dispense Feed Fish' : 'Run Motor';
            $('autoLast').textContent = s.auto_last_feed_time ? 'Last feed time: ' + s.auto_last_feed_time : '';
            $('feedLast').textContent = s.last_feed_time ? 'Last feed time: ' + s.last_feed_time : '';
            $('ph').textContent = s.ph.toFixed(1);
            $('voltage').textContent = s.ph_voltage != null ? 'Voltage: ' + s.ph_voltage.toFixed(2) + 'V' : '';
            $('sensor').textContent = s.ph_sensor_initialized == null ? '' : (s.ph_sensor_initialized ? 'Sensor Active' : 'Sensor Offline');
            $('fish').textContent = s.fish_detected ? 'Detected' : 'Not Detected';
            const counts = [];
            if (s.auto_feed_count != null) counts.push('Auto feeds: ' + s.auto_feed_count);
            if (s.feed_count != null) counts.push('Manual feeds: ' + s.feed_count);
            $('counts').textContent = counts.join(' | ');
            $('history').innerHTML = state.history.entries
                .map((e) => '<li>' + new Date(e.time).toLocaleTimeString() + ' pH ' + e.value.toFixed(2) + '</li>')
                .join('');
        }

        function connect() {
            const ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/ws');
            ws.onmessage = (event) => render(JSON.parse(event.data));
            ws.onclose = () => setTimeout(connect, 2000);
        }

        $('retry').onclick = () => post('/api/retry');
        $('feed').onclick = () => post('/api/feed');
        $('auto').onclick = () => post('/api/auto_mode');
        setInterval(() => { $('video').src = '/video_feed?t=' + Date.now(); }, __VIDEO_REFRESH_MS__);
        connect();
    </script>
</body>
</html>
"#;
