//! Web application router and middleware setup.

use crate::error::Result;
use crate::web::{handlers, websocket, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Build the dashboard application: JSON API, WebSocket stream and pages.
pub fn create_app(state: AppState) -> Result<Router> {
    state.config.validate()?;
    let config = state.config.clone();

    let mut app = Router::new()
        .route("/api/state", get(handlers::get_state))
        .route("/api/health", get(handlers::health_check))
        .route("/api/feed", post(handlers::feed))
        .route("/api/auto_mode", post(handlers::set_auto_mode))
        .route("/api/retry", post(handlers::retry))
        .route("/video_feed", get(handlers::video_feed))
        .route("/ws", get(websocket::websocket_handler));

    let custom_index = config
        .static_dir
        .as_ref()
        .filter(|dir| {
            let exists = dir.is_dir();
            if !exists {
                warn!("Static directory {:?} does not exist, using built-in page", dir);
            }
            exists
        })
        .map(|dir| (dir.clone(), dir.join("index.html")));

    match custom_index {
        Some((dir, index_file)) if index_file.is_file() => {
            info!("Serving dashboard from {:?}", dir);
            app = app
                .nest_service("/static", ServeDir::new(&dir))
                .route("/", get(move || handlers::serve_index(index_file.clone())));
        }
        Some((dir, _)) => {
            info!("Serving static files from {:?}", dir);
            app = app
                .nest_service("/static", ServeDir::new(&dir))
                .route("/", get(handlers::default_index));
        }
        None => {
            app = app.route("/", get(handlers::default_index));
        }
    }

    let mut app = app.with_state(state);

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    Ok(app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http())))
}
