//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/events` -- `WebSocket` event stream and command input
/// - `GET /api/status` -- latest status snapshot
/// - `GET /api/chat` -- recent chat lines
/// - `POST /api/command` -- submit a free-text command
///
/// CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/events", get(ws::ws_events))
        .route("/api/status", get(handlers::get_status))
        .route("/api/chat", get(handlers::get_chat))
        .route("/api/command", post(handlers::post_command))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
