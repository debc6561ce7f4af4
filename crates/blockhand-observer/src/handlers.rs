//! REST API endpoint handlers for the Observer server.
//!
//! Reads are served from the in-memory [`ObserverSnapshot`] via the shared
//! [`AppState`]; commands are forwarded to the runner's queue.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Latest status snapshot |
//! | `GET` | `/api/chat` | Recent chat lines (`?limit=N`) |
//! | `POST` | `/api/command` | Submit a free-text command |
//!
//! [`ObserverSnapshot`]: crate::state::ObserverSnapshot

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};

use crate::error::ObserverError;
use crate::state::{AppState, CHAT_HISTORY};

/// Chat lines returned when no limit is given.
const DEFAULT_CHAT_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Request structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/chat` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct ChatQuery {
    /// Maximum number of lines to return (default 50, capped at 200).
    pub limit: Option<usize>,
}

/// Body of `POST /api/command`.
#[derive(Debug, serde::Deserialize)]
pub struct CommandBody {
    /// Free-text command, as if typed in world chat.
    pub message: String,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the agent's vitals and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let connection = snapshot
        .connection
        .map_or_else(|| "waiting".to_owned(), |c| format!("{c:?}"));
    let (health, food, task, position) = snapshot.status.as_ref().map_or_else(
        || ("-".to_owned(), "-".to_owned(), "-".to_owned(), "-".to_owned()),
        |s| {
            (
                format!("{:.0}/20", s.health),
                format!("{:.0}/20", s.food),
                s.current_task.to_string(),
                s.position.to_string(),
            )
        },
    );
    let chat_count = snapshot.chat.len();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Blockhand Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Blockhand Observer</h1>
    <p class="subtitle">Voxel agent monitoring server</p>

    <div>
        <div class="metric">
            <div class="label">Connection</div>
            <div class="value">{connection}</div>
        </div>
        <div class="metric">
            <div class="label">Health</div>
            <div class="value">{health}</div>
        </div>
        <div class="metric">
            <div class="label">Food</div>
            <div class="value">{food}</div>
        </div>
        <div class="metric">
            <div class="label">Task</div>
            <div class="value">{task}</div>
        </div>
        <div class="metric">
            <div class="label">Position</div>
            <div class="value">{position}</div>
        </div>
        <div class="metric">
            <div class="label">Chat lines</div>
            <div class="value">{chat_count}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/status">/api/status</a> -- Latest status snapshot</li>
        <li>GET <a href="/api/chat">/api/chat</a> -- Recent chat (?limit=N)</li>
        <li>POST /api/command -- Send a command: {{"message": "follow me"}}</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/events</code> -- Live event stream; text frames are commands</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status -- latest status snapshot
// ---------------------------------------------------------------------------

/// Return the latest telemetry snapshot and connection status.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.snapshot.read().await;
    let status = snapshot
        .status
        .as_ref()
        .ok_or_else(|| ObserverError::NotFound("no status reported yet".to_owned()))?;

    Ok(Json(serde_json::json!({
        "connection": snapshot.connection,
        "health": status.health,
        "food": status.food,
        "position": status.position,
        "inventory": status.inventory,
        "currentTask": status.current_task,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/chat -- recent chat
// ---------------------------------------------------------------------------

/// Return the most recent chat lines, oldest first.
///
/// # Query Parameters
///
/// - `limit`: 1..=200 (default 50); larger values are clamped
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChatQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = params.limit.unwrap_or(DEFAULT_CHAT_LIMIT);
    if limit == 0 {
        return Err(ObserverError::InvalidQuery(
            "limit must be at least 1".to_owned(),
        ));
    }
    let lines = state
        .snapshot
        .read()
        .await
        .recent_chat(limit.min(CHAT_HISTORY));

    Ok(Json(serde_json::json!({
        "count": lines.len(),
        "lines": lines,
    })))
}

// ---------------------------------------------------------------------------
// POST /api/command -- submit a command
// ---------------------------------------------------------------------------

/// Queue a free-text command from the web speaker.
///
/// Returns `202 Accepted`; the outcome arrives later as chat on the event
/// stream.
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CommandBody>,
) -> Result<impl IntoResponse, ObserverError> {
    state.submit(&body.message)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": true })),
    ))
}
