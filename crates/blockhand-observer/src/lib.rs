//! Observer API server for the Blockhand agent.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/events`) streaming every
//!   [`AgentEvent`](blockhand_types::AgentEvent) as JSON and accepting
//!   free-text commands as text frames
//! - **REST endpoints** for the latest status snapshot, recent chat, and
//!   command submission
//! - **Minimal HTML page** (`GET /`) showing the agent's vitals and task
//!
//! # Architecture
//!
//! The runner feeds agent events into [`AppState::record`], which folds
//! them into an in-memory [`ObserverSnapshot`] and fans them out over a
//! broadcast channel. Commands typed by observers go back to the runner
//! over an mpsc channel as [`InboundCommand`](blockhand_types::InboundCommand)s
//! with the web speaker id.
//!
//! [`ObserverSnapshot`]: state::ObserverSnapshot

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, ObserverSnapshot};
