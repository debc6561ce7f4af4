//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for agent events, an in-memory
//! [`ObserverSnapshot`] that the REST endpoints serve, and the sending half
//! of the command channel back to the runner.

use std::collections::VecDeque;
use std::sync::Arc;

use blockhand_types::{AgentEvent, AgentStatus, ChatLine, InboundCommand, StatusSnapshot};
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::debug;

use crate::error::ObserverError;

/// Capacity of the broadcast channel for agent events.
///
/// A subscriber that falls behind by more than this many messages
/// receives [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Number of chat lines kept for `GET /api/chat`.
pub const CHAT_HISTORY: usize = 200;

/// What the observer currently knows about the agent.
#[derive(Debug, Clone, Default)]
pub struct ObserverSnapshot {
    /// Most recent telemetry refresh.
    pub status: Option<StatusSnapshot>,
    /// Most recent connection status.
    pub connection: Option<AgentStatus>,
    /// Recent chat, oldest first, capped at [`CHAT_HISTORY`].
    pub chat: VecDeque<ChatLine>,
}

impl ObserverSnapshot {
    /// Fold one event into the snapshot.
    pub fn apply(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::Stats(snapshot) => self.status = Some(snapshot.clone()),
            AgentEvent::Status { status, .. } => self.connection = Some(*status),
            AgentEvent::Chat(line) => {
                if self.chat.len() >= CHAT_HISTORY {
                    self.chat.pop_front();
                }
                self.chat.push_back(line.clone());
            }
            AgentEvent::Milestone { .. } => {}
        }
    }

    /// The newest `limit` chat lines, oldest first.
    pub fn recent_chat(&self, limit: usize) -> Vec<ChatLine> {
        let skip = self.chat.len().saturating_sub(limit);
        self.chat.iter().skip(skip).cloned().collect()
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for agent events.
    pub tx: broadcast::Sender<AgentEvent>,
    /// Latest known agent state.
    pub snapshot: Arc<RwLock<ObserverSnapshot>>,
    /// Where observer commands go. `None` when no runner is attached.
    pub commands: Option<mpsc::Sender<InboundCommand>>,
}

impl AppState {
    /// Create a new application state with an empty snapshot and no
    /// command channel.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(ObserverSnapshot::default())),
            commands: None,
        }
    }

    /// Create a new application state that forwards observer commands to
    /// `commands`.
    pub fn with_commands(commands: mpsc::Sender<InboundCommand>) -> Self {
        Self {
            commands: Some(commands),
            ..Self::new()
        }
    }

    /// Subscribe to the event broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    /// Fold `event` into the snapshot and push it to all connected clients.
    ///
    /// Returns the number of receivers that got the message; 0 when no
    /// clients are connected.
    pub async fn record(&self, event: AgentEvent) -> usize {
        self.snapshot.write().await.apply(&event);
        // send fails only when there are zero receivers.
        self.tx.send(event).unwrap_or(0)
    }

    /// Queue a free-text command typed by an observer.
    pub fn submit(&self, message: &str) -> Result<(), ObserverError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ObserverError::InvalidCommand(
                "message must not be empty".to_owned(),
            ));
        }
        let Some(commands) = &self.commands else {
            return Err(ObserverError::Unavailable(
                "no agent attached".to_owned(),
            ));
        };
        commands
            .try_send(InboundCommand::web(message))
            .map_err(|e| ObserverError::Unavailable(format!("command queue: {e}")))?;
        debug!(message, "observer command queued");
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
