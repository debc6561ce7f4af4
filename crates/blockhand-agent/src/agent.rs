//! The [`Agent`] handle shared by task entry points, the combat tick, and
//! the reactive handlers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blockhand_types::{AgentEvent, TaskKind};
use blockhand_world::{GatewayError, WorldGateway};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::BehaviorConfig;
use crate::error::AgentError;
use crate::state::{AgentState, TaskTicket};

/// Capacity of the outbound telemetry channel.
const EVENT_CAPACITY: usize = 256;

/// A cheaply cloneable handle to one agent body.
///
/// Clones share the same world, task slot, and telemetry channel; the
/// combat tick and each event handler run on their own clone.
pub struct Agent<W> {
    pub(crate) world: Arc<W>,
    pub(crate) state: Arc<Mutex<AgentState>>,
    pub(crate) config: Arc<BehaviorConfig>,
    pub(crate) events: broadcast::Sender<AgentEvent>,
}

impl<W> Clone for Agent<W> {
    fn clone(&self) -> Self {
        Self {
            world: Arc::clone(&self.world),
            state: Arc::clone(&self.state),
            config: Arc::clone(&self.config),
            events: self.events.clone(),
        }
    }
}

impl<W: WorldGateway> Agent<W> {
    /// Wrap a world gateway.
    pub fn new(world: Arc<W>, config: BehaviorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            world,
            state: Arc::new(Mutex::new(AgentState::default())),
            config: Arc::new(config),
            events,
        }
    }

    /// The world this agent acts in.
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Behaviour configuration.
    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Subscribe to outbound telemetry.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    /// Lock the shared state. Never hold the guard across an `.await`.
    pub fn state(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current task kind.
    pub fn task_kind(&self) -> TaskKind {
        self.state().kind()
    }

    /// Remember who last spoke to the agent.
    pub fn note_interaction(&self, username: &str) {
        self.state().note_interaction(username);
    }

    /// Claim the task slot and publish the transition.
    pub(crate) fn begin(&self, kind: TaskKind) -> Option<TaskTicket> {
        let ticket = self.state().try_start(kind);
        if ticket.is_some() {
            self.publish_stats();
        }
        ticket
    }

    /// Release the task slot if still owned and publish the transition.
    pub(crate) fn end(&self, ticket: &TaskTicket) {
        if self.state().finish(ticket) {
            self.publish_stats();
        }
    }

    /// Cooperative cancellation checkpoint.
    pub(crate) fn checkpoint(&self, ticket: &TaskTicket) -> Result<(), AgentError> {
        if self.state().owns(ticket) {
            Ok(())
        } else {
            Err(AgentError::Preempted)
        }
    }

    /// Global stop: clear the goal and controls, cancel combat, go idle.
    ///
    /// Safe to call in any state; a second call changes nothing.
    pub fn stop_all(&self) {
        self.world.set_goal(None);
        self.world.clear_controls();
        let changed = self.state().stop_all();
        debug!(changed, "all tasks stopped");
        self.publish_stats();
    }
}

/// Classify a per-step world rejection: `Ok(true)` on success, `Ok(false)`
/// for a transient failure the caller skips, `Err` when the body is gone.
pub(crate) fn tolerate(result: Result<(), GatewayError>, step: &str) -> Result<bool, AgentError> {
    match result {
        Ok(()) => Ok(true),
        Err(GatewayError::Disconnected) => Err(AgentError::Gateway(GatewayError::Disconnected)),
        Err(e) => {
            debug!(step, error = %e, "step failed, skipping");
            Ok(false)
        }
    }
}
