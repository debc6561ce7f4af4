//! Task State: the single slot recording what the agent is doing.
//!
//! [`AgentState`] is the one source of truth for "is the agent busy". Every
//! task entry point claims the slot through [`AgentState::try_start`] (or
//! [`AgentState::try_start_combat`]) and receives a [`TaskTicket`]. After
//! every suspension point the task re-checks [`AgentState::owns`]; a ticket
//! that no longer matches means a handler or a global stop took the slot
//! and the task must wind down without touching shared state.
//!
//! The state sits behind a plain mutex that is never held across an
//! `.await`, so each transition is atomic with respect to every other task
//! entry point and event handler.

use blockhand_types::{CombatSessionId, EntityId, TaskId, TaskKind, Vec3};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Proof that a task started and which occupancy of the slot it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTicket {
    /// Unique per successful start.
    pub id: TaskId,
    /// The kind the slot was set to.
    pub kind: TaskKind,
}

/// The occupant of the task slot.
#[derive(Debug, Clone)]
pub struct Task {
    /// Ticket handed to the task that owns the slot.
    pub ticket: TaskTicket,
    /// When the task started.
    pub started_at: DateTime<Utc>,
}

/// A running combat engine.
#[derive(Debug, Clone)]
pub struct CombatSession {
    /// Session identity.
    pub id: CombatSessionId,
    /// Case-insensitive name filter, if any.
    pub target_filter: Option<String>,
    /// Entity struck or pursued on the latest tick. Display only.
    pub current_target: Option<EntityId>,
    /// Cancels the periodic tick.
    pub cancel: CancellationToken,
}

/// Where to return after a respawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RespawnIntent {
    /// The party to return to.
    pub username: String,
    /// Where they were when the agent died.
    pub last_known_position: Vec3,
}

/// Shared mutable state of the agent.
#[derive(Debug, Default)]
pub struct AgentState {
    task: Option<Task>,
    combat: Option<CombatSession>,
    respawn_intent: Option<RespawnIntent>,
    last_interacted: Option<String>,
    last_health_alert: Option<Instant>,
}

impl AgentState {
    /// Current task kind; `Idle` when the slot is free.
    pub fn kind(&self) -> TaskKind {
        self.task.as_ref().map_or(TaskKind::Idle, |t| t.ticket.kind)
    }

    /// The current occupant, if any.
    pub const fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Claim the slot for `kind`.
    ///
    /// Succeeds when the slot is idle. A `Following` occupant yields to any
    /// new task, since following is a standing goal with no loop of its
    /// own. Anything else is refused.
    pub fn try_start(&mut self, kind: TaskKind) -> Option<TaskTicket> {
        if kind.is_idle() {
            return None;
        }
        match self.kind() {
            TaskKind::Idle | TaskKind::Following => Some(self.occupy(kind)),
            _ => None,
        }
    }

    /// Claim the slot for combat.
    ///
    /// Refused while a combat session exists or the slot is already
    /// `Attacking`. Otherwise preempts whatever task is running: that task
    /// loses ownership and stops at its next checkpoint.
    pub fn try_start_combat(
        &mut self,
        target_filter: Option<String>,
    ) -> Option<(TaskTicket, CombatSession)> {
        if self.combat.is_some() || self.kind() == TaskKind::Attacking {
            return None;
        }
        let ticket = self.occupy(TaskKind::Attacking);
        let session = CombatSession {
            id: CombatSessionId::new(),
            target_filter,
            current_target: None,
            cancel: CancellationToken::new(),
        };
        self.combat = Some(session.clone());
        Some((ticket, session))
    }

    fn occupy(&mut self, kind: TaskKind) -> TaskTicket {
        let ticket = TaskTicket {
            id: TaskId::new(),
            kind,
        };
        self.task = Some(Task {
            ticket,
            started_at: Utc::now(),
        });
        ticket
    }

    /// Whether `ticket` still holds the slot.
    pub fn owns(&self, ticket: &TaskTicket) -> bool {
        self.task.as_ref().is_some_and(|t| t.ticket == *ticket)
    }

    /// Release the slot if `ticket` still holds it. Returns whether it did.
    pub fn finish(&mut self, ticket: &TaskTicket) -> bool {
        if self.owns(ticket) {
            self.task = None;
            true
        } else {
            false
        }
    }

    /// Release the slot if it is `Following`. Returns whether it did.
    pub fn finish_following(&mut self) -> bool {
        if self.kind() == TaskKind::Following {
            self.task = None;
            true
        } else {
            false
        }
    }

    /// Free the slot and cancel any combat session, unconditionally.
    ///
    /// Returns whether anything changed. Calling it on an idle agent is a
    /// no-op.
    pub fn stop_all(&mut self) -> bool {
        let had_task = self.task.take().is_some();
        let had_combat = self.combat.take().is_some_and(|session| {
            session.cancel.cancel();
            true
        });
        had_task || had_combat
    }

    /// End the combat session `id` from inside the engine. Frees the slot if
    /// it is still `Attacking`. Returns `false` when the session was already
    /// replaced or stopped.
    pub fn end_combat(&mut self, id: CombatSessionId) -> bool {
        if self.combat.as_ref().is_none_or(|s| s.id != id) {
            return false;
        }
        if let Some(session) = self.combat.take() {
            session.cancel.cancel();
        }
        if self.kind() == TaskKind::Attacking {
            self.task = None;
        }
        true
    }

    /// The running combat session, if any.
    pub const fn combat(&self) -> Option<&CombatSession> {
        self.combat.as_ref()
    }

    /// Whether a combat session exists.
    pub const fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    /// Record the entity the engine is working on.
    pub fn set_current_target(&mut self, id: CombatSessionId, target: Option<EntityId>) {
        if let Some(session) = self.combat.as_mut().filter(|s| s.id == id) {
            session.current_target = target;
        }
    }

    /// Remember who last spoke to the agent.
    pub fn note_interaction(&mut self, username: &str) {
        self.last_interacted = Some(username.to_owned());
    }

    /// Who last spoke to the agent.
    pub fn last_interacted(&self) -> Option<&str> {
        self.last_interacted.as_deref()
    }

    /// Store the return point captured at death, replacing any previous one.
    pub fn set_respawn_intent(&mut self, intent: RespawnIntent) {
        self.respawn_intent = Some(intent);
    }

    /// Consume the return point. A second call returns `None`.
    pub const fn take_respawn_intent(&mut self) -> Option<RespawnIntent> {
        self.respawn_intent.take()
    }

    /// The pending return point, if any.
    pub const fn respawn_intent(&self) -> Option<&RespawnIntent> {
        self.respawn_intent.as_ref()
    }

    /// Record a distress call at `now` unless one went out within
    /// `cooldown`. Returns whether the call should go out.
    pub fn try_health_alert(&mut self, now: Instant, cooldown: core::time::Duration) -> bool {
        let due = self
            .last_health_alert
            .is_none_or(|last| now.saturating_duration_since(last) > cooldown);
        if due {
            self.last_health_alert = Some(now);
        }
        due
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use core::time::Duration;

    use super::*;

    #[test]
    fn only_one_task_at_a_time() {
        let mut state = AgentState::default();
        let mining = state.try_start(TaskKind::Mining).unwrap();
        assert!(state.try_start(TaskKind::Mining).is_none());
        assert!(state.try_start(TaskKind::Building).is_none());
        assert_eq!(state.kind(), TaskKind::Mining);
        assert!(state.finish(&mining));
        assert_eq!(state.kind(), TaskKind::Idle);
    }

    #[test]
    fn idle_cannot_be_started() {
        let mut state = AgentState::default();
        assert!(state.try_start(TaskKind::Idle).is_none());
    }

    #[test]
    fn following_yields_to_new_tasks() {
        let mut state = AgentState::default();
        let follow = state.try_start(TaskKind::Following).unwrap();
        let give = state.try_start(TaskKind::Transferring).unwrap();
        assert!(!state.owns(&follow));
        assert!(state.owns(&give));
        assert!(!state.finish_following());
    }

    #[test]
    fn stale_ticket_cannot_finish() {
        let mut state = AgentState::default();
        let first = state.try_start(TaskKind::Building).unwrap();
        assert!(state.stop_all());
        let second = state.try_start(TaskKind::Mining).unwrap();
        assert!(!state.finish(&first));
        assert_eq!(state.kind(), TaskKind::Mining);
        assert!(state.finish(&second));
    }

    #[test]
    fn combat_preempts_but_never_doubles() {
        let mut state = AgentState::default();
        let build = state.try_start(TaskKind::Building).unwrap();
        let (_, session) = state.try_start_combat(Some("zombie".to_owned())).unwrap();
        assert!(!state.owns(&build));
        assert_eq!(state.kind(), TaskKind::Attacking);
        assert!(state.try_start_combat(None).is_none());

        assert!(state.stop_all());
        assert!(session.cancel.is_cancelled());
        assert!(!state.in_combat());
    }

    #[test]
    fn end_combat_ignores_stale_sessions() {
        let mut state = AgentState::default();
        let (_, old) = state.try_start_combat(None).unwrap();
        state.stop_all();
        let (_, current) = state.try_start_combat(None).unwrap();
        assert!(!state.end_combat(old.id));
        assert_eq!(state.kind(), TaskKind::Attacking);
        assert!(state.end_combat(current.id));
        assert_eq!(state.kind(), TaskKind::Idle);
    }

    #[test]
    fn stop_all_is_idempotent() {
        let mut state = AgentState::default();
        assert!(!state.stop_all());
        assert!(!state.stop_all());
        assert_eq!(state.kind(), TaskKind::Idle);
    }

    #[test]
    fn respawn_intent_is_consumed_once() {
        let mut state = AgentState::default();
        state.set_respawn_intent(RespawnIntent {
            username: "Steve".to_owned(),
            last_known_position: Vec3::new(1.0, 64.0, 1.0),
        });
        assert!(state.take_respawn_intent().is_some());
        assert!(state.take_respawn_intent().is_none());
    }

    #[test]
    fn health_alerts_are_throttled() {
        let mut state = AgentState::default();
        let cooldown = Duration::from_secs(10);
        let t0 = Instant::now();
        assert!(state.try_health_alert(t0, cooldown));
        assert!(!state.try_health_alert(t0 + Duration::from_secs(5), cooldown));
        assert!(state.try_health_alert(t0 + Duration::from_secs(11), cooldown));
    }
}
