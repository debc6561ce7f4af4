//! Narration and telemetry published by the agent.
//!
//! Every line the agent says goes both to world chat and to observers as a
//! [`AgentEvent::Chat`]. Every task-slot transition publishes a fresh
//! [`StatusSnapshot`].

use blockhand_types::{
    AgentEvent, AgentStatus, ChatKind, ChatLine, ContextSummary, StatusSnapshot, TaskKind,
};
use blockhand_world::WorldGateway;
use tracing::info;

use crate::agent::Agent;

/// Speaker name used for lifecycle notices.
pub const SYSTEM_SPEAKER: &str = "system";

/// Speaker name observers see for the agent's own lines.
pub const BOT_SPEAKER: &str = "bot";

impl<W: WorldGateway> Agent<W> {
    /// Current health, food, position, inventory, and task kind.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            health: self.world.health(),
            food: self.world.food(),
            position: self.world.position(),
            inventory: self.world.inventory(),
            current_task: self.task_kind(),
        }
    }

    /// The short state summary handed to the decision oracle.
    pub fn context_summary(&self) -> ContextSummary {
        ContextSummary {
            task: self.task_kind(),
            health: self.world.health(),
            item_count: self.world.inventory().len(),
        }
    }

    /// Broadcast a telemetry refresh.
    pub fn publish_stats(&self) {
        self.publish(AgentEvent::Stats(self.snapshot()));
    }

    /// Say a line in world chat and mirror it to observers.
    pub fn say(&self, message: &str) {
        info!(message, "bot says");
        self.world.chat(message);
        self.publish(AgentEvent::Chat(ChatLine::now(
            BOT_SPEAKER,
            message,
            ChatKind::Bot,
        )));
    }

    /// Mirror a line heard from another party to observers.
    pub fn relay_chat(&self, username: &str, message: &str) {
        self.publish(AgentEvent::Chat(ChatLine::now(
            username,
            message,
            ChatKind::Player,
        )));
    }

    /// Publish a lifecycle notice to observers only.
    pub fn notice(&self, message: &str) {
        self.publish(AgentEvent::Chat(ChatLine::now(
            SYSTEM_SPEAKER,
            message,
            ChatKind::System,
        )));
    }

    /// Publish a connection status change.
    pub fn announce_status(&self, status: AgentStatus, message: &str) {
        self.publish(AgentEvent::Status {
            status,
            message: message.to_owned(),
        });
    }

    /// Publish a task milestone.
    pub(crate) fn milestone(&self, task: TaskKind, message: &str) {
        self.publish(AgentEvent::Milestone {
            task,
            message: message.to_owned(),
        });
    }

    fn publish(&self, event: AgentEvent) {
        // No observers attached is normal.
        let _ = self.events.send(event);
    }
}
