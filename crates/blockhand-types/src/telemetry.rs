//! Outbound telemetry: status snapshots and observer events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entities::ItemStack;
use crate::enums::{AgentStatus, ChatKind, TaskKind};
use crate::geometry::Vec3;

/// Point-in-time view of the agent's body and task slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StatusSnapshot {
    /// Health points (0..=20).
    pub health: f32,
    /// Food points (0..=20).
    pub food: f32,
    /// Feet position.
    pub position: Vec3,
    /// Inventory stacks in slot order.
    pub inventory: Vec<ItemStack>,
    /// Kind occupying the task slot.
    pub current_task: TaskKind,
}

/// One line of conversation, from any party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatLine {
    /// Speaker name.
    pub username: String,
    /// Text.
    pub message: String,
    /// Speaker class.
    pub kind: ChatKind,
    /// When the line was produced.
    pub timestamp: DateTime<Utc>,
}

impl ChatLine {
    /// A line stamped with the current time.
    pub fn now(username: impl Into<String>, message: impl Into<String>, kind: ChatKind) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Everything the agent publishes to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentEvent {
    /// A chat line was spoken or heard.
    Chat(ChatLine),
    /// Connection lifecycle change.
    Status {
        /// New status.
        status: AgentStatus,
        /// Human-readable notice.
        message: String,
    },
    /// Telemetry refresh.
    Stats(StatusSnapshot),
    /// A task reached a notable point.
    Milestone {
        /// Task that produced it.
        task: TaskKind,
        /// Description.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = AgentEvent::Status {
            status: AgentStatus::Dead,
            message: "Bot died!".to_owned(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["status"], "dead");
    }

    #[test]
    fn stats_flatten_snapshot_fields() {
        let event = AgentEvent::Stats(StatusSnapshot {
            health: 20.0,
            food: 18.0,
            position: Vec3::new(0.5, 64.0, 0.5),
            inventory: vec![ItemStack::new("dirt", 3, "Dirt")],
            current_task: TaskKind::Idle,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stats");
        assert_eq!(json["currentTask"], "idle");
        assert_eq!(json["inventory"][0]["name"], "dirt");
    }
}
