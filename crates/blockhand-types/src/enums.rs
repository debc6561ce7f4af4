//! Enumeration types shared by the agent, the world gateway, and observers.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Task slot
// ---------------------------------------------------------------------------

/// What the agent is currently doing. Exactly one kind occupies the task
/// slot at any instant.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TaskKind {
    /// No task in progress.
    #[default]
    Idle,
    /// Collecting blocks of a named type.
    Mining,
    /// Keeping within a fixed distance of a player.
    Following,
    /// Running a combat session.
    Attacking,
    /// Executing a construction plan.
    Building,
    /// Handing items to a player or depositing them into a container.
    Transferring,
}

impl TaskKind {
    /// Lowercase name used in chat context summaries and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Mining => "mining",
            Self::Following => "following",
            Self::Attacking => "attacking",
            Self::Building => "building",
            Self::Transferring => "transferring",
        }
    }

    /// Whether the slot is free.
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Coarse classification reported by the world for every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EntityCategory {
    /// Another connected player.
    Player,
    /// A generic mob (the world's catch-all for creatures).
    Mob,
    /// A mob the world itself flags as hostile.
    Hostile,
    /// A passive animal.
    Animal,
    /// Dropped items, projectiles, and other non-living objects.
    Object,
    /// Anything else.
    Other,
}

impl EntityCategory {
    /// Categories eligible to be combat targets.
    pub const fn is_creature(self) -> bool {
        matches!(self, Self::Mob | Self::Hostile)
    }
}

// ---------------------------------------------------------------------------
// Chat and status
// ---------------------------------------------------------------------------

/// Who produced a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ChatKind {
    /// A human player (in-world or through the observer).
    Player,
    /// The agent itself.
    Bot,
    /// Lifecycle notices.
    System,
}

/// Connection lifecycle of the agent's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentStatus {
    /// Spawned and alive.
    Connected,
    /// Dead, awaiting respawn.
    Dead,
    /// Session ended.
    Disconnected,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Phases of a construction run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BuildPhase {
    /// Choosing the origin and stepping out of the footprint.
    SelectSite,
    /// Digging out the footprint volume.
    Clear,
    /// Laying the floor layer.
    Floor,
    /// Raising the perimeter walls.
    Walls,
    /// Capping the structure.
    Roof,
    /// Removing debris from the interior.
    Cleanup,
    /// Finished successfully.
    Done,
    /// Aborted by an unrecoverable gateway error.
    Failed,
}

// ---------------------------------------------------------------------------
// Body controls
// ---------------------------------------------------------------------------

/// Inventory slot used when equipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    /// Main hand.
    Hand,
    /// Off hand.
    OffHand,
}

/// A momentary movement control the body can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Walk forward.
    Forward,
    /// Walk backward.
    Back,
    /// Strafe left.
    Left,
    /// Strafe right.
    Right,
    /// Jump.
    Jump,
    /// Sprint.
    Sprint,
    /// Sneak.
    Sneak,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TaskKind::Transferring).unwrap_or_default();
        assert_eq!(json, "\"transferring\"");
        assert_eq!(TaskKind::Idle.to_string(), "idle");
    }

    #[test]
    fn only_mobs_are_creatures() {
        assert!(EntityCategory::Hostile.is_creature());
        assert!(EntityCategory::Mob.is_creature());
        assert!(!EntityCategory::Player.is_creature());
        assert!(!EntityCategory::Animal.is_creature());
    }
}
