//! Point-in-time snapshots of world objects.
//!
//! Snapshots are plain values copied out of the world gateway. They are
//! never handles: an entity may vanish between two reads, so callers
//! re-resolve by search instead of holding on to a snapshot across a
//! suspension point.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EntityCategory;
use crate::geometry::{BlockPos, Vec3};

/// Block names the world reports for empty space.
pub const AIR_BLOCKS: [&str; 3] = ["air", "cave_air", "void_air"];

/// Opaque world-assigned entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A creature, player, or object as last observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// World identifier, stable for the entity's lifetime.
    pub id: EntityId,
    /// Internal species name (`zombie`, `player`, ...).
    pub name: Option<String>,
    /// Human-facing name, when the world supplies one.
    pub display_name: Option<String>,
    /// Account name, for players only.
    pub username: Option<String>,
    /// Coarse classification.
    pub category: EntityCategory,
    /// Feet position.
    pub position: Vec3,
    /// Bounding-box height.
    pub height: f64,
}

impl EntitySnapshot {
    /// The best available human-readable label.
    pub fn label(&self) -> &str {
        self.username
            .as_deref()
            .or(self.name.as_deref())
            .or(self.display_name.as_deref())
            .unwrap_or("unknown")
    }

    /// Case-insensitive substring match against name or display name.
    ///
    /// `needle` must already be lowercase.
    pub fn name_contains(&self, needle: &str) -> bool {
        [self.name.as_deref(), self.display_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|n| n.to_lowercase().contains(needle))
    }

    /// Point near the top of the bounding box, used as an aim point.
    pub fn head_point(&self) -> Vec3 {
        self.position.offset(0.0, self.height * 0.9, 0.0)
    }
}

/// A single block as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    /// Lattice position.
    pub position: BlockPos,
    /// Registry name (`stone`, `oak_log`, `air`, ...).
    pub name: String,
    /// Whether the block can be removed by digging.
    pub diggable: bool,
}

impl BlockSnapshot {
    /// Whether the cell is empty space.
    pub fn is_air(&self) -> bool {
        AIR_BLOCKS.contains(&self.name.as_str())
    }

    /// Whether the cell holds something that can be stood on or placed against.
    pub fn is_solid(&self) -> bool {
        !self.is_air()
    }
}

/// One inventory stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ItemStack {
    /// Registry name (`cobblestone`, `iron_sword`, ...).
    pub name: String,
    /// Number of items in the stack.
    pub count: u32,
    /// Human-facing name (`Cobblestone`, `Iron Sword`, ...).
    pub display_name: String,
}

impl ItemStack {
    /// Construct a stack.
    pub fn new(name: impl Into<String>, count: u32, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count,
            display_name: display_name.into(),
        }
    }
}
