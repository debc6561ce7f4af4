//! Travel goals and movement profiles.

use core::fmt;

use blockhand_types::{BlockPos, EntityId, Vec3};
use serde::{Deserialize, Serialize};

/// A target state handed to the travel subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Goal {
    /// Come within `range` of a point.
    Near {
        /// Destination.
        target: Vec3,
        /// Acceptable distance.
        range: f64,
    },
    /// Stand at a block, digging through it if the profile allows.
    Block {
        /// Destination block.
        pos: BlockPos,
    },
    /// Keep within `range` of a moving entity.
    Follow {
        /// Entity to trail.
        entity: EntityId,
        /// Trailing distance.
        range: f64,
    },
}

impl Goal {
    /// Within `range` of the given point.
    pub const fn near(target: Vec3, range: f64) -> Self {
        Self::Near { target, range }
    }

    /// Within `range` of the given block's corner.
    pub fn near_block(pos: BlockPos, range: f64) -> Self {
        Self::Near {
            target: pos.as_vec3(),
            range,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Near { target, range } => write!(f, "near {target} (r={range})"),
            Self::Block { pos } => write!(f, "block {pos}"),
            Self::Follow { entity, range } => write!(f, "follow {entity} (r={range})"),
        }
    }
}

/// How the pathfinder is allowed to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct MovementProfile {
    /// Break blocks that are in the way.
    pub can_dig: bool,
    /// Sprint on straight stretches.
    pub allow_sprinting: bool,
    /// Pillar straight up by placing blocks underfoot.
    pub allow_one_by_one_towers: bool,
}

impl MovementProfile {
    /// General travel: dig through obstacles, sprint.
    pub const fn travel() -> Self {
        Self {
            can_dig: true,
            allow_sprinting: true,
            allow_one_by_one_towers: true,
        }
    }

    /// Trailing a player: dig through obstacles, never pillar.
    pub const fn follow() -> Self {
        Self {
            can_dig: true,
            allow_sprinting: true,
            allow_one_by_one_towers: false,
        }
    }

    /// Chasing a mob: no digging, sprint.
    pub const fn pursuit() -> Self {
        Self {
            can_dig: false,
            allow_sprinting: true,
            allow_one_by_one_towers: true,
        }
    }
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::travel()
    }
}
