//! Error types for the `blockhand-world` crate.

use blockhand_types::{BlockPos, EntityId};

use crate::goal::Goal;

/// Rejection reasons for world primitives.
///
/// Every mutating primitive may fail; callers decide per call site whether a
/// rejection is skipped, retried, or fatal to the enclosing task.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The pathfinder could not find a route satisfying the goal.
    #[error("no path to {0}")]
    NoPath(Goal),

    /// The travel goal was replaced or cleared before it was reached.
    #[error("goal changed before arrival")]
    GoalChanged,

    /// The target is farther than the body can reach.
    #[error("{pos} is out of reach ({distance:.1} blocks)")]
    OutOfReach {
        /// The targeted block.
        pos: BlockPos,
        /// Distance from the body at the time of the call.
        distance: f64,
    },

    /// The block cannot be dug (air, bedrock, fluids).
    #[error("block at {0} cannot be dug")]
    NotDiggable(BlockPos),

    /// The reference block for a placement is empty.
    #[error("no solid reference block at {0}")]
    NoReference(BlockPos),

    /// The cell being placed into is not free.
    #[error("cell {0} is occupied")]
    Occupied(BlockPos),

    /// The requested item is not in the inventory.
    #[error("item not in inventory: {0}")]
    MissingItem(String),

    /// The entity is unknown or no longer present.
    #[error("entity {0} not found")]
    UnknownEntity(EntityId),

    /// The targeted block is not a container.
    #[error("no container at {0}")]
    NotAContainer(BlockPos),

    /// A fault injected by the sandbox.
    #[error("injected fault: {0}")]
    Injected(&'static str),

    /// The body is dead or the session has ended.
    #[error("not connected")]
    Disconnected,
}
