//! The [`WorldGateway`] trait: the only way the agent touches the world.
//!
//! Queries are synchronous reads of the gateway's current view. Mutating
//! primitives are asynchronous, complete when the world has applied them, and
//! may reject with a [`GatewayError`]. None of them carries a timeout; a
//! primitive that never resolves stalls the caller.

use core::future::Future;

use blockhand_types::{
    BlockPos, BlockSnapshot, Control, EntityId, EntitySnapshot, EquipSlot, Face, ItemStack, Vec3,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::GatewayError;
use crate::goal::{Goal, MovementProfile};

/// Something that happened in the world, independent of any task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The body entered the world for the first time this session.
    Spawn,
    /// A chat line was heard. Lines spoken by the agent itself are included;
    /// consumers filter on `username`.
    Chat {
        /// Speaker.
        username: String,
        /// Text.
        message: String,
    },
    /// The agent itself took damage. Health is already updated.
    SelfHurt,
    /// Another entity took damage.
    EntityHurt {
        /// The victim as observed at the moment of the hit.
        entity: EntitySnapshot,
    },
    /// Health or food changed.
    HealthChanged {
        /// New health.
        health: f32,
        /// New food.
        food: f32,
    },
    /// The agent died.
    Death,
    /// The agent came back after dying.
    Respawn,
    /// The session ended.
    End {
        /// Reason reported by the world.
        reason: String,
    },
}

/// Primitives and queries the agent drives the world through.
///
/// Implementations are shared between the command path, the combat tick, and
/// the reactive handlers, so every method takes `&self`.
pub trait WorldGateway: Send + Sync + 'static {
    // -- Identity and body --------------------------------------------------

    /// The agent's account name.
    fn username(&self) -> String;

    /// The agent's entity id.
    fn self_id(&self) -> EntityId;

    /// Feet position.
    fn position(&self) -> Vec3;

    /// Health points (0..=20).
    fn health(&self) -> f32;

    /// Food points (0..=20).
    fn food(&self) -> f32;

    /// Inventory stacks in slot order.
    fn inventory(&self) -> Vec<ItemStack>;

    // -- Queries ------------------------------------------------------------

    /// The block at `pos`, or `None` if the chunk is not loaded.
    fn block_at(&self, pos: BlockPos) -> Option<BlockSnapshot>;

    /// Nearest block named `name` within `max_distance` of the body.
    fn find_nearest_block(&self, name: &str, max_distance: f64) -> Option<BlockSnapshot>;

    /// Whether `name` is in the block registry.
    fn is_known_block(&self, name: &str) -> bool;

    /// Every entity currently tracked, excluding the agent itself.
    fn entities(&self) -> Vec<EntitySnapshot>;

    /// A player's entity, if they are online and within tracking range.
    fn player(&self, username: &str) -> Option<EntitySnapshot>;

    // -- Movement -----------------------------------------------------------

    /// Configure how subsequent travel may move.
    fn set_movements(&self, profile: MovementProfile);

    /// Install a goal without waiting for it, or clear it with `None`.
    /// Replacing a goal rejects any pending [`goto`](Self::goto).
    fn set_goal(&self, goal: Option<Goal>);

    /// Travel until `goal` is satisfied.
    fn goto(&self, goal: Goal) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Hold or release a movement control.
    fn set_control(&self, control: Control, held: bool);

    /// Release every held control.
    fn clear_controls(&self);

    // -- Interaction --------------------------------------------------------

    /// Break the block at `pos`. `force_look` snaps the view instead of
    /// turning smoothly.
    fn dig(
        &self,
        pos: BlockPos,
        force_look: bool,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Place the held block against `reference`, on its `face`. The new block
    /// lands at `reference.adjacent(face)`.
    fn place(
        &self,
        reference: BlockPos,
        face: Face,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Move an inventory item named `item` into `slot`.
    fn equip(
        &self,
        item: &str,
        slot: EquipSlot,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Turn to face `point`.
    fn look_at(&self, point: Vec3) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Swing at an entity.
    fn attack(&self, entity: EntityId) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Drop `count` items named `item`.
    fn toss(&self, item: &str, count: u32)
    -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Move `count` items named `item` into the container at `container`.
    fn deposit(
        &self,
        container: BlockPos,
        item: &str,
        count: u32,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Say something in world chat.
    fn chat(&self, message: &str);

    // -- Events -------------------------------------------------------------

    /// Subscribe to world events from this point on.
    fn subscribe(&self) -> broadcast::Receiver<WorldEvent>;
}
