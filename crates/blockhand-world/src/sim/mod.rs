//! [`SimWorld`]: a deterministic in-memory voxel sandbox.
//!
//! The sandbox implements [`WorldGateway`] with simple, inspectable rules:
//!
//! - Blocks live in a sparse map; unset cells are air.
//! - Travel is instantaneous. The body stops at the standing cell (air over
//!   solid ground) inside the goal's range that is closest to where it was.
//!   A pending [`goto`](WorldGateway::goto) yields once and is rejected if
//!   the goal was replaced in the meantime.
//! - Digging and placing check reach, solidity, and body occupancy. Placing
//!   into the cell the body stands in succeeds only while `Jump` is held,
//!   lifting the body one block.
//! - Every primitive is recorded as a [`SimOp`] for assertions, and the
//!   [`FaultPlan`] injects seeded random rejections.
//!
//! Test and demo code drives the outside world through the helper methods
//! (`hurt_self`, `say`, `spawn_mob`, ...), which emit the same
//! [`WorldEvent`]s a real server would.

mod demo;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blockhand_types::{
    BlockPos, BlockSnapshot, Control, EntityCategory, EntityId, EntitySnapshot, EquipSlot, Face,
    ItemStack, Vec3,
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::blocks;
use crate::error::GatewayError;
use crate::gateway::{WorldEvent, WorldGateway};
use crate::goal::{Goal, MovementProfile};

pub use state::{ATTACK_REACH, CONTAINER_REACH, DIG_REACH, PLACE_REACH, display_name};

use state::{SimState, drop_for};

/// Capacity of the world event channel.
const EVENT_CAPACITY: usize = 256;

/// Damage dealt by a bare-handed or non-weapon swing.
const FIST_DAMAGE: f32 = 1.0;

/// Damage dealt while holding a sword or axe.
const WEAPON_DAMAGE: f32 = 7.0;

/// Seeded probabilities of rejecting each primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultPlan {
    /// Chance a `dig` is rejected.
    pub dig: f64,
    /// Chance a `place` is rejected.
    pub place: f64,
    /// Chance a `goto` is rejected.
    pub goto: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            dig: 0.0,
            place: 0.0,
            goto: 0.0,
            seed: 0x5eed,
        }
    }
}

/// One recorded primitive call.
#[derive(Debug, Clone, PartialEq)]
pub enum SimOp {
    /// `goto` was called.
    Goto(Goal),
    /// `set_goal` was called.
    SetGoal(Option<Goal>),
    /// `dig` was called; `dug` is whether it succeeded.
    Dig {
        /// Target block.
        pos: BlockPos,
        /// Outcome.
        dug: bool,
    },
    /// `place` was called; `placed` is whether it succeeded.
    Place {
        /// Cell the block would land in.
        target: BlockPos,
        /// Outcome.
        placed: bool,
    },
    /// `equip` succeeded.
    Equip(String),
    /// `look_at` succeeded.
    LookAt(Vec3),
    /// `attack` succeeded.
    Attack(EntityId),
    /// `toss` succeeded.
    Toss {
        /// Item name.
        item: String,
        /// Amount.
        count: u32,
    },
    /// `deposit` succeeded.
    Deposit {
        /// Item name.
        item: String,
        /// Amount.
        count: u32,
    },
    /// `clear_controls` was called.
    ClearControls,
}

/// Shared handle to a sandbox world. Clones observe the same world.
#[derive(Debug, Clone)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
    events: broadcast::Sender<WorldEvent>,
}

impl SimWorld {
    /// Start describing a world.
    pub fn builder() -> SimWorldBuilder {
        SimWorldBuilder::new()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: impl IntoIterator<Item = WorldEvent>) {
        for event in events {
            // No subscribers is not an error for a sandbox.
            let _ = self.events.send(event);
        }
    }

    // -- Outside-world drivers ----------------------------------------------

    /// Announce the first spawn.
    pub fn announce_spawn(&self) {
        self.emit([WorldEvent::Spawn]);
    }

    /// A player says something.
    pub fn say(&self, username: &str, message: &str) {
        self.emit([WorldEvent::Chat {
            username: username.to_owned(),
            message: message.to_owned(),
        }]);
    }

    /// Something hits the agent.
    pub fn hurt_self(&self, amount: f32) {
        let events = self.lock().damage_self(amount);
        self.emit(events);
    }

    /// Something hits another entity.
    pub fn hurt_entity(&self, id: EntityId, amount: f32) {
        let event = self.lock().damage_entity(id, amount);
        self.emit(event);
    }

    /// Bring the agent back at its spawn point with full vitals.
    pub fn respawn(&self) {
        let (health, food) = {
            let mut state = self.lock();
            state.alive = true;
            state.health = state::MAX_VITALS;
            state.food = state::MAX_VITALS;
            state.position = state.spawn_point;
            state.goal = None;
            state.controls.clear();
            (state.health, state.food)
        };
        self.emit([
            WorldEvent::Respawn,
            WorldEvent::HealthChanged { health, food },
        ]);
    }

    /// End the session.
    pub fn disconnect(&self, reason: &str) {
        self.lock().connected = false;
        self.emit([WorldEvent::End {
            reason: reason.to_owned(),
        }]);
    }

    /// Add a mob and return its id.
    pub fn spawn_mob(&self, name: &str, category: EntityCategory, position: Vec3) -> EntityId {
        self.lock().spawn_entity(name, category, position, None)
    }

    /// Add a player and return their entity id.
    pub fn spawn_player(&self, username: &str, position: Vec3) -> EntityId {
        self.lock().spawn_entity(
            "player",
            EntityCategory::Player,
            position,
            Some(username.to_owned()),
        )
    }

    /// Remove an entity.
    pub fn despawn(&self, id: EntityId) {
        self.lock().entities.remove(&id);
    }

    /// Teleport an entity and re-apply any standing follow goal.
    pub fn move_entity(&self, id: EntityId, position: Vec3) {
        let mut state = self.lock();
        if let Some(entity) = state.entities.get_mut(&id) {
            entity.snapshot.position = position;
        }
        state.apply_goal();
    }

    /// Overwrite a block.
    pub fn set_block(&self, pos: BlockPos, name: &str) {
        self.lock().set_block(pos, name);
    }

    /// Add items to the agent's inventory.
    pub fn give(&self, name: &str, count: u32) {
        self.lock().add_item(name, count);
    }

    /// Teleport the agent.
    pub fn teleport(&self, position: Vec3) {
        self.lock().position = position;
    }

    /// Replace the fault plan.
    pub fn set_faults(&self, faults: FaultPlan) {
        let mut state = self.lock();
        state.rng = rand::SeedableRng::seed_from_u64(faults.seed);
        state.faults = faults;
    }

    // -- Inspection ---------------------------------------------------------

    /// Name of the block at `pos`.
    pub fn block_name(&self, pos: BlockPos) -> String {
        self.lock().block_name(pos).to_owned()
    }

    /// Everything the agent said, oldest first.
    pub fn chat_log(&self) -> Vec<String> {
        self.lock().chat_log.clone()
    }

    /// Recorded primitive calls, oldest first.
    pub fn ops(&self) -> Vec<SimOp> {
        self.lock().ops.clone()
    }

    /// Forget recorded primitive calls.
    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// The standing goal, if any.
    pub fn current_goal(&self) -> Option<Goal> {
        self.lock().goal
    }

    /// The active movement profile.
    pub fn movements(&self) -> MovementProfile {
        self.lock().movements
    }

    /// Item in the main hand.
    pub fn held_item(&self) -> Option<String> {
        self.lock().held.clone()
    }

    /// Controls currently held.
    pub fn held_controls(&self) -> Vec<Control> {
        self.lock().controls.iter().copied().collect()
    }

    /// Contents of the container at `pos`.
    pub fn container_contents(&self, pos: BlockPos) -> Vec<ItemStack> {
        self.lock().containers.get(&pos).cloned().unwrap_or_default()
    }

    /// Items the agent has thrown on the ground.
    pub fn dropped(&self) -> Vec<ItemStack> {
        self.lock().dropped.clone()
    }

    /// Whether the agent is alive.
    pub fn is_alive(&self) -> bool {
        self.lock().alive
    }

    /// Look up any entity by id.
    pub fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.lock().entities.get(&id).map(|e| e.snapshot.clone())
    }
}

impl WorldGateway for SimWorld {
    fn username(&self) -> String {
        self.lock().username.clone()
    }

    fn self_id(&self) -> EntityId {
        self.lock().self_id
    }

    fn position(&self) -> Vec3 {
        self.lock().position
    }

    fn health(&self) -> f32 {
        self.lock().health
    }

    fn food(&self) -> f32 {
        self.lock().food
    }

    fn inventory(&self) -> Vec<ItemStack> {
        self.lock().inventory.clone()
    }

    fn block_at(&self, pos: BlockPos) -> Option<BlockSnapshot> {
        Some(self.lock().snapshot_block(pos))
    }

    fn find_nearest_block(&self, name: &str, max_distance: f64) -> Option<BlockSnapshot> {
        self.lock().nearest_block(name, max_distance)
    }

    fn is_known_block(&self, name: &str) -> bool {
        self.lock().registry.contains(name)
    }

    fn entities(&self) -> Vec<EntitySnapshot> {
        self.lock()
            .entities
            .values()
            .map(|e| e.snapshot.clone())
            .collect()
    }

    fn player(&self, username: &str) -> Option<EntitySnapshot> {
        self.lock()
            .player_entity(username)
            .map(|e| e.snapshot.clone())
    }

    fn set_movements(&self, profile: MovementProfile) {
        self.lock().movements = profile;
    }

    fn set_goal(&self, goal: Option<Goal>) {
        let mut state = self.lock();
        state.ops.push(SimOp::SetGoal(goal));
        state.goal = goal;
        state.goal_epoch = state.goal_epoch.saturating_add(1);
        state.apply_goal();
    }

    async fn goto(&self, goal: Goal) -> Result<(), GatewayError> {
        let epoch = {
            let mut state = self.lock();
            state.ensure_alive()?;
            state.ops.push(SimOp::Goto(goal));
            let rate = state.faults.goto;
            state.inject(rate, "goto")?;
            state.goal = Some(goal);
            state.goal_epoch = state.goal_epoch.saturating_add(1);
            state.goal_epoch
        };
        tokio::task::yield_now().await;
        let mut state = self.lock();
        if state.goal_epoch != epoch {
            return Err(GatewayError::GoalChanged);
        }
        state.goal = None;
        state.goal_epoch = state.goal_epoch.saturating_add(1);
        let dest = state.resolve_goal(goal)?;
        state.position = dest;
        Ok(())
    }

    fn set_control(&self, control: Control, held: bool) {
        let mut state = self.lock();
        if held {
            state.controls.insert(control);
        } else {
            state.controls.remove(&control);
        }
    }

    fn clear_controls(&self) {
        let mut state = self.lock();
        state.ops.push(SimOp::ClearControls);
        state.controls.clear();
    }

    async fn dig(&self, pos: BlockPos, _force_look: bool) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        let result = dig_inner(&mut state, pos);
        state.ops.push(SimOp::Dig {
            pos,
            dug: result.is_ok(),
        });
        result
    }

    async fn place(&self, reference: BlockPos, face: Face) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let target = reference.adjacent(face);
        let mut state = self.lock();
        let result = place_inner(&mut state, reference, target);
        state.ops.push(SimOp::Place {
            target,
            placed: result.is_ok(),
        });
        result
    }

    async fn equip(&self, item: &str, _slot: EquipSlot) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.ensure_alive()?;
        if !state.inventory.iter().any(|s| s.name == item) {
            return Err(GatewayError::MissingItem(item.to_owned()));
        }
        state.held = Some(item.to_owned());
        state.ops.push(SimOp::Equip(item.to_owned()));
        Ok(())
    }

    async fn look_at(&self, point: Vec3) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.ensure_alive()?;
        state.look = Some(point);
        state.ops.push(SimOp::LookAt(point));
        Ok(())
    }

    async fn attack(&self, entity: EntityId) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let event = {
            let mut state = self.lock();
            state.ensure_alive()?;
            let target = state
                .entities
                .get(&entity)
                .map(|e| e.snapshot.position)
                .ok_or(GatewayError::UnknownEntity(entity))?;
            let distance = state.position.distance_to(target);
            if distance > ATTACK_REACH {
                return Err(GatewayError::OutOfReach {
                    pos: target.floored(),
                    distance,
                });
            }
            let armed = state
                .held
                .as_deref()
                .is_some_and(|h| h.contains("sword") || h.contains("axe"));
            let damage = if armed { WEAPON_DAMAGE } else { FIST_DAMAGE };
            state.ops.push(SimOp::Attack(entity));
            state.damage_entity(entity, damage)
        };
        self.emit(event);
        Ok(())
    }

    async fn toss(&self, item: &str, count: u32) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.ensure_alive()?;
        state.remove_item(item, count)?;
        state
            .dropped
            .push(ItemStack::new(item, count, display_name(item)));
        state.ops.push(SimOp::Toss {
            item: item.to_owned(),
            count,
        });
        Ok(())
    }

    async fn deposit(&self, container: BlockPos, item: &str, count: u32) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.ensure_alive()?;
        if state.block_name(container) != blocks::CHEST {
            return Err(GatewayError::NotAContainer(container));
        }
        let distance = state.position.distance_to_block(container);
        if distance > CONTAINER_REACH {
            return Err(GatewayError::OutOfReach {
                pos: container,
                distance,
            });
        }
        state.remove_item(item, count)?;
        state
            .containers
            .entry(container)
            .or_default()
            .push(ItemStack::new(item, count, display_name(item)));
        state.ops.push(SimOp::Deposit {
            item: item.to_owned(),
            count,
        });
        Ok(())
    }

    fn chat(&self, message: &str) {
        let username = {
            let mut state = self.lock();
            state.chat_log.push(message.to_owned());
            state.username.clone()
        };
        self.emit([WorldEvent::Chat {
            username,
            message: message.to_owned(),
        }]);
    }

    fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.events.subscribe()
    }
}

fn dig_inner(state: &mut SimState, pos: BlockPos) -> Result<(), GatewayError> {
    state.ensure_alive()?;
    let rate = state.faults.dig;
    state.inject(rate, "dig")?;
    let block = state.snapshot_block(pos);
    if block.is_air() || !block.diggable {
        return Err(GatewayError::NotDiggable(pos));
    }
    let distance = state.position.distance_to_block(pos);
    if distance > DIG_REACH {
        return Err(GatewayError::OutOfReach { pos, distance });
    }
    state.set_block(pos, "air");
    if let Some(item) = drop_for(&block.name) {
        state.add_item(item, 1);
    }
    debug!(%pos, block = %block.name, "sim: dug block");
    Ok(())
}

fn place_inner(
    state: &mut SimState,
    reference: BlockPos,
    target: BlockPos,
) -> Result<(), GatewayError> {
    state.ensure_alive()?;
    let rate = state.faults.place;
    state.inject(rate, "place")?;
    if state.is_air(reference) {
        return Err(GatewayError::NoReference(reference));
    }
    if !state.is_air(target) {
        return Err(GatewayError::Occupied(target));
    }
    let item = state
        .held
        .clone()
        .ok_or_else(|| GatewayError::MissingItem("empty hand".to_owned()))?;
    if !state.inventory.iter().any(|s| s.name == item) {
        return Err(GatewayError::MissingItem(item));
    }
    let distance = state.position.distance_to_block(target);
    if distance > PLACE_REACH {
        return Err(GatewayError::OutOfReach {
            pos: target,
            distance,
        });
    }
    let feet = state.position.floored();
    if target == feet.above() {
        return Err(GatewayError::Occupied(target));
    }
    if target == feet {
        let jumping = state.controls.contains(&Control::Jump);
        if !jumping || !state.is_air(feet.above().above()) {
            return Err(GatewayError::Occupied(target));
        }
        state.position = state.position.offset(0.0, 1.0, 0.0);
    }
    state.remove_item(&item, 1)?;
    // Keep the block in hand while any of it remains.
    if state.inventory.iter().any(|s| s.name == item) {
        state.held = Some(item.clone());
    }
    state.set_block(target, &item);
    debug!(%target, block = %item, "sim: placed block");
    Ok(())
}

/// Fluent description of a [`SimWorld`].
#[derive(Debug, Clone)]
pub struct SimWorldBuilder {
    username: String,
    spawn: Vec3,
    ground: Option<(i32, i32)>,
    blocks: Vec<(BlockPos, String)>,
    mobs: Vec<(String, EntityCategory, Vec3)>,
    players: Vec<(String, Vec3)>,
    items: Vec<(String, u32)>,
    faults: FaultPlan,
}

impl SimWorldBuilder {
    fn new() -> Self {
        Self {
            username: "Pengu".to_owned(),
            spawn: Vec3::new(0.5, 64.0, 0.5),
            ground: None,
            blocks: Vec::new(),
            mobs: Vec::new(),
            players: Vec::new(),
            items: Vec::new(),
            faults: FaultPlan::default(),
        }
    }

    /// The agent's account name.
    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_owned();
        self
    }

    /// Where the agent spawns.
    #[must_use]
    pub const fn spawn_at(mut self, position: Vec3) -> Self {
        self.spawn = position;
        self
    }

    /// A square grass plain of half-width `radius` whose top layer is at
    /// `top_y`, with dirt and unbreakable bedrock beneath.
    #[must_use]
    pub const fn flat_ground(mut self, radius: i32, top_y: i32) -> Self {
        self.ground = Some((radius, top_y));
        self
    }

    /// One block.
    #[must_use]
    pub fn block(mut self, pos: BlockPos, name: &str) -> Self {
        self.blocks.push((pos, name.to_owned()));
        self
    }

    /// A mob.
    #[must_use]
    pub fn mob(mut self, name: &str, category: EntityCategory, position: Vec3) -> Self {
        self.mobs.push((name.to_owned(), category, position));
        self
    }

    /// A player.
    #[must_use]
    pub fn player(mut self, username: &str, position: Vec3) -> Self {
        self.players.push((username.to_owned(), position));
        self
    }

    /// Starting inventory.
    #[must_use]
    pub fn item(mut self, name: &str, count: u32) -> Self {
        self.items.push((name.to_owned(), count));
        self
    }

    /// Fault injection.
    #[must_use]
    pub const fn faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Materialise the world.
    pub fn build(self) -> SimWorld {
        let mut state = SimState::new(self.username, self.spawn, self.faults);
        if let Some((radius, top)) = self.ground {
            for x in radius.saturating_neg()..=radius {
                for z in radius.saturating_neg()..=radius {
                    state.set_block(BlockPos::new(x, top, z), "grass_block");
                    state.set_block(BlockPos::new(x, top.saturating_sub(1), z), "dirt");
                    state.set_block(BlockPos::new(x, top.saturating_sub(2), z), "bedrock");
                }
            }
        }
        for (pos, name) in &self.blocks {
            state.set_block(*pos, name);
        }
        for (name, category, position) in &self.mobs {
            state.spawn_entity(name, *category, *position, None);
        }
        for (username, position) in self.players {
            state.spawn_entity("player", EntityCategory::Player, position, Some(username));
        }
        for (name, count) in &self.items {
            state.add_item(name, *count);
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SimWorld {
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }
}
