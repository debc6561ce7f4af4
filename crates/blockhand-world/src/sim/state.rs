//! Mutable state behind a [`SimWorld`](super::SimWorld).
//!
//! All rules of the sandbox live here as synchronous methods on
//! [`SimState`]; the async gateway methods only yield and then call into
//! them under the lock.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use blockhand_types::{
    BlockPos, BlockSnapshot, Control, EntityCategory, EntityId, EntitySnapshot, ItemStack, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::blocks;
use crate::error::GatewayError;
use crate::gateway::WorldEvent;
use crate::goal::{Goal, MovementProfile};

use super::{FaultPlan, SimOp};

/// Maximum items per inventory stack.
pub const STACK_LIMIT: u32 = 64;

/// Farthest block the body can break.
pub const DIG_REACH: f64 = 6.0;

/// Farthest cell the body can place into.
pub const PLACE_REACH: f64 = 5.0;

/// Farthest entity the body can hit.
pub const ATTACK_REACH: f64 = 6.0;

/// Farthest container the body can open.
pub const CONTAINER_REACH: f64 = 5.0;

/// Maximum health and food.
pub const MAX_VITALS: f32 = 20.0;

/// Block names the registry knows besides those present in the world.
const REGISTRY: [&str; 30] = [
    "stone",
    "cobblestone",
    "dirt",
    "grass_block",
    "sand",
    "gravel",
    "clay",
    "bedrock",
    "oak_log",
    "oak_planks",
    "oak_leaves",
    "birch_log",
    "birch_planks",
    "spruce_log",
    "spruce_planks",
    "coal_ore",
    "iron_ore",
    "gold_ore",
    "diamond_ore",
    "redstone_ore",
    "chest",
    "crafting_table",
    "furnace",
    "glass",
    "torch",
    "water",
    "lava",
    "obsidian",
    "snow",
    "tall_grass",
];

/// Blocks that cannot be broken.
const UNBREAKABLE: [&str; 4] = ["bedrock", "water", "lava", "barrier"];

/// A block stored in the sparse voxel map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimBlock {
    /// Registry name.
    pub name: String,
    /// Whether digging is allowed.
    pub diggable: bool,
}

impl SimBlock {
    /// A block with the default diggability for its name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            diggable: !UNBREAKABLE.contains(&name) && !blocks::is_air(name),
        }
    }
}

/// A non-agent entity and its hit points.
#[derive(Debug, Clone)]
pub struct SimEntity {
    /// What observers see.
    pub snapshot: EntitySnapshot,
    /// Remaining hit points.
    pub health: f32,
}

/// Everything the sandbox tracks.
#[derive(Debug)]
pub struct SimState {
    pub(crate) username: String,
    pub(crate) self_id: EntityId,
    pub(crate) position: Vec3,
    pub(crate) spawn_point: Vec3,
    pub(crate) health: f32,
    pub(crate) food: f32,
    pub(crate) alive: bool,
    pub(crate) connected: bool,
    pub(crate) inventory: Vec<ItemStack>,
    pub(crate) held: Option<String>,
    pub(crate) blocks: HashMap<BlockPos, SimBlock>,
    pub(crate) registry: BTreeSet<String>,
    pub(crate) entities: BTreeMap<EntityId, SimEntity>,
    pub(crate) next_entity: u64,
    pub(crate) containers: HashMap<BlockPos, Vec<ItemStack>>,
    pub(crate) goal: Option<Goal>,
    pub(crate) goal_epoch: u64,
    pub(crate) movements: MovementProfile,
    pub(crate) controls: HashSet<Control>,
    pub(crate) look: Option<Vec3>,
    pub(crate) chat_log: Vec<String>,
    pub(crate) dropped: Vec<ItemStack>,
    pub(crate) ops: Vec<SimOp>,
    pub(crate) faults: FaultPlan,
    pub(crate) rng: StdRng,
}

impl SimState {
    /// Empty world with the body at `position`.
    pub(crate) fn new(username: String, position: Vec3, faults: FaultPlan) -> Self {
        Self {
            username,
            self_id: EntityId(1),
            position,
            spawn_point: position,
            health: MAX_VITALS,
            food: MAX_VITALS,
            alive: true,
            connected: true,
            inventory: Vec::new(),
            held: None,
            blocks: HashMap::new(),
            registry: REGISTRY.iter().map(|s| (*s).to_owned()).collect(),
            entities: BTreeMap::new(),
            next_entity: 2,
            containers: HashMap::new(),
            goal: None,
            goal_epoch: 0,
            movements: MovementProfile::default(),
            controls: HashSet::new(),
            look: None,
            chat_log: Vec::new(),
            dropped: Vec::new(),
            ops: Vec::new(),
            rng: StdRng::seed_from_u64(faults.seed),
            faults,
        }
    }

    // -- Blocks -------------------------------------------------------------

    /// Name of the block at `pos`; unset cells are air.
    pub(crate) fn block_name(&self, pos: BlockPos) -> &str {
        self.blocks.get(&pos).map_or("air", |b| b.name.as_str())
    }

    pub(crate) fn is_air(&self, pos: BlockPos) -> bool {
        blocks::is_air(self.block_name(pos))
    }

    pub(crate) fn snapshot_block(&self, pos: BlockPos) -> BlockSnapshot {
        let block = self
            .blocks
            .get(&pos)
            .cloned()
            .unwrap_or_else(|| SimBlock::named("air"));
        BlockSnapshot {
            position: pos,
            name: block.name,
            diggable: block.diggable,
        }
    }

    pub(crate) fn set_block(&mut self, pos: BlockPos, name: &str) {
        if blocks::is_air(name) {
            self.blocks.remove(&pos);
        } else {
            self.registry.insert(name.to_owned());
            self.blocks.insert(pos, SimBlock::named(name));
        }
    }

    pub(crate) fn nearest_block(&self, name: &str, max_distance: f64) -> Option<BlockSnapshot> {
        self.blocks
            .iter()
            .filter(|(_, b)| b.name == name)
            .map(|(pos, _)| (self.position.distance_to(pos.bottom_center()), *pos))
            .filter(|(d, _)| *d <= max_distance)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, pos)| self.snapshot_block(pos))
    }

    // -- Inventory ----------------------------------------------------------

    pub(crate) fn add_item(&mut self, name: &str, count: u32) {
        let mut remaining = count;
        for stack in self.inventory.iter_mut().filter(|s| s.name == name) {
            let moved = STACK_LIMIT.saturating_sub(stack.count).min(remaining);
            stack.count = stack.count.saturating_add(moved);
            remaining = remaining.saturating_sub(moved);
        }
        while remaining > 0 {
            let moved = remaining.min(STACK_LIMIT);
            self.inventory
                .push(ItemStack::new(name, moved, display_name(name)));
            remaining = remaining.saturating_sub(moved);
        }
    }

    pub(crate) fn remove_item(&mut self, name: &str, count: u32) -> Result<(), GatewayError> {
        let available: u32 = self
            .inventory
            .iter()
            .filter(|s| s.name == name)
            .map(|s| s.count)
            .fold(0, u32::saturating_add);
        if available < count {
            return Err(GatewayError::MissingItem(name.to_owned()));
        }
        let mut remaining = count;
        for stack in self.inventory.iter_mut().filter(|s| s.name == name) {
            let taken = stack.count.min(remaining);
            stack.count = stack.count.saturating_sub(taken);
            remaining = remaining.saturating_sub(taken);
        }
        self.inventory.retain(|s| s.count > 0);
        if self.held.as_deref() == Some(name) && !self.inventory.iter().any(|s| s.name == name) {
            self.held = None;
        }
        Ok(())
    }

    // -- Movement -----------------------------------------------------------

    /// A cell the body can occupy: two cells of air over solid ground.
    pub(crate) fn is_standing_cell(&self, cell: BlockPos) -> bool {
        self.is_air(cell) && self.is_air(cell.above()) && !self.is_air(cell.below())
    }

    /// Where the body should stop to be within `range` of `target`.
    ///
    /// Picks the qualifying standing cell closest to the current position,
    /// so the body halts at the edge of the range like a pathfinder would.
    pub(crate) fn resolve_near(&self, target: Vec3, range: f64) -> Option<Vec3> {
        if self.position.distance_to(target) <= range {
            return Some(self.position);
        }
        let centre = target.floored();
        let r = search_extent(range);
        let mut best: Option<(f64, Vec3)> = None;
        for dx in r.saturating_neg()..=r {
            for dy in r.saturating_neg()..=r {
                for dz in r.saturating_neg()..=r {
                    let cell = centre.offset(dx, dy, dz);
                    let stand = cell.bottom_center();
                    if stand.distance_to(target) > range || !self.is_standing_cell(cell) {
                        continue;
                    }
                    let d = stand.distance_to(self.position);
                    if best.is_none_or(|(bd, _)| d < bd) {
                        best = Some((d, stand));
                    }
                }
            }
        }
        best.map(|(_, stand)| stand)
    }

    /// Destination satisfying `goal`, or `NoPath`.
    pub(crate) fn resolve_goal(&self, goal: Goal) -> Result<Vec3, GatewayError> {
        let found = match goal {
            Goal::Near { target, range } => self.resolve_near(target, range),
            Goal::Block { pos } => self.resolve_near(pos.bottom_center(), 2.0),
            Goal::Follow { entity, range } => {
                let target = self
                    .entities
                    .get(&entity)
                    .map(|e| e.snapshot.position)
                    .ok_or(GatewayError::UnknownEntity(entity))?;
                self.resolve_near(target, range)
            }
        };
        found.ok_or(GatewayError::NoPath(goal))
    }

    /// Move toward the standing goal, if any. Failures leave the body put.
    pub(crate) fn apply_goal(&mut self) {
        if let Some(dest) = self.goal.and_then(|g| self.resolve_goal(g).ok()) {
            self.position = dest;
        }
    }

    // -- Faults -------------------------------------------------------------

    pub(crate) fn inject(&mut self, rate: f64, what: &'static str) -> Result<(), GatewayError> {
        if rate > 0.0 && self.rng.random_bool(rate.clamp(0.0, 1.0)) {
            return Err(GatewayError::Injected(what));
        }
        Ok(())
    }

    pub(crate) const fn ensure_alive(&self) -> Result<(), GatewayError> {
        if self.alive && self.connected {
            Ok(())
        } else {
            Err(GatewayError::Disconnected)
        }
    }

    // -- Entities -----------------------------------------------------------

    pub(crate) fn spawn_entity(
        &mut self,
        name: &str,
        category: EntityCategory,
        position: Vec3,
        username: Option<String>,
    ) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        let snapshot = EntitySnapshot {
            id,
            name: Some(name.to_owned()),
            display_name: Some(display_name(name)),
            username,
            category,
            position,
            height: entity_height(name),
        };
        self.entities.insert(
            id,
            SimEntity {
                snapshot,
                health: MAX_VITALS,
            },
        );
        id
    }

    pub(crate) fn player_entity(&self, username: &str) -> Option<&SimEntity> {
        self.entities
            .values()
            .find(|e| e.snapshot.username.as_deref() == Some(username))
    }

    /// Apply damage to the body, returning the events it produced.
    pub(crate) fn damage_self(&mut self, amount: f32) -> Vec<WorldEvent> {
        if !self.alive {
            return Vec::new();
        }
        self.health = (self.health - amount).max(0.0);
        let mut events = vec![
            WorldEvent::SelfHurt,
            WorldEvent::HealthChanged {
                health: self.health,
                food: self.food,
            },
        ];
        if self.health <= 0.0 {
            self.alive = false;
            self.goal = None;
            self.goal_epoch = self.goal_epoch.saturating_add(1);
            events.push(WorldEvent::Death);
        }
        events
    }

    /// Apply damage to another entity, removing it when it drops to zero.
    pub(crate) fn damage_entity(&mut self, id: EntityId, amount: f32) -> Option<WorldEvent> {
        let entity = self.entities.get_mut(&id)?;
        entity.health = (entity.health - amount).max(0.0);
        let snapshot = entity.snapshot.clone();
        // Players are never removed; they respawn on their own.
        if entity.health <= 0.0 && snapshot.category != EntityCategory::Player {
            self.entities.remove(&id);
        }
        Some(WorldEvent::EntityHurt { entity: snapshot })
    }
}

/// Human-facing name derived from a registry name: `oak_log` -> `Oak Log`.
pub fn display_name(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Item obtained by breaking `block`, if any.
pub fn drop_for(block: &str) -> Option<&str> {
    match block {
        "stone" => Some("cobblestone"),
        "grass_block" => Some("dirt"),
        "coal_ore" => Some("coal"),
        "diamond_ore" => Some("diamond"),
        "redstone_ore" => Some("redstone"),
        "oak_leaves" | "glass" => None,
        other if blocks::is_vegetation(other) => None,
        other => Some(other),
    }
}

fn entity_height(name: &str) -> f64 {
    match name {
        "spider" | "cave_spider" => 0.9,
        "creeper" => 1.7,
        "player" => 1.8,
        "enderman" => 2.9,
        "slime" => 1.04,
        "chicken" => 0.7,
        "cow" | "pig" | "sheep" => 1.3,
        _ => 1.95,
    }
}

/// Half-width of the cube searched around a travel target.
#[allow(clippy::cast_possible_truncation)]
fn search_extent(range: f64) -> i32 {
    // Clamped to a small positive value before the cast.
    (range.ceil().clamp(0.0, 16.0) as i32).saturating_add(1)
}
