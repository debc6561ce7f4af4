//! The demo world the runner binary plays in, and its mob behaviour.

use blockhand_types::{BlockPos, EntityCategory, EntityId, Vec3};
use rand::Rng;

use super::{FaultPlan, SimWorld, SimWorldBuilder};

/// Top layer of the demo plain.
const GROUND_Y: i32 = 63;

/// Distance at which a hostile mob notices a target.
const AGGRO_RANGE: f64 = 16.0;

/// Distance at which a hostile mob lands a hit.
const MELEE_RANGE: f64 = 1.8;

/// Damage per mob hit.
const MOB_DAMAGE: f32 = 2.0;

/// Hostile population the demo tops back up to.
const MIN_HOSTILES: usize = 2;

/// Tree trunks in the demo world: `(x, z, trunk height)`.
const TREES: [(i32, i32, i32); 5] = [(-9, -6, 5), (12, 8, 4), (-14, 11, 5), (7, -13, 4), (16, -4, 5)];

impl SimWorld {
    /// A grass plain with trees, stone outcrops, a chest, the player
    /// `Steve`, a few hostile mobs, and a starter kit, entered as
    /// `username`.
    pub fn demo(username: &str, seed: u64) -> Self {
        let surface = GROUND_Y.saturating_add(1);
        let mut builder = SimWorldBuilder::new()
            .username(username)
            .flat_ground(40, GROUND_Y)
            .spawn_at(Vec3::new(0.5, f64::from(surface), 0.5))
            .faults(FaultPlan {
                seed,
                ..FaultPlan::default()
            })
            .player("Steve", Vec3::new(3.5, f64::from(surface), 2.5))
            .mob("zombie", EntityCategory::Hostile, Vec3::new(20.5, f64::from(surface), -15.5))
            .mob("skeleton", EntityCategory::Hostile, Vec3::new(-24.5, f64::from(surface), 9.5))
            .mob("cow", EntityCategory::Animal, Vec3::new(-6.5, f64::from(surface), 14.5))
            .block(BlockPos::new(-4, surface, 3), "chest")
            .item("oak_planks", 64)
            .item("oak_log", 32)
            .item("cobblestone", 128)
            .item("iron_sword", 1)
            .item("bread", 8);

        for (x, z, height) in TREES {
            for dy in 0..height {
                builder = builder.block(BlockPos::new(x, surface.saturating_add(dy), z), "oak_log");
            }
            let crown = surface.saturating_add(height);
            for dx in -1..=1 {
                for dz in -1..=1 {
                    builder = builder.block(
                        BlockPos::new(x.saturating_add(dx), crown, z.saturating_add(dz)),
                        "oak_leaves",
                    );
                }
            }
        }

        // Stone outcrops and a cobblestone pile.
        for (x, z) in [(-18, -18), (-17, -18), (-18, -17), (22, 20), (23, 20)] {
            builder = builder.block(BlockPos::new(x, surface, z), "stone");
        }
        for x in 9..=11 {
            builder = builder.block(BlockPos::new(x, surface, -2), "cobblestone");
        }
        builder = builder.block(BlockPos::new(-20, surface, 4), "coal_ore");

        for (x, z) in [(2, 7), (-5, -3), (6, 5), (-11, 2), (14, -9)] {
            builder = builder.block(BlockPos::new(x, surface, z), "tall_grass");
        }

        builder.build()
    }

    /// Advance mob behaviour one step: hostiles close in on the nearest
    /// player or the agent and hit whatever they reach. Keeps a small
    /// hostile population alive.
    pub fn step_mobs(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            if !state.alive || !state.connected {
                return;
            }
            let agent_pos = state.position;
            let players: Vec<(EntityId, Vec3)> = state
                .entities
                .values()
                .filter(|e| e.snapshot.category == EntityCategory::Player)
                .map(|e| (e.snapshot.id, e.snapshot.position))
                .collect();
            let hostiles: Vec<EntityId> = state
                .entities
                .values()
                .filter(|e| e.snapshot.category == EntityCategory::Hostile)
                .map(|e| e.snapshot.id)
                .collect();

            for id in &hostiles {
                let Some(pos) = state.entities.get(id).map(|e| e.snapshot.position) else {
                    continue;
                };
                // `None` means the agent is the quarry.
                let mut quarry: Option<(Option<EntityId>, Vec3, f64)> = None;
                let candidates = players
                    .iter()
                    .map(|(pid, ppos)| (Some(*pid), *ppos))
                    .chain(core::iter::once((None, agent_pos)));
                for (who, at) in candidates {
                    let d = pos.distance_to(at);
                    if d <= AGGRO_RANGE && quarry.is_none_or(|(_, _, best)| d < best) {
                        quarry = Some((who, at, d));
                    }
                }
                let Some((who, at, distance)) = quarry else {
                    continue;
                };
                if distance <= MELEE_RANGE {
                    if !state.rng.random_bool(0.5) {
                        continue;
                    }
                    match who {
                        None => events.extend(state.damage_self(MOB_DAMAGE)),
                        Some(player) => events.extend(state.damage_entity(player, MOB_DAMAGE)),
                    }
                } else {
                    let step = 1.0 / distance;
                    let next = Vec3::new(
                        (at.x - pos.x).mul_add(step, pos.x),
                        pos.y,
                        (at.z - pos.z).mul_add(step, pos.z),
                    );
                    if let Some(entity) = state.entities.get_mut(id) {
                        entity.snapshot.position = next;
                    }
                }
            }

            if hostiles.len() < MIN_HOSTILES && state.rng.random_bool(0.1) {
                let x = state.rng.random_range(-30.0..30.0);
                let z = state.rng.random_range(-30.0..30.0);
                let name = if state.rng.random_bool(0.5) { "zombie" } else { "spider" };
                let surface = f64::from(GROUND_Y.saturating_add(1));
                state.spawn_entity(name, EntityCategory::Hostile, Vec3::new(x, surface, z), None);
            }

            // Players heal slowly so the demo can go on forever.
            for entity in state.entities.values_mut() {
                if entity.snapshot.category == EntityCategory::Player {
                    entity.health = (entity.health + 0.5).min(super::state::MAX_VITALS);
                }
            }

            state.apply_goal();
        }
        self.emit(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::WorldGateway;

    #[test]
    fn demo_has_player_chest_and_kit() {
        let world = SimWorld::demo("Pengu", 7);
        assert!(world.player("Steve").is_some());
        assert_eq!(world.block_name(BlockPos::new(-4, 64, 3)), "chest");
        assert!(world.inventory().iter().any(|s| s.name == "iron_sword"));
        assert!(world.find_nearest_block("cobblestone", 32.0).is_some());
    }

    #[test]
    fn hostiles_close_in() {
        let world = SimWorld::demo("Pengu", 7);
        let zombie = world
            .entities()
            .into_iter()
            .find(|e| e.name.as_deref() == Some("zombie"))
            .map(|e| e.id);
        assert!(zombie.is_some());
        let Some(zombie) = zombie else { return };
        world.move_entity(zombie, Vec3::new(10.5, 64.0, 0.5));
        let before = world.entity(zombie).map(|e| e.position.distance_to(world.position()));
        world.step_mobs();
        let after = world.entity(zombie).map(|e| e.position.distance_to(world.position()));
        assert!(after < before);
    }
}
