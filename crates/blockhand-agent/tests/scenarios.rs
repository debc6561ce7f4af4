//! End-to-end scenarios driving the agent against the in-memory world.
//!
//! Every test runs on a paused clock, so combat ticks, dig pauses, and
//! respawn delays elapse instantly once the runtime is otherwise idle.

#![allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use blockhand_agent::{Agent, BehaviorConfig};
use blockhand_types::{
    ActionRequest, AgentEvent, BlockPos, BlockSnapshot, BuildPhase, CommandSource, Control,
    Decision, EntityCategory, EntityId, EntitySnapshot, EquipSlot, Face, ItemStack, TaskKind, Vec3,
};
use blockhand_world::{
    FaultPlan, GatewayError, Goal, MovementProfile, SimWorld, SimWorldBuilder, WorldEvent,
    WorldGateway,
};
use tokio::sync::broadcast;

fn plain() -> SimWorldBuilder {
    SimWorld::builder().flat_ground(24, 63)
}

fn agent_for(world: &SimWorld) -> Agent<SimWorld> {
    Agent::new(Arc::new(world.clone()), BehaviorConfig::default())
}

fn said(world: &SimWorld, line: &str) -> bool {
    world.chat_log().iter().any(|l| l == line)
}

async fn wait_for_task(agent: &Agent<SimWorld>, kind: TaskKind) {
    for _ in 0..100 {
        if agent.task_kind() == kind {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("agent never reached {kind}");
}

// ---------------------------------------------------------------------------
// Gather
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn mine_three_cobblestone() {
    let world = plain()
        .block(BlockPos::new(4, 64, 0), "cobblestone")
        .block(BlockPos::new(-6, 64, 3), "cobblestone")
        .block(BlockPos::new(9, 64, -8), "cobblestone")
        .block(BlockPos::new(12, 64, 12), "cobblestone")
        .build();
    let agent = agent_for(&world);

    let mined = agent.mine("cobblestone", 3).await;

    assert_eq!(mined, Some(3));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(said(&world, "Got 3x cobblestone! ✓"));
    let held: u32 = world
        .inventory()
        .iter()
        .filter(|s| s.name == "cobblestone")
        .map(|s| s.count)
        .sum();
    assert_eq!(held, 3);
}

#[tokio::test(start_paused = true)]
async fn mining_stops_when_blocks_run_out() {
    let world = plain()
        .block(BlockPos::new(3, 64, 3), "coal_ore")
        .block(BlockPos::new(-3, 64, 2), "coal_ore")
        .build();
    let agent = agent_for(&world);

    let mined = agent.mine("coal_ore", 5).await;

    assert_eq!(mined, Some(2));
    assert!(said(&world, "Only found 2/5 coal_ore."));
    assert!(said(&world, "Got 2x coal_ore! ✓"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn unknown_or_empty_block_names_are_refused() {
    let world = plain().build();
    let agent = agent_for(&world);

    assert_eq!(agent.mine("", 1).await, None);
    assert_eq!(agent.mine("unobtainium", 1).await, None);
    assert!(said(&world, "What should I mine?"));
    assert!(said(&world, "I don't know what \"unobtainium\" is."));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn mining_fails_when_the_connection_drops() {
    let world = plain().block(BlockPos::new(4, 64, 0), "stone").build();
    let agent = agent_for(&world);
    world.disconnect("kicked");

    assert_eq!(agent.mine("stone", 2).await, None);
    assert!(said(&world, "Mining failed!"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn builder_world() -> SimWorldBuilder {
    plain()
        .item("oak_planks", 64)
        .item("oak_log", 32)
        .item("cobblestone", 128)
}

#[tokio::test(start_paused = true)]
async fn build_house_leaves_a_closed_shell_with_a_doorway() {
    let world = builder_world().build();
    let agent = agent_for(&world);

    let report = agent.build_house().await.unwrap();

    assert_eq!(report.phase, BuildPhase::Done);
    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(said(&world, "House complete! 🏠"));

    let plan = report.plan;
    let solid = |x: i32, y: i32, z: i32| world.block_name(plan.origin.offset(x, y, z)) != "air";
    for x in 0..plan.width {
        for z in 0..plan.depth {
            assert!(solid(x, 0, z), "floor missing at ({x}, {z})");
            assert!(solid(x, plan.height + 1, z), "roof missing at ({x}, {z})");
            if !plan.is_perimeter(x, z) {
                continue;
            }
            for y in 1..=plan.height {
                if plan.is_doorway(x, y, z) {
                    assert!(!solid(x, y, z), "doorway blocked at ({x}, {y}, {z})");
                } else {
                    assert!(solid(x, y, z), "wall missing at ({x}, {y}, {z})");
                }
            }
        }
    }
    assert_eq!(
        world.block_name(plan.origin.offset(0, 1, 0)),
        "oak_log",
        "corners use the corner material"
    );
    assert!(world.held_controls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn build_visits_every_cell_despite_injected_failures() {
    let world = builder_world()
        .faults(FaultPlan {
            dig: 0.3,
            place: 0.4,
            goto: 0.3,
            seed: 42,
        })
        .build();
    let agent = agent_for(&world);

    let report = agent.build_house().await.unwrap();

    assert_eq!(report.phase, BuildPhase::Done);
    assert_eq!(report.clear.visited, 25 * 6);
    assert_eq!(report.floor.visited, 25);
    assert_eq!(report.walls.visited, 16 * 4 - 2);
    assert_eq!(report.roof.visited, 25);
    assert_eq!(report.cleanup.visited, 9 * 4);
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn build_clears_vegetation_from_the_footprint() {
    let world = builder_world().build();
    let agent = agent_for(&world);
    let plan = agent.select_site();
    let grass = plan.origin.offset(1, 0, 1);
    world.set_block(grass, "tall_grass");

    let report = agent.build_house().await.unwrap();

    assert_eq!(report.plan, plan);
    assert_eq!(world.block_name(grass), "oak_planks");
}

#[tokio::test(start_paused = true)]
async fn build_without_materials_still_finishes() {
    let world = plain().build();
    let agent = agent_for(&world);

    let report = agent.build_house().await.unwrap();

    assert_eq!(report.phase, BuildPhase::Done);
    assert_eq!(report.floor.changed, 0);
    assert_eq!(report.walls.changed, 0);
}

#[tokio::test(start_paused = true)]
async fn build_goes_on_when_the_safe_spot_is_unreachable() {
    let world = builder_world()
        .faults(FaultPlan {
            goto: 1.0,
            ..FaultPlan::default()
        })
        .build();
    let agent = agent_for(&world);

    let report = agent.build_house().await.unwrap();

    assert!(!report.reached_safe_spot);
    assert_eq!(report.phase, BuildPhase::Done);
    assert_eq!(report.floor.visited, 25);
    assert!(said(&world, "House complete! 🏠"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn building_fails_when_the_connection_drops() {
    let world = builder_world().build();
    let agent = agent_for(&world);
    world.disconnect("kicked");

    let report = agent.build_house().await.unwrap();

    assert_eq!(report.phase, BuildPhase::Failed);
    assert!(said(&world, "Building failed."));
    assert!(!said(&world, "House complete! 🏠"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

/// A gateway that stops the agent the first time cleanup inspects `cell`.
struct Tripwire {
    inner: SimWorld,
    cell: BlockPos,
    agent: OnceLock<Agent<Tripwire>>,
}

impl WorldGateway for Tripwire {
    fn username(&self) -> String {
        self.inner.username()
    }

    fn self_id(&self) -> EntityId {
        self.inner.self_id()
    }

    fn position(&self) -> Vec3 {
        self.inner.position()
    }

    fn health(&self) -> f32 {
        self.inner.health()
    }

    fn food(&self) -> f32 {
        self.inner.food()
    }

    fn inventory(&self) -> Vec<ItemStack> {
        self.inner.inventory()
    }

    fn block_at(&self, pos: BlockPos) -> Option<BlockSnapshot> {
        let cleaning = self.inner.chat_log().iter().any(|l| l == "Cleaning up...");
        if pos == self.cell
            && cleaning
            && let Some(agent) = self.agent.get()
        {
            agent.stop_all();
        }
        self.inner.block_at(pos)
    }

    fn find_nearest_block(&self, name: &str, max_distance: f64) -> Option<BlockSnapshot> {
        self.inner.find_nearest_block(name, max_distance)
    }

    fn is_known_block(&self, name: &str) -> bool {
        self.inner.is_known_block(name)
    }

    fn entities(&self) -> Vec<EntitySnapshot> {
        self.inner.entities()
    }

    fn player(&self, username: &str) -> Option<EntitySnapshot> {
        self.inner.player(username)
    }

    fn set_movements(&self, profile: MovementProfile) {
        self.inner.set_movements(profile);
    }

    fn set_goal(&self, goal: Option<Goal>) {
        self.inner.set_goal(goal);
    }

    async fn goto(&self, goal: Goal) -> Result<(), GatewayError> {
        self.inner.goto(goal).await
    }

    fn set_control(&self, control: Control, held: bool) {
        self.inner.set_control(control, held);
    }

    fn clear_controls(&self) {
        self.inner.clear_controls();
    }

    async fn dig(&self, pos: BlockPos, force_look: bool) -> Result<(), GatewayError> {
        self.inner.dig(pos, force_look).await
    }

    async fn place(&self, reference: BlockPos, face: Face) -> Result<(), GatewayError> {
        self.inner.place(reference, face).await
    }

    async fn equip(&self, item: &str, slot: EquipSlot) -> Result<(), GatewayError> {
        self.inner.equip(item, slot).await
    }

    async fn look_at(&self, point: Vec3) -> Result<(), GatewayError> {
        self.inner.look_at(point).await
    }

    async fn attack(&self, entity: EntityId) -> Result<(), GatewayError> {
        self.inner.attack(entity).await
    }

    async fn toss(&self, item: &str, count: u32) -> Result<(), GatewayError> {
        self.inner.toss(item, count).await
    }

    async fn deposit(&self, container: BlockPos, item: &str, count: u32) -> Result<(), GatewayError> {
        self.inner.deposit(container, item, count).await
    }

    fn chat(&self, message: &str) {
        self.inner.chat(message);
    }

    fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.inner.subscribe()
    }
}

#[tokio::test(start_paused = true)]
async fn stop_at_the_end_of_cleanup_skips_the_completion_line() {
    let world = builder_world().build();
    let plan = agent_for(&world).select_site();
    let last = plan.interior_cells().last().copied().unwrap();
    let tripwire = Arc::new(Tripwire {
        inner: world.clone(),
        cell: last,
        agent: OnceLock::new(),
    });
    let agent = Agent::new(Arc::clone(&tripwire), BehaviorConfig::default());
    assert!(tripwire.agent.set(agent.clone()).is_ok());

    assert!(agent.build_house().await.is_none());
    assert!(said(&world, "Cleaning up..."));
    assert!(!said(&world, "House complete! 🏠"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

// ---------------------------------------------------------------------------
// Combat and reactive handlers
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn combat_with_no_targets_ends_within_one_tick() {
    let world = plain()
        .mob("cow", EntityCategory::Animal, Vec3::new(3.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);

    assert!(agent.start_combat(None));
    assert_eq!(agent.task_kind(), TaskKind::Attacking);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(!agent.state().in_combat());
    assert!(said(&world, "All clear!"));
    assert!(world.current_goal().is_none());
}

#[tokio::test(start_paused = true)]
async fn kill_a_zombie_with_a_sword() {
    let world = plain()
        .item("iron_sword", 1)
        .mob("zombie", EntityCategory::Hostile, Vec3::new(12.5, 64.0, 0.5))
        .build();
    let zombie = world.entities().first().map(|e| e.id).unwrap();
    let agent = agent_for(&world);

    assert!(agent.start_combat(Some("Zombie".to_owned())));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(world.entity(zombie).is_none());
    assert_eq!(world.held_item().as_deref(), Some("iron_sword"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(said(&world, "All clear!"));
}

#[tokio::test(start_paused = true)]
async fn second_combat_request_is_refused() {
    let world = plain()
        .mob("zombie", EntityCategory::Hostile, Vec3::new(20.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);

    assert!(agent.start_combat(None));
    assert!(!agent.start_combat(Some("zombie".to_owned())));
    agent.stop_all();
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn self_defense_targets_the_attacker() {
    let world = plain()
        .mob("skeleton", EntityCategory::Hostile, Vec3::new(6.5, 64.0, 0.5))
        .mob("zombie", EntityCategory::Hostile, Vec3::new(-20.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);

    agent.handle_event(WorldEvent::SelfHurt).await;

    assert_eq!(agent.task_kind(), TaskKind::Attacking);
    let filter = agent
        .state()
        .combat()
        .and_then(|c| c.target_filter.clone());
    assert_eq!(filter.as_deref(), Some("skeleton"));
    agent.stop_all();
}

#[tokio::test(start_paused = true)]
async fn self_defense_ignores_passive_mobs() {
    let world = plain()
        .mob("cow", EntityCategory::Animal, Vec3::new(2.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);

    assert!(!agent.on_self_hurt());
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn hurt_player_gets_protected() {
    let world = plain()
        .player("Steve", Vec3::new(8.5, 64.0, 0.5))
        .mob("spider", EntityCategory::Hostile, Vec3::new(12.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);
    let steve = world.player("Steve").unwrap();

    assert!(agent.on_entity_hurt(&steve));

    assert_eq!(agent.task_kind(), TaskKind::Attacking);
    let line = world.chat_log().last().cloned().unwrap();
    assert!(
        line.contains("Steve") || line == "Don't worry, I'll handle this!" || line == "Nobody messes with you!"
    );
    agent.stop_all();
}

#[tokio::test(start_paused = true)]
async fn combat_preempts_a_running_build() {
    let world = builder_world()
        .mob("zombie", EntityCategory::Hostile, Vec3::new(4.5, 64.0, 4.5))
        .build();
    let agent = agent_for(&world);

    let building = tokio::spawn({
        let agent = agent.clone();
        async move { agent.build_house().await }
    });
    wait_for_task(&agent, TaskKind::Building).await;

    assert!(agent.on_self_hurt());
    assert_eq!(agent.task_kind(), TaskKind::Attacking);
    assert!(building.await.unwrap().is_none());
    agent.stop_all();
}

#[tokio::test(start_paused = true)]
async fn distress_call_is_throttled() {
    let world = plain()
        .mob("zombie", EntityCategory::Hostile, Vec3::new(30.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);
    assert!(agent.start_combat(Some("zombie".to_owned())));

    agent
        .handle_event(WorldEvent::HealthChanged { health: 3.0, food: 20.0 })
        .await;
    agent
        .handle_event(WorldEvent::HealthChanged { health: 2.0, food: 20.0 })
        .await;

    let calls = world
        .chat_log()
        .iter()
        .filter(|l| *l == "I'm dying! Need help!")
        .count();
    assert_eq!(calls, 1);
    agent.stop_all();
}

// ---------------------------------------------------------------------------
// Task slot
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn busy_agent_ignores_other_tasks() {
    let world = builder_world()
        .player("Steve", Vec3::new(4.5, 64.0, 4.5))
        .block(BlockPos::new(-8, 64, -8), "stone")
        .build();
    let agent = agent_for(&world);

    let building = tokio::spawn({
        let agent = agent.clone();
        async move { agent.build_house().await }
    });
    wait_for_task(&agent, TaskKind::Building).await;

    assert_eq!(agent.mine("stone", 1).await, None);
    assert!(!agent.follow("Steve"));
    assert_eq!(agent.task_kind(), TaskKind::Building);

    agent.stop_all();
    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(building.await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_all_is_idempotent() {
    let world = plain().build();
    let agent = agent_for(&world);

    agent.stop_all();
    agent.stop_all();

    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(world.current_goal().is_none());
    assert!(world.held_controls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transitions_publish_stats() {
    let world = plain().player("Steve", Vec3::new(4.5, 64.0, 0.5)).build();
    let agent = agent_for(&world);
    let mut events = agent.subscribe();

    assert!(agent.follow("Steve"));

    let mut saw_following = false;
    while let Ok(event) = events.try_recv() {
        if let AgentEvent::Stats(snapshot) = event {
            saw_following |= snapshot.current_task == TaskKind::Following;
        }
    }
    assert!(saw_following);
}

// ---------------------------------------------------------------------------
// Follow, transfer, report
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn follow_and_stop_follow() {
    let world = plain().player("Steve", Vec3::new(10.5, 64.0, 0.5)).build();
    let agent = agent_for(&world);
    let steve = world.player("Steve").unwrap();

    assert!(agent.follow("Steve"));
    assert_eq!(agent.task_kind(), TaskKind::Following);
    assert_eq!(
        world.current_goal(),
        Some(Goal::Follow {
            entity: steve.id,
            range: 2.0
        })
    );
    assert_eq!(world.movements(), MovementProfile::follow());

    agent.stop_follow();
    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(world.current_goal().is_none());
}

#[tokio::test(start_paused = true)]
async fn following_an_invisible_player_changes_nothing() {
    let world = plain().build();
    let agent = agent_for(&world);

    assert!(!agent.follow("Ghost"));
    assert!(said(&world, "Can't see you, Ghost!"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn give_respects_quantity() {
    let world = plain()
        .player("Steve", Vec3::new(2.5, 64.0, 0.5))
        .item("oak_log", 10)
        .item("bread", 3)
        .build();
    let agent = agent_for(&world);

    assert_eq!(agent.give("Steve", "log", Some(4)).await, Some(4));
    assert!(said(&world, "Gave you 4x log! ✓"));
    let dropped = world.dropped();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped.first().map(|s| s.count), Some(4));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn give_without_quantity_hands_over_everything() {
    let world = plain()
        .player("Steve", Vec3::new(2.5, 64.0, 0.5))
        .item("oak_log", 70)
        .build();
    let agent = agent_for(&world);

    assert_eq!(agent.give("Steve", "oak_log", None).await, Some(70));
    assert!(world.inventory().iter().all(|s| s.name != "oak_log"));
}

#[tokio::test(start_paused = true)]
async fn give_needs_a_visible_recipient_and_stock() {
    let world = plain()
        .player("Steve", Vec3::new(2.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);

    assert_eq!(agent.give("Alex", "bread", None).await, None);
    assert!(said(&world, "Come closer so I can give you items!"));
    assert_eq!(agent.give("Steve", "diamond", Some(1)).await, None);
    assert!(said(&world, "I don't have any diamond!"));
}

#[tokio::test(start_paused = true)]
async fn give_refuses_a_distant_recipient() {
    let world = plain()
        .player("Steve", Vec3::new(500.5, 64.0, 0.5))
        .item("oak_log", 10)
        .build();
    let agent = agent_for(&world);

    assert_eq!(agent.give("Steve", "oak_log", None).await, None);
    assert!(said(&world, "Come closer so I can give you items!"));
    assert!(world.dropped().is_empty());
    assert_eq!(world.inventory().first().map(|s| s.count), Some(10));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn stash_keeps_weapons() {
    let chest = BlockPos::new(3, 64, 2);
    let world = plain()
        .block(chest, "chest")
        .item("cobblestone", 20)
        .item("bread", 5)
        .item("iron_sword", 1)
        .build();
    let agent = agent_for(&world);

    assert_eq!(agent.stash().await, Some(25));
    assert!(said(&world, "Stashed 25 items! ✓"));
    let inventory = world.inventory();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.first().map(|s| s.name.as_str()), Some("iron_sword"));
    assert_eq!(world.container_contents(chest).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn stash_without_a_chest() {
    let world = plain().item("cobblestone", 20).build();
    let agent = agent_for(&world);

    assert_eq!(agent.stash().await, None);
    assert!(said(&world, "No chest nearby!"));
}

#[tokio::test(start_paused = true)]
async fn report_leaves_task_untouched() {
    let world = plain().item("bread", 2).build();
    let agent = agent_for(&world);

    let lines = agent.report_status();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines.get(1).map(String::as_str), Some("🎒 Bread x2"));
    assert_eq!(lines.get(2).map(String::as_str), Some("📍 X:1 Y:64 Z:1"));
    assert_eq!(agent.task_kind(), TaskKind::Idle);
}

// ---------------------------------------------------------------------------
// Death and respawn
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn respawn_returns_to_last_party() {
    let world = plain().player("Steve", Vec3::new(15.5, 64.0, 5.5)).build();
    let agent = agent_for(&world);
    agent
        .handle_event(WorldEvent::Chat {
            username: "Steve".to_owned(),
            message: "hello".to_owned(),
        })
        .await;

    world.hurt_self(30.0);
    agent.handle_event(WorldEvent::Death).await;
    assert!(said(&world, "I died! Respawning..."));
    assert!(agent.state().respawn_intent().is_some());

    world.respawn();
    agent.handle_event(WorldEvent::Respawn).await;

    assert!(said(&world, "On my way back, Steve!"));
    assert!(said(&world, "I'm back! 👋"));
    assert!(agent.state().respawn_intent().is_none());
    let steve = world.player("Steve").unwrap();
    assert!(world.position().distance_to(steve.position) <= 3.0);
}

#[tokio::test(start_paused = true)]
async fn death_stops_combat() {
    let world = plain()
        .mob("zombie", EntityCategory::Hostile, Vec3::new(20.5, 64.0, 0.5))
        .build();
    let agent = agent_for(&world);
    assert!(agent.start_combat(None));

    world.hurt_self(30.0);
    agent.handle_event(WorldEvent::Death).await;

    assert_eq!(agent.task_kind(), TaskKind::Idle);
    assert!(!agent.state().in_combat());
}

#[tokio::test(start_paused = true)]
async fn first_spawn_rejoins_the_last_speaker() {
    let world = plain().player("Steve", Vec3::new(15.5, 64.0, 5.5)).build();
    let agent = agent_for(&world);
    agent.note_interaction("Steve");

    agent.handle_event(WorldEvent::Spawn).await;

    assert!(said(&world, "Coming to you, Steve!"));
    assert!(said(&world, "Found you! 👋"));
    let steve = world.player("Steve").unwrap();
    assert!(world.position().distance_to(steve.position) <= 3.0);
}

#[tokio::test(start_paused = true)]
async fn respawn_without_intent_goes_to_the_last_speaker() {
    let world = plain().player("Steve", Vec3::new(-12.5, 64.0, 4.5)).build();
    let agent = agent_for(&world);
    agent.note_interaction("Steve");
    assert!(agent.state().respawn_intent().is_none());

    agent.handle_event(WorldEvent::Respawn).await;

    assert!(!said(&world, "On my way back, Steve!"));
    assert!(said(&world, "Coming to you, Steve!"));
    assert!(said(&world, "Found you! 👋"));
}

#[tokio::test(start_paused = true)]
async fn respawn_reports_an_unreachable_party() {
    let world = plain().player("Steve", Vec3::new(15.5, 64.0, 5.5)).build();
    let agent = agent_for(&world);
    agent.note_interaction("Steve");
    world.hurt_self(30.0);
    agent.handle_event(WorldEvent::Death).await;
    assert!(agent.state().respawn_intent().is_some());

    world.respawn();
    world.set_faults(FaultPlan {
        goto: 1.0,
        ..FaultPlan::default()
    });
    agent.handle_event(WorldEvent::Respawn).await;

    assert!(said(&world, "On my way back, Steve!"));
    assert!(said(&world, "I respawned but couldn't reach you!"));
    assert!(!said(&world, "I'm back! 👋"));
    assert!(agent.state().respawn_intent().is_none());
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn decision_narration_is_said_before_acting() {
    let world = plain().player("Steve", Vec3::new(5.5, 64.0, 0.5)).build();
    let agent = agent_for(&world);

    let decision = Decision::Action {
        request: ActionRequest::FollowPlayer { username: None },
        narration: Some("Right behind you!".to_owned()),
    };
    agent
        .handle_decision(decision, "Steve", CommandSource::World)
        .await;

    assert!(said(&world, "Right behind you!"));
    assert_eq!(agent.task_kind(), TaskKind::Following);
}

#[tokio::test(start_paused = true)]
async fn web_follow_targets_last_chatting_player() {
    let world = plain().player("Steve", Vec3::new(5.5, 64.0, 0.5)).build();
    let agent = agent_for(&world);
    agent.note_interaction("Steve");

    agent
        .dispatch(
            ActionRequest::FollowPlayer { username: None },
            blockhand_agent::WEB_SPEAKER,
            CommandSource::Web,
        )
        .await;

    assert_eq!(agent.task_kind(), TaskKind::Following);
}

#[tokio::test(start_paused = true)]
async fn dispatch_mine_defaults_to_one() {
    let world = plain()
        .block(BlockPos::new(3, 64, 0), "stone")
        .block(BlockPos::new(-3, 64, 0), "stone")
        .build();
    let agent = agent_for(&world);

    agent
        .dispatch(
            ActionRequest::MineBlock {
                block_name: "stone".to_owned(),
                quantity: None,
            },
            "Steve",
            CommandSource::World,
        )
        .await;

    assert!(said(&world, "Got 1x stone! ✓"));
    assert!(world.find_nearest_block("stone", 32.0).is_some());
}
