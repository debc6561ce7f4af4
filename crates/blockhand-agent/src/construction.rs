//! Construction Engine: a small walled house with a doorway and a roof.
//!
//! A run walks `SelectSite → Clear → Floor → Walls → Roof → Cleanup` and
//! ends in `Done` or `Failed`. Every planned cell is visited exactly once
//! per phase. Per-cell failures are skipped so one obstructed block never
//! stalls the run; only a lost connection aborts it.
//!
//! Cell placement tries, in order, stopping at the first success:
//!
//! 1. Clear vegetation from the cell, then skip it if still occupied.
//! 2. Skip it if the material is not in the inventory.
//! 3. Equip the material.
//! 4. Place against any solid neighbour (below, ±X, ±Z) without moving.
//! 5. If farther than reach, walk closer and try the neighbours again.
//! 6. Jump and place onto the block directly below (scaffolding).

use blockhand_types::{BlockPos, BuildPhase, Control, EquipSlot, Face, TaskKind};
use blockhand_world::{Goal, MovementProfile, WorldGateway, blocks};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::{Agent, tolerate};
use crate::config::BuildConfig;
use crate::error::AgentError;
use crate::state::TaskTicket;

/// Footprint and doorway of one house, fixed at task start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Floor-level corner with the lowest X and Z.
    pub origin: BlockPos,
    /// Extent along X.
    pub width: i32,
    /// Extent along Z.
    pub depth: i32,
    /// Wall height above the floor.
    pub height: i32,
    /// X offset of the doorway in the `z == 0` wall.
    pub door_column: i32,
    /// Number of wall levels the doorway spans.
    pub door_height: i32,
}

impl BuildPlan {
    /// A plan at `origin` sized by `config`.
    pub const fn new(origin: BlockPos, config: &BuildConfig) -> Self {
        Self {
            origin,
            width: config.width,
            depth: config.depth,
            height: config.height,
            door_column: config.door_column,
            door_height: config.door_height,
        }
    }

    const fn at(&self, x: i32, y: i32, z: i32) -> BlockPos {
        self.origin.offset(x, y, z)
    }

    const fn roof_level(&self) -> i32 {
        self.height.saturating_add(1)
    }

    fn layer(&self, y: i32) -> Vec<BlockPos> {
        (0..self.width)
            .flat_map(|x| (0..self.depth).map(move |z| (x, z)))
            .map(|(x, z)| self.at(x, y, z))
            .collect()
    }

    /// Whether `(x, z)` lies on the outer ring of the footprint.
    pub const fn is_perimeter(&self, x: i32, z: i32) -> bool {
        x == 0 || z == 0 || x == self.width.saturating_sub(1) || z == self.depth.saturating_sub(1)
    }

    /// Whether `(x, z)` is one of the four corner columns.
    pub const fn is_corner(&self, x: i32, z: i32) -> bool {
        (x == 0 || x == self.width.saturating_sub(1)) && (z == 0 || z == self.depth.saturating_sub(1))
    }

    /// Whether the wall cell at `(x, y, z)` is left open for the doorway.
    pub fn is_doorway(&self, x: i32, y: i32, z: i32) -> bool {
        z == 0 && x == self.door_column && (1..=self.door_height).contains(&y)
    }

    /// Every cell cleared before building: the footprint from floor level
    /// through the roof level.
    pub fn clear_cells(&self) -> Vec<BlockPos> {
        let top = self.roof_level();
        (0..self.width)
            .flat_map(|x| (0..self.depth).map(move |z| (x, z)))
            .flat_map(|(x, z)| (0..=top).map(move |y| (x, y, z)))
            .map(|(x, y, z)| self.at(x, y, z))
            .collect()
    }

    /// The floor layer.
    pub fn floor_cells(&self) -> Vec<BlockPos> {
        self.layer(0)
    }

    /// Perimeter cells from level 1 to wall height, minus the doorway, each
    /// flagged when it sits on a corner column.
    pub fn wall_cells(&self) -> Vec<(BlockPos, bool)> {
        let mut cells = Vec::new();
        for y in 1..=self.height {
            for x in 0..self.width {
                for z in 0..self.depth {
                    if !self.is_perimeter(x, z) || self.is_doorway(x, y, z) {
                        continue;
                    }
                    cells.push((self.at(x, y, z), self.is_corner(x, z)));
                }
            }
        }
        cells
    }

    /// The roof layer, one above the top of the walls.
    pub fn roof_cells(&self) -> Vec<BlockPos> {
        self.layer(self.roof_level())
    }

    /// Interior cells (off the perimeter) from level 1 to wall height.
    pub fn interior_cells(&self) -> Vec<BlockPos> {
        let mut cells = Vec::new();
        for x in 1..self.width.saturating_sub(1) {
            for z in 1..self.depth.saturating_sub(1) {
                for y in 1..=self.height {
                    cells.push(self.at(x, y, z));
                }
            }
        }
        cells
    }

    /// A spot past the far wall, level with the floor, centred on the depth.
    pub const fn safe_spot(&self, margin: i32) -> BlockPos {
        self.at(
            self.width.saturating_add(margin),
            0,
            self.depth.div_euclid(2),
        )
    }
}

/// How a single placement went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    /// The block went in.
    Placed,
    /// Something non-air was already there.
    Occupied,
    /// The material was not in the inventory.
    NoMaterial,
    /// Every strategy failed.
    Unplaced,
}

/// Cells visited and cells changed in one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTally {
    /// Cells the phase looked at.
    pub visited: usize,
    /// Cells it dug or placed.
    pub changed: usize,
}

impl PhaseTally {
    const fn record(&mut self, changed: bool) {
        self.visited = self.visited.saturating_add(1);
        if changed {
            self.changed = self.changed.saturating_add(1);
        }
    }
}

/// Outcome of a construction run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    /// The plan that was built.
    pub plan: BuildPlan,
    /// `Done`, `Failed`, or the phase a failure interrupted.
    pub phase: BuildPhase,
    /// Whether the agent reached the safe spot before clearing.
    pub reached_safe_spot: bool,
    /// Clearing: cells visited, blocks dug.
    pub clear: PhaseTally,
    /// Floor: cells visited, blocks placed.
    pub floor: PhaseTally,
    /// Walls: cells visited, blocks placed.
    pub walls: PhaseTally,
    /// Roof: cells visited, blocks placed.
    pub roof: PhaseTally,
    /// Cleanup: cells visited, blocks removed.
    pub cleanup: PhaseTally,
}

impl BuildReport {
    const fn new(plan: BuildPlan) -> Self {
        Self {
            plan,
            phase: BuildPhase::SelectSite,
            reached_safe_spot: false,
            clear: PhaseTally { visited: 0, changed: 0 },
            floor: PhaseTally { visited: 0, changed: 0 },
            walls: PhaseTally { visited: 0, changed: 0 },
            roof: PhaseTally { visited: 0, changed: 0 },
            cleanup: PhaseTally { visited: 0, changed: 0 },
        }
    }
}

impl<W: WorldGateway> Agent<W> {
    /// Build a house next to the agent.
    ///
    /// Returns `None` when the agent was busy or the run was preempted;
    /// otherwise a report ending in `Done` or `Failed`.
    pub async fn build_house(&self) -> Option<BuildReport> {
        let Some(ticket) = self.begin(TaskKind::Building) else {
            debug!(current = %self.task_kind(), "build request ignored, agent busy");
            return None;
        };
        let plan = self.select_site();
        info!(origin = %plan.origin, width = plan.width, depth = plan.depth, "building house");

        let mut report = BuildReport::new(plan);
        match self.construct(&ticket, &mut report).await {
            Ok(()) => {
                report.phase = BuildPhase::Done;
                self.say("House complete! 🏠");
                self.milestone(TaskKind::Building, "house complete");
                self.end(&ticket);
                Some(report)
            }
            Err(AgentError::Preempted) => {
                debug!(phase = ?report.phase, "build preempted");
                None
            }
            Err(e) => {
                warn!(phase = ?report.phase, error = %e, "build failed");
                report.phase = BuildPhase::Failed;
                self.say("Building failed.");
                self.end(&ticket);
                Some(report)
            }
        }
    }

    /// Pick the floor-level origin: the first open cell on solid ground in
    /// a square around a point offset from the agent, else that point.
    pub fn select_site(&self) -> BuildPlan {
        let config = &self.config.build;
        let base = self
            .world
            .position()
            .offset(f64::from(config.site_offset), 0.0, 0.0)
            .floored();
        let half = config.probe_half_width;
        let origin = (half.saturating_neg()..=half)
            .flat_map(|dx| (half.saturating_neg()..=half).map(move |dz| base.offset(dx, 0, dz)))
            .find(|cell| {
                let ground = self.world.block_at(cell.below());
                let open = self.world.block_at(*cell);
                ground.is_some_and(|b| b.is_solid()) && open.is_some_and(|b| b.is_air())
            })
            .unwrap_or(base);
        BuildPlan::new(origin, config)
    }

    async fn construct(
        &self,
        ticket: &TaskTicket,
        report: &mut BuildReport,
    ) -> Result<(), AgentError> {
        let config = &self.config.build;
        let plan = report.plan;

        self.enter_phase(report, BuildPhase::SelectSite, "Moving to safe position...");
        let safe = plan.safe_spot(config.safe_margin);
        self.world.set_movements(MovementProfile::travel());
        let moved = self.world.goto(Goal::near_block(safe, 1.0)).await;
        self.checkpoint(ticket)?;
        report.reached_safe_spot = tolerate(moved, "move to safe spot")?;
        if !report.reached_safe_spot {
            debug!(spot = %safe, "safe spot unreachable, building from here");
        }

        self.enter_phase(report, BuildPhase::Clear, "Clearing area...");
        for pos in plan.clear_cells() {
            let dug = self.clear_cell(ticket, pos, config.dig_reach).await?;
            report.clear.record(dug);
        }

        self.enter_phase(report, BuildPhase::Floor, "Building house...");
        for pos in plan.floor_cells() {
            let outcome = self.place_cell(ticket, pos, &config.floor_material).await?;
            report.floor.record(outcome == CellOutcome::Placed);
        }

        self.enter_phase(report, BuildPhase::Walls, "Raising walls...");
        for (pos, corner) in plan.wall_cells() {
            let material = if corner {
                &config.corner_material
            } else {
                &config.wall_material
            };
            let outcome = self.place_cell(ticket, pos, material).await?;
            report.walls.record(outcome == CellOutcome::Placed);
        }

        self.enter_phase(report, BuildPhase::Roof, "Adding the roof...");
        for pos in plan.roof_cells() {
            let outcome = self.place_cell(ticket, pos, &config.roof_material).await?;
            report.roof.record(outcome == CellOutcome::Placed);
        }

        self.enter_phase(report, BuildPhase::Cleanup, "Cleaning up...");
        for pos in plan.interior_cells() {
            let dug = self.clear_cell(ticket, pos, config.dig_reach).await?;
            report.cleanup.record(dug);
        }
        self.checkpoint(ticket)
    }

    fn enter_phase(&self, report: &mut BuildReport, phase: BuildPhase, line: &str) {
        report.phase = phase;
        debug!(?phase, "build phase");
        self.say(line);
        self.milestone(TaskKind::Building, line);
    }

    /// Dig out whatever diggable block sits at `pos`, walking closer first
    /// when it is beyond `reach`. Returns whether a block was removed.
    async fn clear_cell(
        &self,
        ticket: &TaskTicket,
        pos: BlockPos,
        reach: f64,
    ) -> Result<bool, AgentError> {
        let Some(block) = self.world.block_at(pos) else {
            return Ok(false);
        };
        if block.is_air() || !block.diggable {
            return Ok(false);
        }
        if self.world.position().distance_to_block(pos) > reach {
            let moved = self
                .world
                .goto(Goal::near_block(pos, self.config.build.approach_range))
                .await;
            self.checkpoint(ticket)?;
            tolerate(moved, "approach dig")?;
        }
        let dug = self.world.dig(pos, true).await;
        self.checkpoint(ticket)?;
        tolerate(dug, "dig")
    }

    /// Put `material` at `pos`, trying each strategy in turn.
    pub(crate) async fn place_cell(
        &self,
        ticket: &TaskTicket,
        pos: BlockPos,
        material: &str,
    ) -> Result<CellOutcome, AgentError> {
        let config = &self.config.build;

        let overgrown = self
            .world
            .block_at(pos)
            .is_some_and(|b| b.diggable && blocks::is_vegetation(&b.name));
        if overgrown {
            let dug = self.world.dig(pos, true).await;
            self.checkpoint(ticket)?;
            tolerate(dug, "clear vegetation")?;
        }
        if !self.world.block_at(pos).is_some_and(|b| b.is_air()) {
            return Ok(CellOutcome::Occupied);
        }
        if !self.world.inventory().iter().any(|s| s.name == material) {
            debug!(material, %pos, "out of material, skipping cell");
            return Ok(CellOutcome::NoMaterial);
        }

        let equipped = self.world.equip(material, EquipSlot::Hand).await;
        self.checkpoint(ticket)?;
        if !tolerate(equipped, "equip")? {
            return Ok(CellOutcome::Unplaced);
        }

        if self.place_against_neighbours(ticket, pos).await? {
            return Ok(CellOutcome::Placed);
        }

        if self.world.position().distance_to_block(pos) > config.reach {
            let moved = self
                .world
                .goto(Goal::near_block(pos, config.approach_range))
                .await;
            self.checkpoint(ticket)?;
            tolerate(moved, "approach placement")?;
        }
        if self.place_against_neighbours(ticket, pos).await? {
            return Ok(CellOutcome::Placed);
        }

        let below = pos.below();
        if !self.world.block_at(below).is_some_and(|b| b.is_solid()) {
            return Ok(CellOutcome::Unplaced);
        }
        self.world.set_control(Control::Jump, true);
        tokio::time::sleep(config.jump_settle()).await;
        let placed = self.world.place(below, Face::Up).await;
        self.world.set_control(Control::Jump, false);
        self.checkpoint(ticket)?;
        if tolerate(placed, "scaffold placement")? {
            Ok(CellOutcome::Placed)
        } else {
            Ok(CellOutcome::Unplaced)
        }
    }

    async fn place_against_neighbours(
        &self,
        ticket: &TaskTicket,
        pos: BlockPos,
    ) -> Result<bool, AgentError> {
        for face in Face::PLACEMENT_ORDER {
            let reference = pos.adjacent(face);
            if !self.world.block_at(reference).is_some_and(|b| b.is_solid()) {
                continue;
            }
            let placed = self.world.place(reference, face.opposite()).await;
            self.checkpoint(ticket)?;
            if tolerate(placed, "placement")? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
