//! Combat Engine: periodic target acquisition, pursuit, and strikes.
//!
//! A session runs one spawned loop driven by a fixed-period interval. Ticks
//! run sequentially inside that loop, so two ticks never overlap; a slow
//! tick simply delays the next one. The loop ends when a tick finds no
//! eligible target, or when the session's cancellation token fires (global
//! stop, death). Targets are re-resolved by search on every tick.

use blockhand_types::{CombatSessionId, EntitySnapshot, EquipSlot, Vec3};
use blockhand_world::{Goal, MovementProfile, WorldGateway, blocks};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::CombatConfig;

/// What a tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking.
    Continue,
    /// The session is over.
    Finished,
}

/// Whether `entity` is an eligible target.
///
/// Only mob- or hostile-tagged entities within `radius` of `origin`
/// qualify. With a filter, the name or display name must contain it
/// (case-insensitive); without one, it must contain a hostile species name.
pub fn is_eligible(
    entity: &EntitySnapshot,
    origin: Vec3,
    radius: f64,
    filter: Option<&str>,
    config: &CombatConfig,
) -> bool {
    if !entity.category.is_creature() || entity.position.distance_to(origin) > radius {
        return false;
    }
    match filter {
        Some(name) => entity.name_contains(&name.to_lowercase()),
        None => is_hostile_species(entity, config),
    }
}

/// Whether `entity` belongs to one of the configured hostile species.
pub fn is_hostile_species(entity: &EntitySnapshot, config: &CombatConfig) -> bool {
    config
        .hostile_species
        .iter()
        .any(|species| entity.name_contains(species))
}

/// The eligible entity nearest to `from`.
pub fn nearest<'a>(
    entities: &'a [EntitySnapshot],
    from: Vec3,
    mut eligible: impl FnMut(&EntitySnapshot) -> bool,
) -> Option<&'a EntitySnapshot> {
    entities
        .iter()
        .filter(|e| eligible(e))
        .min_by(|a, b| {
            a.position
                .distance_to(from)
                .total_cmp(&b.position.distance_to(from))
        })
}

impl<W: WorldGateway> Agent<W> {
    /// Start a combat session against `filter`, or against any hostile
    /// species when `None`.
    ///
    /// Refused (returns `false`) while a session exists or the slot is
    /// already `Attacking`. Any other task is preempted.
    pub fn start_combat(&self, filter: Option<String>) -> bool {
        let Some((ticket, session)) = self.state().try_start_combat(filter) else {
            debug!("already in combat");
            return false;
        };
        info!(
            task = ?ticket.kind,
            target = session.target_filter.as_deref().unwrap_or("hostiles"),
            "starting combat"
        );
        self.publish_stats();

        let agent = self.clone();
        tokio::spawn(async move {
            agent
                .run_combat(session.id, session.target_filter, session.cancel)
                .await;
        });
        true
    }

    async fn run_combat(
        self,
        session: CombatSessionId,
        filter: Option<String>,
        cancel: CancellationToken,
    ) {
        let period = self.config.combat.tick();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(%session, "combat session cancelled");
                    break;
                }
                _ = interval.tick() => {}
            }
            if self.combat_tick(session, filter.as_deref(), &cancel).await == TickOutcome::Finished {
                break;
            }
        }
    }

    /// Run one combat tick. Errors from world primitives are logged and the
    /// session carries on.
    pub async fn combat_tick(
        &self,
        session: CombatSessionId,
        filter: Option<&str>,
        cancel: &CancellationToken,
    ) -> TickOutcome {
        let config = &self.config.combat;
        let me = self.world.position();
        let entities = self.world.entities();
        let target = nearest(&entities, me, |e| {
            is_eligible(e, me, config.radius, filter, config)
        })
        .cloned();

        let Some(target) = target else {
            if self.state().end_combat(session) {
                info!(%session, "no more targets");
                self.world.set_goal(None);
                self.say("All clear!");
                self.publish_stats();
            }
            return TickOutcome::Finished;
        };

        self.state().set_current_target(session, Some(target.id));
        let distance = me.distance_to(target.position);

        if distance > config.strike_range {
            self.world.set_movements(MovementProfile::pursuit());
            self.world.set_goal(Some(Goal::Follow {
                entity: target.id,
                range: config.strike_range - 1.0,
            }));
            return TickOutcome::Continue;
        }

        self.world.set_goal(None);
        if let Err(e) = self.strike(&target, cancel).await {
            warn!(target = target.label(), error = %e, "combat tick failed");
        }
        TickOutcome::Continue
    }

    async fn strike(
        &self,
        target: &EntitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<(), blockhand_world::GatewayError> {
        let weapon = self
            .world
            .inventory()
            .into_iter()
            .find(|item| blocks::is_weapon(&item.name, &self.config.combat.weapon_keywords));
        if let Some(weapon) = weapon {
            self.world.equip(&weapon.name, EquipSlot::Hand).await?;
        }
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.world.look_at(target.head_point()).await?;
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.world.attack(target.id).await?;
        debug!(
            target = target.label(),
            distance = self.world.position().distance_to(target.position),
            "attacked"
        );
        Ok(())
    }
}
