//! Reactive Trigger Handlers: world events that may preempt the task slot.
//!
//! Handlers only touch shared state (the task slot, the combat session,
//! the respawn intent) and the shared goal. A task suspended on a world
//! call notices the takeover at its next checkpoint.

use blockhand_types::{AgentStatus, EntityCategory, EntitySnapshot, TaskKind, Vec3};
use blockhand_world::{GatewayError, Goal, MovementProfile, WorldEvent, WorldGateway};
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::combat::{is_hostile_species, nearest};
use crate::state::RespawnIntent;

/// Lines said when the agent strikes back.
const TAUNTS: [&str; 5] = [
    "Hey! Not cool!",
    "Ouch! You're going down!",
    "Nobody hits me!",
    "Bad move!",
    "You picked the wrong bot!",
];

fn reassurance(player: &str) -> String {
    let lines = [
        format!("I got your back, {player}!"),
        "Don't worry, I'll handle this!".to_owned(),
        "Nobody messes with you!".to_owned(),
        format!("On it, {player}!"),
    ];
    lines
        .choose(&mut rand::rng())
        .cloned()
        .unwrap_or_else(|| format!("On it, {player}!"))
}

impl<W: WorldGateway> Agent<W> {
    /// React to one world event.
    ///
    /// Spawn and respawn handling sleeps before travelling, so callers
    /// should run those on their own task. Every other event must be
    /// handled in arrival order: a lethal hit is `SelfHurt` then `Death`.
    pub async fn handle_event(&self, event: WorldEvent) {
        match event {
            WorldEvent::Spawn => self.on_spawn().await,
            WorldEvent::Chat { username, message } => self.on_chat(&username, &message),
            WorldEvent::SelfHurt => {
                self.on_self_hurt();
            }
            WorldEvent::EntityHurt { entity } => {
                self.on_entity_hurt(&entity);
            }
            WorldEvent::HealthChanged { health, .. } => self.on_health(health),
            WorldEvent::Death => self.on_death(),
            WorldEvent::Respawn => self.on_respawn().await,
            WorldEvent::End { reason } => {
                info!(%reason, "disconnected");
                self.stop_all();
                self.announce_status(AgentStatus::Disconnected, "Bot disconnected");
                self.notice("Bot disconnected");
            }
        }
    }

    async fn on_spawn(&self) {
        info!(position = %self.world.position(), "spawned");
        self.announce_status(AgentStatus::Connected, "Bot spawned!");
        self.publish_stats();
        tokio::time::sleep(self.config.respawn.rejoin_delay()).await;
        let known = self.state().last_interacted().is_some();
        if known {
            self.navigate_to_party().await;
        }
    }

    fn on_chat(&self, username: &str, message: &str) {
        if username == self.world.username() {
            return;
        }
        debug!(username, message, "chat");
        self.note_interaction(username);
        self.relay_chat(username, message);
    }

    /// Strike back at the nearest hostile within self-defence range.
    ///
    /// Returns whether combat started.
    pub fn on_self_hurt(&self) -> bool {
        let me = self.world.position();
        info!(health = self.world.health(), "hurt, looking for attacker");
        self.publish_stats();

        let config = &self.config.combat;
        let entities = self.world.entities();
        let attacker = nearest(&entities, me, |e| {
            e.category.is_creature()
                && e.position.distance_to(me) <= config.self_defense_radius
                && is_hostile_species(e, config)
        });
        let Some(attacker) = attacker else {
            debug!("no hostile attacker nearby");
            return false;
        };

        let busy = {
            let state = self.state();
            state.in_combat() || state.kind() == TaskKind::Attacking
        };
        if busy {
            debug!(attacker = attacker.label(), "already fighting");
            return false;
        }
        if let Some(line) = TAUNTS.choose(&mut rand::rng()) {
            self.say(line);
        }
        info!(attacker = attacker.label(), "defending");
        self.start_combat(Some(attacker.label().to_owned()))
    }

    /// Defend a hurt player from the hostile nearest to them.
    ///
    /// Returns whether combat started.
    pub fn on_entity_hurt(&self, victim: &EntitySnapshot) -> bool {
        if victim.category != EntityCategory::Player || victim.id == self.world.self_id() {
            return false;
        }
        let Some(player) = victim.username.as_deref() else {
            return false;
        };
        debug!(player, "player hurt");
        self.publish_stats();

        let busy = {
            let state = self.state();
            state.in_combat() || state.kind() == TaskKind::Attacking
        };
        if busy {
            debug!(player, "already in combat, can't help");
            return false;
        }

        let config = &self.config.combat;
        let me = self.world.position();
        let entities = self.world.entities();
        let attacker = nearest(&entities, me, |e| {
            e.category.is_creature()
                && e.position.distance_to(victim.position) <= config.protect_victim_radius
                && is_hostile_species(e, config)
        });
        let Some(attacker) = attacker.filter(|a| a.position.distance_to(me) < config.protect_self_radius)
        else {
            return false;
        };

        info!(player, attacker = attacker.label(), "protecting player");
        self.say(&reassurance(player));
        self.start_combat(Some(attacker.label().to_owned()))
    }

    fn on_health(&self, health: f32) {
        self.publish_stats();
        let vitals = &self.config.vitals;
        if health <= 0.0 || health >= vitals.low_health {
            return;
        }
        info!(health, "low health");
        if health < vitals.critical_health && self.task_kind() == TaskKind::Attacking {
            let now = tokio::time::Instant::now();
            let due = self.state().try_health_alert(now, vitals.alert_cooldown());
            if due {
                warn!(health, "critical health during combat");
                self.say("I'm dying! Need help!");
            }
        }
    }

    fn on_death(&self) {
        info!("died");
        self.say("I died! Respawning...");
        self.announce_status(AgentStatus::Dead, "Bot died!");
        self.notice("Bot died!");
        self.stop_all();

        let party = self.state().last_interacted().map(str::to_owned);
        let Some(username) = party else {
            return;
        };
        if let Some(player) = self.world.player(&username) {
            info!(%username, position = %player.position, "will return after respawn");
            self.state().set_respawn_intent(RespawnIntent {
                username,
                last_known_position: player.position,
            });
        }
    }

    async fn on_respawn(&self) {
        info!("respawned");
        self.announce_status(AgentStatus::Connected, "Bot respawned!");
        self.notice("Bot respawned!");
        tokio::time::sleep(self.config.respawn.settle_delay()).await;
        self.navigate_to_party().await;
        self.publish_stats();
    }

    /// Travel back to the party recorded at death, or else to whoever last
    /// spoke to the agent. Returns whether the agent arrived.
    pub async fn navigate_to_party(&self) -> bool {
        let intent = self.state().take_respawn_intent();
        if let Some(intent) = intent {
            let destination = self
                .world
                .player(&intent.username)
                .map_or(intent.last_known_position, |p| p.position);
            info!(username = %intent.username, %destination, "returning to party");
            self.say(&format!("On my way back, {}!", intent.username));
            return match self.travel_near(destination).await {
                Ok(()) => {
                    self.say("I'm back! 👋");
                    true
                }
                Err(e) => {
                    warn!(username = %intent.username, error = %e, "could not return to party");
                    self.say("I respawned but couldn't reach you!");
                    false
                }
            };
        }

        let party = self.state().last_interacted().map(str::to_owned);
        let Some((username, player)) =
            party.and_then(|name| self.world.player(&name).map(|p| (name, p)))
        else {
            return false;
        };
        self.say(&format!("Coming to you, {username}!"));
        match self.travel_near(player.position).await {
            Ok(()) => {
                self.say("Found you! 👋");
                true
            }
            Err(e) => {
                warn!(%username, error = %e, "could not reach player");
                false
            }
        }
    }

    async fn travel_near(&self, destination: Vec3) -> Result<(), GatewayError> {
        self.world.set_movements(MovementProfile::travel());
        self.world
            .goto(Goal::near(destination, self.config.respawn.arrival_range))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassurance_mentions_player_or_is_generic() {
        for _ in 0..20 {
            let line = reassurance("Alex");
            assert!(
                line.contains("Alex")
                    || line == "Don't worry, I'll handle this!"
                    || line == "Nobody messes with you!"
            );
        }
    }
}
