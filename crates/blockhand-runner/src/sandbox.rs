//! Drives the demo world: mob movement and automatic respawn.

use std::sync::Arc;
use std::time::Duration;

use blockhand_world::SimWorld;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Timing of the sandbox loop.
#[derive(Debug, Clone, Copy)]
pub struct SandboxConfig {
    /// Period between mob steps.
    pub mob_step: Duration,
    /// How long the agent stays dead before respawning.
    pub respawn_delay: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            mob_step: Duration::from_secs(1),
            respawn_delay: Duration::from_secs(2),
        }
    }
}

/// Announce the first spawn and start stepping the world until `shutdown`.
pub fn spawn_sandbox(
    world: Arc<SimWorld>,
    config: SandboxConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            mob_step_ms = config.mob_step.as_millis(),
            "sandbox world running"
        );
        world.announce_spawn();

        let mut ticker = tokio::time::interval(config.mob_step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut dead_since: Option<Instant> = None;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if world.is_alive() {
                dead_since = None;
                world.step_mobs();
                continue;
            }

            let since = *dead_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= config.respawn_delay {
                debug!("respawning agent");
                world.respawn();
                dead_since = None;
            }
        }
        info!("sandbox world stopped");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockhand_world::{WorldEvent, WorldGateway};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn announces_spawn_and_respawns_after_death() {
        let world = Arc::new(SimWorld::demo("Pengu", 7));
        let mut events = world.subscribe();
        let shutdown = CancellationToken::new();
        let handle = spawn_sandbox(Arc::clone(&world), SandboxConfig::default(), shutdown.clone());

        assert_eq!(events.recv().await.unwrap(), WorldEvent::Spawn);

        world.hurt_self(100.0);
        assert!(!world.is_alive());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(world.is_alive());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stays_dead_until_the_delay_passes() {
        let world = Arc::new(SimWorld::demo("Pengu", 7));
        let shutdown = CancellationToken::new();
        let config = SandboxConfig {
            mob_step: Duration::from_millis(100),
            respawn_delay: Duration::from_secs(10),
        };
        let handle = spawn_sandbox(Arc::clone(&world), config, shutdown.clone());

        world.hurt_self(100.0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!world.is_alive());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
