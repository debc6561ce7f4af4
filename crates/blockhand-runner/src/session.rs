//! The agent session: every loop that feeds the agent and drains it.
//!
//! - World events go to the agent's reactive handlers. Chat lines from other
//!   parties are also decided on and dispatched as commands.
//! - Observer commands are echoed to the chat log, then decided on.
//! - Agent telemetry is folded into the observer state.
//! - A periodic refresh publishes a status snapshot while the agent is
//!   spawned.
//!
//! Each command runs on its own task under a supervisor; a crash is
//! reported in chat instead of taking the session down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use blockhand_agent::Agent;
use blockhand_observer::AppState;
use blockhand_types::{AgentEvent, InboundCommand};
use blockhand_world::{WorldEvent, WorldGateway};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::oracle::DecisionOracle;

/// Said when a command task dies unexpectedly.
pub const CRASH_REPLY: &str = "Oops, something went wrong!";

/// Everything one running agent needs.
pub struct Session<W> {
    agent: Agent<W>,
    oracle: Arc<DecisionOracle>,
    observer: Arc<AppState>,
    stats_interval: Duration,
    spawned: Arc<AtomicBool>,
}

impl<W> Clone for Session<W> {
    fn clone(&self) -> Self {
        Self {
            agent: self.agent.clone(),
            oracle: Arc::clone(&self.oracle),
            observer: Arc::clone(&self.observer),
            stats_interval: self.stats_interval,
            spawned: Arc::clone(&self.spawned),
        }
    }
}

impl<W: WorldGateway> Session<W> {
    /// Wire an agent to an oracle and an observer.
    pub fn new(
        agent: Agent<W>,
        oracle: Arc<DecisionOracle>,
        observer: Arc<AppState>,
        stats_interval: Duration,
    ) -> Self {
        Self {
            agent,
            oracle,
            observer,
            stats_interval,
            spawned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the world and the agent, then run every loop until
    /// `shutdown` fires.
    ///
    /// Subscriptions are taken before returning, so events emitted after
    /// this call are never missed.
    pub fn start(
        self,
        commands: mpsc::Receiver<InboundCommand>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let world_events = self.agent.world().subscribe();
        let agent_events = self.agent.subscribe();

        tokio::spawn(async move {
            let loops = [
                tokio::spawn(bridge_events(
                    agent_events,
                    Arc::clone(&self.observer),
                    shutdown.clone(),
                )),
                tokio::spawn(self.clone().refresh_stats(shutdown.clone())),
                tokio::spawn(self.clone().web_commands(commands, shutdown.clone())),
            ];
            self.world_events(world_events, shutdown).await;
            for handle in loops {
                if let Err(e) = handle.await {
                    error!(error = %e, "session loop failed");
                }
            }
            info!("session stopped");
        })
    }

    async fn world_events(
        self,
        mut events: broadcast::Receiver<WorldEvent>,
        shutdown: CancellationToken,
    ) {
        let me = self.agent.world().username();
        loop {
            let event = tokio::select! {
                () = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "world event stream lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            match &event {
                WorldEvent::Spawn | WorldEvent::Respawn => {
                    self.spawned.store(true, Ordering::Relaxed);
                }
                WorldEvent::Death | WorldEvent::End { .. } => {
                    self.spawned.store(false, Ordering::Relaxed);
                }
                _ => {}
            }

            match event {
                WorldEvent::Chat { ref username, .. } if *username == me => {}
                WorldEvent::Chat {
                    ref username,
                    ref message,
                } => {
                    let command = InboundCommand::world(username.as_str(), message.as_str());
                    // Relay the line before any reply to it.
                    self.agent.handle_event(event).await;
                    self.spawn_command(command);
                }
                // These sleep before travelling; the rest must stay in order.
                WorldEvent::Spawn | WorldEvent::Respawn => {
                    let agent = self.agent.clone();
                    tokio::spawn(async move { agent.handle_event(event).await });
                }
                event => self.agent.handle_event(event).await,
            }
        }
        debug!("world event loop ended");
    }

    async fn web_commands(
        self,
        mut commands: mpsc::Receiver<InboundCommand>,
        shutdown: CancellationToken,
    ) {
        loop {
            let command = tokio::select! {
                () = shutdown.cancelled() => break,
                received = commands.recv() => match received {
                    Some(command) => command,
                    None => break,
                },
            };
            self.agent.relay_chat(&command.speaker, &command.utterance);
            self.spawn_command(command);
        }
        debug!("web command loop ended");
    }

    async fn refresh_stats(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.stats_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if self.spawned.load(Ordering::Relaxed) {
                self.agent.publish_stats();
            }
        }
    }

    /// Decide on and dispatch one command in the background.
    fn spawn_command(&self, command: InboundCommand) {
        let session = self.clone();
        let agent = self.agent.clone();
        tokio::spawn(async move {
            let worker = tokio::spawn(async move { session.process(command).await });
            if let Err(e) = worker.await {
                error!(error = %e, "command task crashed");
                agent.say(CRASH_REPLY);
            }
        });
    }

    async fn process(&self, command: InboundCommand) {
        info!(speaker = %command.speaker, utterance = %command.utterance, source = ?command.source, "command received");
        let context = self.agent.context_summary();
        let decision = self.oracle.decide(&command, context).await;
        self.agent
            .handle_decision(decision, &command.speaker, command.source)
            .await;
    }
}

/// Forward agent telemetry to the observer until `shutdown`.
async fn bridge_events(
    mut events: broadcast::Receiver<AgentEvent>,
    observer: Arc<AppState>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    observer.record(event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "observer bridge lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockhand_agent::BehaviorConfig;
    use blockhand_types::{AgentStatus, ChatKind, EntityCategory, TaskKind, Vec3, WEB_SPEAKER};
    use blockhand_world::{Goal, SimWorld, SimWorldBuilder};

    use super::*;
    use crate::prompt::PromptEngine;
    use crate::rules::OFFLINE_REPLY;
    use crate::tools::catalogue;

    struct Harness {
        world: Arc<SimWorld>,
        agent: Agent<SimWorld>,
        observer: Arc<AppState>,
        commands: mpsc::Sender<InboundCommand>,
        shutdown: CancellationToken,
    }

    fn world() -> SimWorldBuilder {
        SimWorld::builder()
            .username("Pengu")
            .flat_ground(12, 63)
            .spawn_at(Vec3::new(0.5, 64.0, 0.5))
            .player("Steve", Vec3::new(3.5, 64.0, 2.5))
            .item("oak_log", 5)
    }

    fn start() -> Harness {
        start_in(world().build())
    }

    fn start_in(world: SimWorld) -> Harness {
        let world = Arc::new(world);
        let agent = Agent::new(Arc::clone(&world), BehaviorConfig::default());
        let oracle = DecisionOracle::new(
            None,
            PromptEngine::builtin().unwrap(),
            &catalogue(),
            "Pengu",
            Duration::from_secs(1),
            true,
        );
        let (tx, rx) = mpsc::channel(8);
        let observer = Arc::new(AppState::with_commands(tx.clone()));
        let shutdown = CancellationToken::new();
        Session::new(
            agent.clone(),
            Arc::new(oracle),
            Arc::clone(&observer),
            Duration::from_millis(50),
        )
        .start(rx, shutdown.clone());
        Harness {
            world,
            agent,
            observer,
            commands: tx,
            shutdown,
        }
    }

    /// Poll `check` until it holds or a second passes.
    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn world_chat_command_is_decided_and_dispatched() {
        let h = start();
        h.world.say("Steve", "status");

        assert!(
            eventually(|| h.world.chat_log().iter().any(|l| l.contains("/20 HP"))).await,
            "status report was never said"
        );

        let chat = h.observer.snapshot.read().await.recent_chat(10);
        let first = chat.first().unwrap();
        assert_eq!(first.username, "Steve");
        assert_eq!(first.kind, ChatKind::Player);
        assert!(chat.iter().any(|l| l.kind == ChatKind::Bot));
        h.shutdown.cancel();
    }

    #[tokio::test]
    async fn unmatched_chat_gets_the_offline_reply() {
        let h = start();
        h.world.say("Steve", "what do you think of sheep?");

        assert!(
            eventually(|| h.world.chat_log().iter().any(|l| l == OFFLINE_REPLY)).await,
            "offline reply was never said"
        );
        assert_eq!(h.agent.state().last_interacted(), Some("Steve"));
        h.shutdown.cancel();
    }

    #[tokio::test]
    async fn web_follow_targets_last_interacted_player() {
        let h = start();
        h.world.say("Steve", "hi");
        assert!(eventually(|| h.agent.state().last_interacted() == Some("Steve")).await);

        h.commands.send(InboundCommand::web("follow me")).await.unwrap();

        let steve = h.world.player("Steve").unwrap().id;
        assert!(
            eventually(|| matches!(
                h.world.current_goal(),
                Some(Goal::Follow { entity, .. }) if entity == steve
            ))
            .await,
            "agent never started following Steve"
        );
        assert_eq!(h.agent.task_kind(), TaskKind::Following);

        let chat = h.observer.snapshot.read().await.recent_chat(50);
        assert!(
            chat.iter()
                .any(|l| l.username == WEB_SPEAKER && l.message == "follow me")
        );
        h.shutdown.cancel();
    }

    #[tokio::test]
    async fn spawn_reaches_the_observer_and_stats_refresh() {
        let h = start();
        h.world.announce_spawn();

        let mut connected = false;
        for _ in 0..100 {
            let snapshot = h.observer.snapshot.read().await.clone();
            if snapshot.connection == Some(AgentStatus::Connected) && snapshot.status.is_some() {
                connected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(connected, "observer never saw the spawn");

        let mut updates = h.observer.subscribe();
        let refreshed = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if let Ok(AgentEvent::Stats(_)) = updates.recv().await {
                    break;
                }
            }
        })
        .await;
        assert!(refreshed.is_ok(), "no periodic stats refresh");
        h.shutdown.cancel();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lethal_hit_leaves_the_agent_idle() {
        for _ in 0..50 {
            let h = start_in(
                world()
                    .mob("zombie", EntityCategory::Hostile, Vec3::new(3.5, 64.0, 0.5))
                    .build(),
            );
            h.world.hurt_self(30.0);

            assert!(
                eventually(|| h.world.chat_log().iter().any(|l| l == "I died! Respawning...")).await,
                "death was never handled"
            );
            tokio::time::sleep(Duration::from_millis(30)).await;
            assert!(!h.world.is_alive());
            assert_eq!(h.agent.task_kind(), TaskKind::Idle);
            h.shutdown.cancel();
        }
    }
}
