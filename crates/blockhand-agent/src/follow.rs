//! Escort: a standing follow goal toward a named player.
//!
//! Following never blocks. The goal stays installed until `stop_follow`,
//! a global stop, or any other task claims the slot.

use blockhand_types::TaskKind;
use blockhand_world::{Goal, MovementProfile, WorldGateway};
use tracing::{debug, info};

use crate::agent::Agent;

impl<W: WorldGateway> Agent<W> {
    /// Start trailing `username` at the configured distance.
    ///
    /// Following someone else while already following switches target.
    /// Returns whether the goal was installed.
    pub fn follow(&self, username: &str) -> bool {
        let Some(player) = self.world.player(username) else {
            self.say(&format!("Can't see you, {username}!"));
            return false;
        };
        if self.begin(TaskKind::Following).is_none() {
            debug!(username, current = %self.task_kind(), "follow request ignored, agent busy");
            return false;
        }
        info!(username, entity = %player.id, "following");
        self.world.set_movements(MovementProfile::follow());
        self.world.set_goal(Some(Goal::Follow {
            entity: player.id,
            range: self.config.follow.distance,
        }));
        true
    }

    /// Drop the follow goal. The slot goes idle only if it was `Following`.
    pub fn stop_follow(&self) {
        self.world.set_goal(None);
        let stopped = self.state().finish_following();
        debug!(stopped, "stopped following");
        self.publish_stats();
    }
}
