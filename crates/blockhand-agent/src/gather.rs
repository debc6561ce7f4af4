//! Bounded gather loop: find, travel, dig, repeat.

use blockhand_types::TaskKind;
use blockhand_world::{Goal, MovementProfile, WorldGateway};
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::error::AgentError;
use crate::state::TaskTicket;

impl<W: WorldGateway> Agent<W> {
    /// Mine up to `quantity` blocks named `block`. A quantity of zero means
    /// one.
    ///
    /// Returns how many were dug, or `None` when the request was refused
    /// (empty or unknown name, agent busy), preempted, or failed.
    pub async fn mine(&self, block: &str, quantity: u32) -> Option<u32> {
        let block = block.trim();
        if block.is_empty() {
            self.say("What should I mine?");
            return None;
        }
        if !self.world.is_known_block(block) {
            self.say(&format!("I don't know what \"{block}\" is."));
            return None;
        }
        let wanted = quantity.max(1);

        let Some(ticket) = self.begin(TaskKind::Mining) else {
            debug!(block, current = %self.task_kind(), "mine request ignored, agent busy");
            return None;
        };
        info!(block, wanted, "mining");

        let outcome = self.gather_loop(&ticket, block, wanted).await;
        match outcome {
            Ok(mined) => {
                if mined < wanted {
                    self.say(&format!("Only found {mined}/{wanted} {block}."));
                }
                self.say(&format!("Got {mined}x {block}! ✓"));
                self.milestone(TaskKind::Mining, &format!("mined {mined}x {block}"));
                self.end(&ticket);
                Some(mined)
            }
            Err(AgentError::Preempted) => {
                debug!(block, "mining preempted");
                None
            }
            Err(e) => {
                warn!(block, error = %e, "mining failed");
                self.say("Mining failed!");
                self.end(&ticket);
                None
            }
        }
    }

    async fn gather_loop(
        &self,
        ticket: &TaskTicket,
        block: &str,
        wanted: u32,
    ) -> Result<u32, AgentError> {
        let radius = self.config.search.block_radius;
        let mut mined = 0_u32;
        while mined < wanted {
            let Some(found) = self.world.find_nearest_block(block, radius) else {
                debug!(block, mined, wanted, "no more blocks in range");
                break;
            };

            self.world.set_movements(MovementProfile::travel());
            let travelled = self.world.goto(Goal::Block { pos: found.position }).await;
            self.checkpoint(ticket)?;
            travelled?;

            let dug = self.world.dig(found.position, true).await;
            self.checkpoint(ticket)?;
            dug?;

            mined = mined.saturating_add(1);
            debug!(block, pos = %found.position, mined, "dug block");

            if mined < wanted {
                tokio::time::sleep(self.config.gather.dig_pause()).await;
                self.checkpoint(ticket)?;
            }
        }
        Ok(mined)
    }
}
