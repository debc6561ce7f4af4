//! Inventory transfer: handing items to a player and stashing them in a
//! chest.

use blockhand_types::{BlockPos, ItemStack, TaskKind, Vec3};
use blockhand_world::{Goal, MovementProfile, WorldGateway, blocks};
use tracing::{debug, info, warn};

use crate::agent::{Agent, tolerate};
use crate::error::AgentError;
use crate::state::TaskTicket;

/// How many of each matching stack to hand over.
///
/// With `quantity`, stacks are drained in order until the running total
/// reaches it; the last stack may be split. Without one, every matching
/// stack goes entirely.
pub fn plan_transfer(stacks: &[ItemStack], quantity: Option<u32>) -> Vec<(String, u32)> {
    let mut plan = Vec::new();
    let mut remaining = quantity;
    for stack in stacks {
        let count = match remaining {
            Some(0) => break,
            Some(left) => stack.count.min(left),
            None => stack.count,
        };
        if count == 0 {
            continue;
        }
        remaining = remaining.map(|left| left.saturating_sub(count));
        plan.push((stack.name.clone(), count));
    }
    plan
}

impl<W: WorldGateway> Agent<W> {
    /// Give `recipient` the stacks whose name contains `item`, up to
    /// `quantity` in total (all of them when `None` or zero).
    ///
    /// Returns how many items were handed over, or `None` if nothing was.
    pub async fn give(&self, recipient: &str, item: &str, quantity: Option<u32>) -> Option<u32> {
        let me = self.world.position();
        let Some(player) = self
            .world
            .player(recipient)
            .filter(|p| p.position.distance_to(me) <= self.config.search.give_radius)
        else {
            debug!(recipient, "recipient not within give range");
            self.say("Come closer so I can give you items!");
            return None;
        };
        let needle = item.trim().to_lowercase();
        let matching: Vec<ItemStack> = self
            .world
            .inventory()
            .into_iter()
            .filter(|stack| stack.name.contains(&needle))
            .collect();
        if needle.is_empty() || matching.is_empty() {
            self.say(&format!("I don't have any {item}!"));
            return None;
        }

        let Some(ticket) = self.begin(TaskKind::Transferring) else {
            debug!(recipient, item, current = %self.task_kind(), "give request ignored, agent busy");
            return None;
        };
        info!(recipient, item, ?quantity, "giving items");

        let plan = plan_transfer(&matching, quantity.filter(|q| *q > 0));
        let outcome = self.hand_over(&ticket, player.head_point(), &plan).await;
        match outcome {
            Ok(given) => {
                self.say(&format!("Gave you {given}x {item}! ✓"));
                self.milestone(TaskKind::Transferring, &format!("gave {given}x {item} to {recipient}"));
                self.end(&ticket);
                Some(given)
            }
            Err(AgentError::Preempted) => None,
            Err(e) => {
                warn!(recipient, item, error = %e, "give failed");
                self.say("Couldn't give items!");
                self.end(&ticket);
                None
            }
        }
    }

    async fn hand_over(
        &self,
        ticket: &TaskTicket,
        toward: Vec3,
        plan: &[(String, u32)],
    ) -> Result<u32, AgentError> {
        let looked = self.world.look_at(toward).await;
        self.checkpoint(ticket)?;
        looked?;

        let mut given = 0_u32;
        for (name, count) in plan {
            let tossed = self.world.toss(name, *count).await;
            self.checkpoint(ticket)?;
            tossed?;
            given = given.saturating_add(*count);
        }
        Ok(given)
    }

    /// Deposit every non-weapon stack into the nearest chest.
    ///
    /// Returns how many items went in, or `None` when there was no chest,
    /// the agent was busy, or the task failed.
    pub async fn stash(&self) -> Option<u32> {
        let Some(chest) = self
            .world
            .find_nearest_block(blocks::CHEST, self.config.search.chest_radius)
        else {
            self.say("No chest nearby!");
            return None;
        };

        let Some(ticket) = self.begin(TaskKind::Transferring) else {
            debug!(current = %self.task_kind(), "stash request ignored, agent busy");
            return None;
        };
        info!(chest = %chest.position, "stashing items");

        match self.stash_into(&ticket, chest.position).await {
            Ok(stored) => {
                self.say(&format!("Stashed {stored} items! ✓"));
                self.milestone(TaskKind::Transferring, &format!("stashed {stored} items"));
                self.end(&ticket);
                Some(stored)
            }
            Err(AgentError::Preempted) => None,
            Err(e) => {
                warn!(error = %e, "stash failed");
                self.say("Couldn't stash items!");
                self.end(&ticket);
                None
            }
        }
    }

    async fn stash_into(
        &self,
        ticket: &TaskTicket,
        chest: BlockPos,
    ) -> Result<u32, AgentError> {
        self.world.set_movements(MovementProfile::travel());
        let travelled = self.world.goto(Goal::Block { pos: chest }).await;
        self.checkpoint(ticket)?;
        travelled?;

        let keywords = &self.config.combat.weapon_keywords;
        let stacks: Vec<ItemStack> = self
            .world
            .inventory()
            .into_iter()
            .filter(|stack| !blocks::is_weapon(&stack.name, keywords))
            .collect();

        let mut stored = 0_u32;
        for stack in stacks {
            let deposited = self.world.deposit(chest, &stack.name, stack.count).await;
            self.checkpoint(ticket)?;
            if tolerate(deposited, "deposit")? {
                stored = stored.saturating_add(stack.count);
            }
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacks() -> Vec<ItemStack> {
        vec![
            ItemStack::new("oak_log", 10, "Oak Log"),
            ItemStack::new("oak_log", 64, "Oak Log"),
            ItemStack::new("oak_planks", 5, "Oak Planks"),
        ]
    }

    #[test]
    fn quantity_splits_the_last_stack() {
        let plan = plan_transfer(&stacks(), Some(12));
        assert_eq!(
            plan,
            vec![("oak_log".to_owned(), 10), ("oak_log".to_owned(), 2)]
        );
    }

    #[test]
    fn no_quantity_gives_everything() {
        let plan = plan_transfer(&stacks(), None);
        let total: u32 = plan.iter().map(|(_, n)| n).sum();
        assert_eq!(plan.len(), 3);
        assert_eq!(total, 79);
    }

    #[test]
    fn quantity_beyond_stock_gives_what_there_is() {
        let one = vec![ItemStack::new("oak_log", 10, "Oak Log")];
        let plan = plan_transfer(&one, Some(50));
        assert_eq!(plan, vec![("oak_log".to_owned(), 10)]);
    }
}
