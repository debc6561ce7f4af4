//! Point-in-time status summary. Leaves the task slot untouched.

use std::collections::BTreeMap;

use blockhand_types::{ItemStack, StatusSnapshot};
use blockhand_world::WorldGateway;

use crate::agent::Agent;

/// Inventory summary: `Name xN` per display name, or `Empty`.
pub fn inventory_line(items: &[ItemStack]) -> String {
    if items.is_empty() {
        return "Empty".to_owned();
    }
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for item in items {
        let name = if item.display_name.is_empty() {
            item.name.as_str()
        } else {
            item.display_name.as_str()
        };
        let total = counts.entry(name).or_default();
        *total = total.saturating_add(item.count);
    }
    counts
        .into_iter()
        .map(|(name, count)| format!("{name} x{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The three report lines for `status`.
pub fn report_lines(status: &StatusSnapshot) -> Vec<String> {
    let p = status.position;
    vec![
        format!(
            "❤️ {:.0}/20 HP | 🍗 {:.0}/20 Food",
            status.health.round(),
            status.food.round()
        ),
        format!("🎒 {}", inventory_line(&status.inventory)),
        format!(
            "📍 X:{:.0} Y:{:.0} Z:{:.0}",
            p.x.round(),
            p.y.round(),
            p.z.round()
        ),
    ]
}

impl<W: WorldGateway> Agent<W> {
    /// Say health, inventory, and position. Returns the lines said.
    pub fn report_status(&self) -> Vec<String> {
        let status = self.snapshot();
        let lines = report_lines(&status);
        for line in &lines {
            self.say(line);
        }
        self.publish_stats();
        lines
    }
}
