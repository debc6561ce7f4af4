//! Behaviour configuration for the agent.
//!
//! Every tunable distance, delay, and material the task engines use lives
//! here. The defaults reproduce the agent's stock behaviour; an optional
//! YAML file can override any subset of fields.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level behaviour configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BehaviorConfig {
    /// Block and container search.
    #[serde(default)]
    pub search: SearchConfig,

    /// Escort behaviour.
    #[serde(default)]
    pub follow: FollowConfig,

    /// Combat engine and threat detection.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Health alerts.
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Spawn and respawn behaviour.
    #[serde(default)]
    pub respawn: RespawnConfig,

    /// Gather loop pacing.
    #[serde(default)]
    pub gather: GatherConfig,

    /// Construction engine.
    #[serde(default)]
    pub build: BuildConfig,
}

impl BehaviorConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Search radii.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchConfig {
    /// How far the gather loop looks for blocks.
    #[serde(default = "default_block_radius")]
    pub block_radius: f64,

    /// How far the stash task looks for a chest.
    #[serde(default = "default_chest_radius")]
    pub chest_radius: f64,

    /// How close a player must be to be handed items.
    #[serde(default = "default_give_radius")]
    pub give_radius: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            block_radius: default_block_radius(),
            chest_radius: default_chest_radius(),
            give_radius: default_give_radius(),
        }
    }
}

/// Escort settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FollowConfig {
    /// Trailing distance.
    #[serde(default = "default_follow_distance")]
    pub distance: f64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            distance: default_follow_distance(),
        }
    }
}

/// Combat engine and reactive threat detection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombatConfig {
    /// Maximum distance at which a strike is issued without approaching.
    #[serde(default = "default_strike_range")]
    pub strike_range: f64,

    /// Period of the combat tick in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Target acquisition radius.
    #[serde(default = "default_combat_radius")]
    pub radius: f64,

    /// Attacker search radius when the agent itself is hurt.
    #[serde(default = "default_self_defense_radius")]
    pub self_defense_radius: f64,

    /// Attacker search radius around a hurt player.
    #[serde(default = "default_protect_victim_radius")]
    pub protect_victim_radius: f64,

    /// Maximum distance from the agent to a player's attacker.
    #[serde(default = "default_protect_self_radius")]
    pub protect_self_radius: f64,

    /// Species treated as hostile when no name filter is given.
    #[serde(default = "default_hostile_species")]
    pub hostile_species: Vec<String>,

    /// Item-name fragments that mark a melee weapon.
    #[serde(default = "default_weapon_keywords")]
    pub weapon_keywords: Vec<String>,
}

impl CombatConfig {
    /// The tick period.
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            strike_range: default_strike_range(),
            tick_ms: default_tick_ms(),
            radius: default_combat_radius(),
            self_defense_radius: default_self_defense_radius(),
            protect_victim_radius: default_protect_victim_radius(),
            protect_self_radius: default_protect_self_radius(),
            hostile_species: default_hostile_species(),
            weapon_keywords: default_weapon_keywords(),
        }
    }
}

/// Health alert thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VitalsConfig {
    /// Below this, low health is logged.
    #[serde(default = "default_low_health")]
    pub low_health: f32,

    /// Below this, during combat, a distress call goes out.
    #[serde(default = "default_critical_health")]
    pub critical_health: f32,

    /// Minimum seconds between distress calls.
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: u64,
}

impl VitalsConfig {
    /// Minimum spacing between distress calls.
    pub const fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            low_health: default_low_health(),
            critical_health: default_critical_health(),
            alert_cooldown_secs: default_alert_cooldown_secs(),
        }
    }
}

/// Spawn and respawn behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RespawnConfig {
    /// Settling delay after respawning before travelling.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay after the first spawn before rejoining a known party.
    #[serde(default = "default_rejoin_delay_ms")]
    pub rejoin_delay_ms: u64,

    /// How close to the party counts as arrived.
    #[serde(default = "default_arrival_range")]
    pub arrival_range: f64,
}

impl RespawnConfig {
    /// Settling delay after a respawn.
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Delay before rejoining after the first spawn.
    pub const fn rejoin_delay(&self) -> Duration {
        Duration::from_millis(self.rejoin_delay_ms)
    }
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            rejoin_delay_ms: default_rejoin_delay_ms(),
            arrival_range: default_arrival_range(),
        }
    }
}

/// Gather loop pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatherConfig {
    /// Pause between consecutive digs.
    #[serde(default = "default_dig_pause_ms")]
    pub dig_pause_ms: u64,
}

impl GatherConfig {
    /// Pause between consecutive digs.
    pub const fn dig_pause(&self) -> Duration {
        Duration::from_millis(self.dig_pause_ms)
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            dig_pause_ms: default_dig_pause_ms(),
        }
    }
}

/// Construction engine: blueprint, site selection, and reach.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildConfig {
    /// Footprint extent along X.
    #[serde(default = "default_width")]
    pub width: i32,

    /// Footprint extent along Z.
    #[serde(default = "default_depth")]
    pub depth: i32,

    /// Wall height above the floor.
    #[serde(default = "default_height")]
    pub height: i32,

    /// X offset from the agent to the candidate site.
    #[serde(default = "default_site_offset")]
    pub site_offset: i32,

    /// Half-width of the square probed around the candidate site.
    #[serde(default = "default_probe_half_width")]
    pub probe_half_width: i32,

    /// Gap between the far wall and the safe observation spot.
    #[serde(default = "default_safe_margin")]
    pub safe_margin: i32,

    /// Beyond this distance a placement travels first.
    #[serde(default = "default_reach")]
    pub reach: f64,

    /// How close to travel before retrying a placement or dig.
    #[serde(default = "default_approach_range")]
    pub approach_range: f64,

    /// Beyond this distance clearing and cleanup travel before digging.
    #[serde(default = "default_dig_reach")]
    pub dig_reach: f64,

    /// How long the jump is held before a scaffold placement.
    #[serde(default = "default_jump_settle_ms")]
    pub jump_settle_ms: u64,

    /// Column (X offset) of the doorway in the front wall.
    #[serde(default = "default_door_column")]
    pub door_column: i32,

    /// Number of wall levels left open for the doorway.
    #[serde(default = "default_door_height")]
    pub door_height: i32,

    /// Floor material.
    #[serde(default = "default_floor_material")]
    pub floor_material: String,

    /// Wall material.
    #[serde(default = "default_wall_material")]
    pub wall_material: String,

    /// Corner column material.
    #[serde(default = "default_corner_material")]
    pub corner_material: String,

    /// Roof material.
    #[serde(default = "default_roof_material")]
    pub roof_material: String,
}

impl BuildConfig {
    /// Jump hold before a scaffold placement.
    pub const fn jump_settle(&self) -> Duration {
        Duration::from_millis(self.jump_settle_ms)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            depth: default_depth(),
            height: default_height(),
            site_offset: default_site_offset(),
            probe_half_width: default_probe_half_width(),
            safe_margin: default_safe_margin(),
            reach: default_reach(),
            approach_range: default_approach_range(),
            dig_reach: default_dig_reach(),
            jump_settle_ms: default_jump_settle_ms(),
            door_column: default_door_column(),
            door_height: default_door_height(),
            floor_material: default_floor_material(),
            wall_material: default_wall_material(),
            corner_material: default_corner_material(),
            roof_material: default_roof_material(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_block_radius() -> f64 {
    32.0
}

const fn default_chest_radius() -> f64 {
    6.0
}

const fn default_give_radius() -> f64 {
    16.0
}

const fn default_follow_distance() -> f64 {
    2.0
}

const fn default_strike_range() -> f64 {
    4.0
}

const fn default_tick_ms() -> u64 {
    500
}

const fn default_combat_radius() -> f64 {
    32.0
}

const fn default_self_defense_radius() -> f64 {
    15.0
}

const fn default_protect_victim_radius() -> f64 {
    10.0
}

const fn default_protect_self_radius() -> f64 {
    32.0
}

fn default_hostile_species() -> Vec<String> {
    [
        "zombie",
        "skeleton",
        "creeper",
        "spider",
        "enderman",
        "witch",
        "slime",
        "cave_spider",
        "husk",
        "stray",
        "drowned",
        "phantom",
        "blaze",
        "ghast",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_weapon_keywords() -> Vec<String> {
    vec!["sword".to_owned(), "axe".to_owned()]
}

const fn default_low_health() -> f32 {
    6.0
}

const fn default_critical_health() -> f32 {
    4.0
}

const fn default_alert_cooldown_secs() -> u64 {
    10
}

const fn default_settle_delay_ms() -> u64 {
    2000
}

const fn default_rejoin_delay_ms() -> u64 {
    3000
}

const fn default_arrival_range() -> f64 {
    3.0
}

const fn default_dig_pause_ms() -> u64 {
    500
}

const fn default_width() -> i32 {
    5
}

const fn default_depth() -> i32 {
    5
}

const fn default_height() -> i32 {
    4
}

const fn default_site_offset() -> i32 {
    6
}

const fn default_probe_half_width() -> i32 {
    3
}

const fn default_safe_margin() -> i32 {
    3
}

const fn default_reach() -> f64 {
    4.5
}

const fn default_approach_range() -> f64 {
    3.0
}

const fn default_dig_reach() -> f64 {
    5.0
}

const fn default_jump_settle_ms() -> u64 {
    50
}

const fn default_door_column() -> i32 {
    2
}

const fn default_door_height() -> i32 {
    2
}

fn default_floor_material() -> String {
    "oak_planks".to_owned()
}

fn default_wall_material() -> String {
    "cobblestone".to_owned()
}

fn default_corner_material() -> String {
    "oak_log".to_owned()
}

fn default_roof_material() -> String {
    "cobblestone".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_behaviour() {
        let config = BehaviorConfig::default();
        assert!((config.search.block_radius - 32.0).abs() < f64::EPSILON);
        assert!((config.combat.strike_range - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.combat.tick(), Duration::from_millis(500));
        assert_eq!(config.combat.hostile_species.len(), 14);
        assert_eq!(config.build.width, 5);
        assert_eq!(config.build.height, 4);
        assert_eq!(config.respawn.settle_delay(), Duration::from_secs(2));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r"
combat:
  strike_range: 3.0
  hostile_species: [zombie]
build:
  width: 7
  roof_material: oak_planks
";
        let config = BehaviorConfig::parse(yaml).unwrap();
        assert!((config.combat.strike_range - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.combat.hostile_species, vec!["zombie".to_owned()]);
        assert_eq!(config.combat.tick_ms, 500);
        assert_eq!(config.build.width, 7);
        assert_eq!(config.build.depth, 5);
        assert_eq!(config.build.roof_material, "oak_planks");
        assert_eq!(config.vitals.alert_cooldown_secs, 10);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = BehaviorConfig::parse("{}").unwrap();
        assert_eq!(config, BehaviorConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            BehaviorConfig::parse("combat: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
