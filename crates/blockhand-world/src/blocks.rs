//! Block-name classification.

pub use blockhand_types::entities::AIR_BLOCKS;

/// Soft blocks that are cleared out of the way before a placement.
pub const VEGETATION: [&str; 16] = [
    "grass",
    "short_grass",
    "tall_grass",
    "fern",
    "large_fern",
    "dead_bush",
    "dandelion",
    "poppy",
    "blue_orchid",
    "allium",
    "azure_bluet",
    "oxeye_daisy",
    "cornflower",
    "sweet_berry_bush",
    "vine",
    "snow",
];

/// Container block that accepts deposits.
pub const CHEST: &str = "chest";

/// Whether `name` denotes an empty cell.
pub fn is_air(name: &str) -> bool {
    AIR_BLOCKS.contains(&name)
}

/// Whether `name` is a soft plant or snow layer.
pub fn is_vegetation(name: &str) -> bool {
    VEGETATION.contains(&name)
}

/// Whether an inventory item counts as a melee weapon under `keywords`.
pub fn is_weapon(item_name: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| item_name.contains(k.as_str()))
}
