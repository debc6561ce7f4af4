//! Action requests, oracle decisions, and inbound commands.
//!
//! The decision oracle maps a free-text utterance to a [`Decision`]: either a
//! plain narration or one [`ActionRequest`] from a fixed vocabulary. The wire
//! shape of an action is `{"action": "<name>", "parameters": {...}}`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::TaskKind;

/// The fixed set of action identifiers the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionName {
    /// Gather blocks of a named type.
    MineBlock,
    /// Hand items to the speaker.
    GiveItems,
    /// Trail a player.
    FollowPlayer,
    /// Construct the fixed house blueprint.
    BuildHouse,
    /// Start a combat session.
    KillMobs,
    /// Global stop.
    StopAll,
    /// Stop following.
    StopFollow,
    /// Emit a status report.
    ReportStatus,
    /// Deposit inventory into a nearby chest.
    StashItems,
}

impl ActionName {
    /// Every action, in vocabulary order.
    pub const ALL: [Self; 9] = [
        Self::MineBlock,
        Self::GiveItems,
        Self::FollowPlayer,
        Self::BuildHouse,
        Self::KillMobs,
        Self::StopAll,
        Self::StopFollow,
        Self::ReportStatus,
        Self::StashItems,
    ];

    /// Wire identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MineBlock => "mine_block",
            Self::GiveItems => "give_items",
            Self::FollowPlayer => "follow_player",
            Self::BuildHouse => "build_house",
            Self::KillMobs => "kill_mobs",
            Self::StopAll => "stop_all",
            Self::StopFollow => "stop_follow",
            Self::ReportStatus => "report_status",
            Self::StashItems => "stash_items",
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an action identifier is outside the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action: {}", self.0)
    }
}

impl core::error::Error for UnknownAction {}

impl FromStr for ActionName {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_owned()))
    }
}

/// A structured request for one task entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionRequest {
    /// Gather `quantity` blocks (default 1) named `block_name`.
    MineBlock {
        /// Registry name of the block.
        #[serde(default)]
        block_name: String,
        /// How many to collect.
        #[serde(default)]
        quantity: Option<u32>,
    },
    /// Give items whose name contains `item_name`.
    GiveItems {
        /// Substring matched against item names.
        #[serde(default)]
        item_name: String,
        /// Total to hand over; all matching stacks when absent.
        #[serde(default)]
        quantity: Option<u32>,
    },
    /// Follow a player, defaulting to the speaker.
    FollowPlayer {
        /// Player to follow.
        #[serde(default)]
        username: Option<String>,
    },
    /// Build the fixed house blueprint near the agent.
    BuildHouse {},
    /// Fight mobs, optionally restricted by name.
    KillMobs {
        /// Case-insensitive substring filter.
        #[serde(default)]
        mob_name: Option<String>,
    },
    /// Stop everything.
    StopAll {},
    /// Stop following.
    StopFollow {},
    /// Report health, food, inventory, and position.
    ReportStatus {},
    /// Deposit inventory into the nearest chest.
    StashItems {},
}

impl ActionRequest {
    /// The action's identifier.
    pub const fn name(&self) -> ActionName {
        match self {
            Self::MineBlock { .. } => ActionName::MineBlock,
            Self::GiveItems { .. } => ActionName::GiveItems,
            Self::FollowPlayer { .. } => ActionName::FollowPlayer,
            Self::BuildHouse {} => ActionName::BuildHouse,
            Self::KillMobs { .. } => ActionName::KillMobs,
            Self::StopAll {} => ActionName::StopAll,
            Self::StopFollow {} => ActionName::StopFollow,
            Self::ReportStatus {} => ActionName::ReportStatus,
            Self::StashItems {} => ActionName::StashItems,
        }
    }
}

/// What the decision oracle returned for one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Reply with text only.
    Narration {
        /// Text to say.
        text: String,
    },
    /// Perform an action, optionally saying something first.
    Action {
        /// The requested action.
        request: ActionRequest,
        /// Optional line to say before dispatching.
        narration: Option<String>,
    },
}

impl Decision {
    /// A narration-only decision.
    pub fn say(text: impl Into<String>) -> Self {
        Self::Narration { text: text.into() }
    }

    /// An action decision with no accompanying narration.
    pub const fn act(request: ActionRequest) -> Self {
        Self::Action {
            request,
            narration: None,
        }
    }
}

/// Where an inbound command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    /// In-world chat.
    World,
    /// The observer (WebSocket or REST).
    Web,
}

/// Speaker id for commands that arrive from the observer.
pub const WEB_SPEAKER: &str = "WebPlayer";

/// A free-text command awaiting a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCommand {
    /// Who issued it.
    pub speaker: String,
    /// The raw text.
    pub utterance: String,
    /// Channel it arrived on.
    pub source: CommandSource,
}

impl InboundCommand {
    /// A command typed into in-world chat by `speaker`.
    pub fn world(speaker: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            utterance: utterance.into(),
            source: CommandSource::World,
        }
    }

    /// A command sent through the observer.
    pub fn web(utterance: impl Into<String>) -> Self {
        Self {
            speaker: WEB_SPEAKER.to_owned(),
            utterance: utterance.into(),
            source: CommandSource::Web,
        }
    }
}

/// Compact agent state handed to the decision oracle alongside an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Current task kind.
    pub task: TaskKind,
    /// Current health (0..=20).
    pub health: f32,
    /// Number of inventory stacks.
    pub item_count: usize,
}

impl fmt::Display for ContextSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task: {}. HP: {:.0}/20. Items: {}",
            self.task, self.health, self.item_count
        )
    }
}
