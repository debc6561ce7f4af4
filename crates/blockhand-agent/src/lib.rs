//! Task execution and reactive behaviour for a voxel-world agent.
//!
//! An [`Agent`] wraps one body in a [`WorldGateway`] and runs at most one
//! long-lived task on it at a time. Commands enter through the
//! [`dispatch`] layer; world events enter through
//! [`Agent::handle_event`](reactive).
//!
//! # Modules
//!
//! - [`state`] -- The single task slot, combat session, and respawn intent.
//! - [`agent`] -- The shared [`Agent`] handle and global stop.
//! - [`combat`] -- Periodic target acquisition and strikes.
//! - [`construction`] -- Site selection, clearing, layered placement, cleanup.
//! - [`gather`] -- Bounded mining loop.
//! - [`transfer`] -- Handing items to a player and stashing them in a chest.
//! - [`follow`] -- Escort goal.
//! - [`report`] -- Status summary lines.
//! - [`reactive`] -- Damage, death, respawn, and spawn handlers.
//! - [`dispatch`] -- Maps an [`ActionRequest`] onto a task entry point.
//! - [`telemetry`] -- Narration and observer events.
//! - [`config`] -- YAML behaviour configuration.
//!
//! [`WorldGateway`]: blockhand_world::WorldGateway
//! [`ActionRequest`]: blockhand_types::ActionRequest

pub mod agent;
pub mod combat;
pub mod config;
pub mod construction;
pub mod dispatch;
pub mod error;
pub mod follow;
pub mod gather;
pub mod reactive;
pub mod report;
pub mod state;
pub mod telemetry;
pub mod transfer;

pub use agent::Agent;
pub use blockhand_types::WEB_SPEAKER;
pub use config::BehaviorConfig;
pub use construction::{BuildPlan, BuildReport};
pub use error::{AgentError, ConfigError};
pub use state::{AgentState, RespawnIntent, TaskTicket};
