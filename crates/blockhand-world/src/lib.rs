//! The world interaction gateway and an in-memory voxel sandbox.
//!
//! The agent never touches a world directly. Every travel, dig, place,
//! equip, and strike goes through the [`WorldGateway`] trait, and every
//! asynchronous happening (damage, death, chat) arrives as a
//! [`WorldEvent`] on a broadcast channel.
//!
//! # Modules
//!
//! - [`gateway`] -- The [`WorldGateway`] trait and the [`WorldEvent`] stream.
//! - [`goal`] -- Travel goals and movement profiles handed to the pathfinder.
//! - [`blocks`] -- Block-name classification (air, vegetation, containers).
//! - [`error`] -- [`GatewayError`], the rejection type of every primitive.
//! - [`sim`] -- [`SimWorld`], a deterministic voxel sandbox implementing the
//!   gateway, used by the runner's demo session and by every scenario test.

pub mod blocks;
pub mod error;
pub mod gateway;
pub mod goal;
pub mod sim;

pub use error::GatewayError;
pub use gateway::{WorldEvent, WorldGateway};
pub use goal::{Goal, MovementProfile};
pub use sim::{FaultPlan, SimOp, SimWorld, SimWorldBuilder};
