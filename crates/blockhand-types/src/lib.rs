//! Shared type definitions for the Blockhand voxel agent.
//!
//! This crate is the single source of truth for the data that crosses crate
//! boundaries: the world gateway speaks in [`geometry`] and [`entities`]
//! types, the decision oracle produces [`actions`], and observers receive
//! [`telemetry`]. Types flow downstream to `TypeScript` via `ts-rs` for the
//! observer dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for task and combat session identifiers
//! - [`geometry`] -- Block coordinates, continuous positions, and block faces
//! - [`enums`] -- Task kinds, entity categories, chat kinds, build phases
//! - [`entities`] -- Point-in-time snapshots of entities, blocks, and items
//! - [`actions`] -- Action requests, oracle decisions, inbound commands
//! - [`telemetry`] -- Status snapshots and outbound observer events

pub mod actions;
pub mod entities;
pub mod enums;
pub mod geometry;
pub mod ids;
pub mod telemetry;

// Re-export all public types at crate root for convenience.
pub use actions::{
    ActionName, ActionRequest, CommandSource, ContextSummary, Decision, InboundCommand, WEB_SPEAKER,
};
pub use entities::{BlockSnapshot, EntityId, EntitySnapshot, ItemStack};
pub use enums::{AgentStatus, BuildPhase, ChatKind, Control, EntityCategory, EquipSlot, TaskKind};
pub use geometry::{BlockPos, Face, Vec3};
pub use ids::{CombatSessionId, TaskId};
pub use telemetry::{AgentEvent, ChatLine, StatusSnapshot};

#[cfg(test)]
mod tests {
    //! Binding generation for the observer dashboard.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings when `export_all` runs. The files land
        // in `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::TaskId::export_all();
        let _ = crate::ids::CombatSessionId::export_all();

        let _ = crate::geometry::BlockPos::export_all();
        let _ = crate::geometry::Vec3::export_all();

        let _ = crate::enums::TaskKind::export_all();
        let _ = crate::enums::EntityCategory::export_all();
        let _ = crate::enums::ChatKind::export_all();
        let _ = crate::enums::AgentStatus::export_all();
        let _ = crate::enums::BuildPhase::export_all();

        let _ = crate::entities::ItemStack::export_all();

        let _ = crate::actions::ActionName::export_all();
        let _ = crate::actions::ActionRequest::export_all();

        let _ = crate::telemetry::StatusSnapshot::export_all();
        let _ = crate::telemetry::ChatLine::export_all();
        let _ = crate::telemetry::AgentEvent::export_all();
    }
}
