//! Shared type definitions for the Crosswalk dilemma simulation.
//!
//! This crate is the single source of truth for the data that crosses the
//! boundary between the encounter engine and its collaborators: the
//! presentation layer reads [`RenderSnapshot`] every frame, and the results
//! renderer consumes the [`DecisionRecord`] log. Types flow downstream to
//! `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for session identifiers
//! - [`enums`] -- Lanes, choices, signals, and encounter phases
//! - [`structs`] -- Decision records, character groups, and render snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Choice, EncounterPhase, Lane, Resolution, Signal};
pub use ids::SessionId;
pub use structs::{
    CharacterGroup, DecisionRecord, EncounterView, ReferenceSplit, RenderSnapshot,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::SessionId::export_all();

        let _ = crate::enums::Choice::export_all();
        let _ = crate::enums::Signal::export_all();
        let _ = crate::enums::EncounterPhase::export_all();
        let _ = crate::enums::Resolution::export_all();

        let _ = crate::structs::CharacterGroup::export_all();
        let _ = crate::structs::ReferenceSplit::export_all();
        let _ = crate::structs::DecisionRecord::export_all();
        let _ = crate::structs::EncounterView::export_all();
        let _ = crate::structs::RenderSnapshot::export_all();
    }
}
