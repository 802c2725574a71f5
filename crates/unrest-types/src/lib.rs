//! Shared type definitions for the regional unrest simulation.
//!
//! This crate is the single source of truth for the data model shared by
//! the ledger, diffusion and strike crates. Types flow to `TypeScript` via
//! `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe territory identifiers
//! - [`enums`] -- Strike, demand and event-tier enumerations
//! - [`structs`] -- Morale records, strike state and collaborator inputs

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    DefeatTier, DemandSeverity, DemandType, NuclearTier, ProtestOutcome, StrikeType, VictoryTier,
};
pub use ids::TerritoryId;
pub use structs::{
    CONQUEST_MORALE_OFFSET, MORALE_HISTORY_LEN, MORALE_MAX, MORALE_MIN, ProtestState,
    RegionalMorale, StrikeDemand, StrikeState, TerritoryAdjacency, TerritoryWeight,
    clamp_morale,
};
