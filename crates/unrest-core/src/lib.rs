//! Configuration, turn clock and turn orchestration for the unrest
//! simulation.
//!
//! This crate owns the per-turn cycle that drives the simulation: protest
//! attachment, contagion, discrete events, recovery, strike processing and
//! spawning, and ledger reconciliation.
//!
//! # Modules
//!
//! - [`clock`] -- Turn counter with checked advance.
//! - [`config`] -- Configuration loading from `unrest-config.yaml` into
//!   strongly-typed structs.
//! - [`rng`] -- Replayable and live random sources.
//! - [`turn`] -- The [`TurnRunner`] and its inputs, outputs and save state.
//!
//! [`TurnRunner`]: turn::TurnRunner

pub mod clock;
pub mod config;
pub mod rng;
pub mod turn;

pub use clock::{ClockError, TurnClock};
pub use config::{ConfigError, UnrestConfig};
pub use rng::build_rng;
pub use turn::{
    MoraleEvent, SaveState, TerritoryOutlook, TerritoryProfile, TurnError, TurnInputs,
    TurnRunner, TurnSummary,
};
