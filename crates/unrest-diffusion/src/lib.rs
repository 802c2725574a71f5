//! Morale contagion and event effects for the regional unrest simulation.
//!
//! Every function in this crate is pure: it reads morale values and an
//! adjacency description supplied by the caller and returns deltas. Nothing
//! here writes morale; the turn runner applies the results through the
//! morale ledger.
//!
//! # Modules
//!
//! - [`config`] -- [`DiffusionConfig`] tuning knobs.
//! - [`spread`] -- Neighbor contagion for one territory and for a whole
//!   nation over a frozen snapshot.
//! - [`events`] -- Discrete-event calculators: borders, victory, defeat,
//!   conquest, protests, nuclear strikes, refugees.
//! - [`stability`] -- Composite stability score and trend forecasting.
//!
//! # Simultaneity
//!
//! [`calculate_morale_spread_for_nation`] builds one lookup map before
//! computing any delta, so every territory sees its neighbors' pre-turn
//! morale no matter what order the caller lists territories in.

pub mod config;
pub mod events;
pub mod spread;
pub mod stability;

// Re-export primary functions at crate root.
pub use config::DiffusionConfig;
pub use events::{
    calculate_border_instability_effect, calculate_conquest_morale_effect,
    calculate_defeat_morale_penalty, calculate_nuclear_strike_morale_effect,
    calculate_protest_resolution_boost, calculate_refugee_morale_impact,
    calculate_victory_morale_boost,
};
pub use spread::{calculate_morale_spread, calculate_morale_spread_for_nation};
pub use stability::{calculate_morale_stability, predict_morale_trend};
