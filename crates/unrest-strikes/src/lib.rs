//! Labor strike lifecycle for the regional unrest simulation.
//!
//! A strike spawns when a territory's morale falls below a threshold,
//! costs production while it runs, escalates its price the longer it is
//! left alone, and ends by negotiation, payment, suppression or
//! exhaustion. Every random draw comes from a caller-supplied
//! [`rand::Rng`], so a seeded generator replays exactly.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use unrest_strikes::StrikeManager;
//! use unrest_types::{DemandSeverity, DemandType, StrikeDemand, StrikeType, TerritoryId};
//!
//! let mut manager = StrikeManager::default();
//! let mill = TerritoryId::from("mill");
//! let demand = StrikeDemand {
//!     demand_type: DemandType::Wages,
//!     severity: DemandSeverity::Minor,
//!     cost: Decimal::new(200, 0),
//! };
//! assert!(manager.create_strike(&mill, StrikeType::IndustrialStrike, vec![demand]).is_ok());
//!
//! let outcome = manager.negotiate(&mill, Decimal::new(200, 0));
//! assert!(outcome.is_some_and(|o| o.resolved));
//! assert!(!manager.has_strike(&mill));
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Spawn, escalation and resolution tunables
//! - [`spawn`] -- Spawn rolls, strike type and demand generation
//! - [`manager`] -- The per-territory strike state machine
//! - [`production`] -- Aggregate production lost to strikes
//! - [`error`] -- Refused operations

pub mod config;
pub mod error;
mod gold;
pub mod manager;
pub mod production;
pub mod spawn;

pub use config::StrikeConfig;
pub use error::StrikeError;
pub use manager::{
    NegotiationOutcome, PaymentOutcome, ResolutionCause, ResolvedStrike, StrikeManager,
    StrikeSnapshot, StrikeStatistics, SuppressionOutcome, WaitOutcome,
};
pub use production::calculate_total_strike_production_penalty;
pub use spawn::{determine_strike_type, generate_demands, should_spawn_strike, strike_spawn_chance};
