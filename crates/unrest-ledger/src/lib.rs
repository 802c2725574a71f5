//! Per-territory morale ledger for the regional unrest simulation.
//!
//! The ledger is the single source of truth for morale values and their
//! audit trail. It knows nothing about neighbors: contagion is computed by
//! `unrest-diffusion` and applied back through [`MoraleLedger::update_morale`].
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`MoraleLedger`] struct: keyed storage, delta and
//!   absolute updates, unrest attachments, filters, snapshots.
//! - [`national`] -- Strategic-value weighted national aggregation.
//! - [`invariants`] -- Range and history-window verification.
//! - [`modifiers`] -- Morale to production and recruitment multipliers.
//!
//! # Unknown territories
//!
//! Every operation keyed by a territory id returns `None` (or `false`, or an
//! empty list) for an id the ledger does not track. The turn loop calls the
//! ledger with ids that may have been removed mid-turn and must never crash.
//!
//! # Usage
//!
//! ```
//! use unrest_ledger::MoraleLedger;
//! use unrest_types::TerritoryId;
//!
//! let mut ledger = MoraleLedger::new();
//! let t1 = TerritoryId::from("t1");
//! ledger.initialize_territory(t1.clone(), 60.0, 0);
//!
//! ledger.apply_refugee_influx(&t1, 1500);
//! assert_eq!(ledger.morale(&t1), Some(50.0));
//!
//! // Unknown ids are ignored.
//! assert!(ledger.update_morale(&TerritoryId::from("gone"), -5.0, None).is_none());
//! ```

pub mod invariants;
pub mod ledger;
pub mod modifiers;
pub mod national;

// Re-export primary types at crate root.
pub use invariants::{InvariantResult, InvariantViolation};
pub use ledger::{
    DEFAULT_INITIAL_MORALE, DEFAULT_NATURAL_TARGET, DEFAULT_RECOVERY_RATE, LedgerSnapshot,
    MoraleLedger, TerritoryOrigin,
};
pub use modifiers::{calculate_morale_production_modifier, calculate_morale_recruitment_modifier};
pub use national::{CRITICAL_MORALE_THRESHOLD, NationalMorale};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when restoring ledger state.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The snapshot breaks one or more ledger invariants.
    #[error("invalid ledger snapshot: {anomaly}")]
    InvalidSnapshot {
        /// What was wrong with it.
        anomaly: LedgerAnomaly,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A set of invariant violations found in ledger state.
///
/// Produced by [`MoraleLedger::verify_invariants`] and by snapshot import.
/// A healthy ledger never produces one: the clamp and history window are
/// applied on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerAnomaly {
    /// Turn at which the check ran.
    pub turn: u64,
    /// Every violation found, in territory order.
    pub violations: Vec<InvariantViolation>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
