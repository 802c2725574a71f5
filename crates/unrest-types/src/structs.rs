//! Core entity structs for the unrest simulation.
//!
//! [`RegionalMorale`] is the per-territory record owned by the morale
//! ledger. [`StrikeState`] is the per-territory labor strike owned by the
//! strike manager; the ledger holds a copy of it as the territory's active
//! strike reference. [`ProtestState`] is produced by the protest subsystem
//! and is only ever read here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DemandSeverity, DemandType, StrikeType};
use crate::ids::TerritoryId;

/// Lowest representable morale.
pub const MORALE_MIN: f64 = 0.0;

/// Highest representable morale.
pub const MORALE_MAX: f64 = 100.0;

/// Number of morale samples retained in [`RegionalMorale::historical_morale`].
pub const MORALE_HISTORY_LEN: usize = 5;

/// Morale offset of freshly conquered territory relative to the campaign
/// seed of 60.
///
/// Used both when seeding conquered territory and by the per-turn
/// conquest calculator, so the two always agree.
pub const CONQUEST_MORALE_OFFSET: f64 = -40.0;

/// Clamp a morale value into `[MORALE_MIN, MORALE_MAX]`.
///
/// `NaN` collapses to [`MORALE_MIN`] so a corrupt input can never escape
/// the range.
pub fn clamp_morale(value: f64) -> f64 {
    if value.is_nan() {
        return MORALE_MIN;
    }
    value.clamp(MORALE_MIN, MORALE_MAX)
}

// ---------------------------------------------------------------------------
// Regional morale
// ---------------------------------------------------------------------------

/// Authoritative morale record for one territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionalMorale {
    /// The territory this record belongs to.
    pub territory_id: TerritoryId,
    /// Current morale in `[0, 100]`.
    pub morale: f64,
    /// Turn of the last mutation.
    pub last_event_turn: u64,
    /// Realized signed delta of the last mutation (after clamping).
    pub last_morale_change: f64,
    /// Reason attached to the last mutation, if the caller supplied one.
    pub last_change_reason: Option<String>,
    /// Last [`MORALE_HISTORY_LEN`] morale values, most recent last.
    pub historical_morale: Vec<f64>,
    /// Active protest, owned by the protest subsystem.
    pub protests: Option<ProtestState>,
    /// Active strike reference.
    pub strikes: Option<StrikeState>,
    /// Refugee count applied by the most recent influx.
    pub refugee_influx: u32,
}

impl RegionalMorale {
    /// Create a fresh record with `morale` clamped into range and recorded
    /// as the first history sample.
    pub fn new(territory_id: TerritoryId, morale: f64, turn: u64) -> Self {
        let morale = clamp_morale(morale);
        Self {
            territory_id,
            morale,
            last_event_turn: turn,
            last_morale_change: 0.0,
            last_change_reason: None,
            historical_morale: vec![morale],
            protests: None,
            strikes: None,
            refugee_influx: 0,
        }
    }

    /// Append a history sample, evicting the oldest beyond the window.
    pub fn push_history(&mut self, value: f64) {
        self.historical_morale.push(value);
        while self.historical_morale.len() > MORALE_HISTORY_LEN {
            self.historical_morale.remove(0);
        }
    }

    /// Whether a protest is attached.
    pub const fn has_protest(&self) -> bool {
        self.protests.is_some()
    }

    /// Whether a strike is attached.
    pub const fn has_strike(&self) -> bool {
        self.strikes.is_some()
    }
}

// ---------------------------------------------------------------------------
// Protests (external)
// ---------------------------------------------------------------------------

/// Protest state produced by the protest subsystem.
///
/// `moraleImpact` is already expressed in turn-scaled morale points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProtestState {
    /// Protest intensity, used when the protest is resolved.
    pub intensity: f64,
    /// Morale points lost when the protest is attached.
    pub morale_impact: f64,
    /// Turn the protest began.
    pub start_turn: u64,
}

// ---------------------------------------------------------------------------
// Strikes
// ---------------------------------------------------------------------------

/// A single demand raised by strikers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StrikeDemand {
    /// What is being demanded.
    pub demand_type: DemandType,
    /// How hard it is pressed.
    pub severity: DemandSeverity,
    /// Gold needed to satisfy it.
    #[ts(as = "String")]
    pub cost: Decimal,
}

/// An active labor strike in one territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StrikeState {
    /// Kind of strike.
    pub strike_type: StrikeType,
    /// Turn the strike spawned.
    pub start_turn: u64,
    /// Turns elapsed since spawn.
    pub duration: u32,
    /// Demands in the order they were raised.
    pub striker_demands: Vec<StrikeDemand>,
    /// True only for general strikes.
    pub production_halted: bool,
    /// Percentage of output lost when not fully halted, in `[0, 100)`.
    pub production_penalty: f64,
    /// Gold required to fully satisfy the demands. Escalates over time.
    #[ts(as = "String")]
    pub resolution_cost: Decimal,
    /// Negotiation progress in `[0, 100]`; 100 resolves the strike.
    pub negotiation_progress: f64,
    /// Set after a failed suppression attempt.
    pub force_suppression: bool,
}

// ---------------------------------------------------------------------------
// Collaborator inputs
// ---------------------------------------------------------------------------

/// Adjacency description for one territory, supplied by the map layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerritoryAdjacency {
    /// The territory being described.
    pub territory_id: TerritoryId,
    /// Territories sharing a border with it.
    pub adjacent_territories: Vec<TerritoryId>,
    /// Whether this is the nation's capital.
    #[serde(default)]
    pub is_capital: bool,
    /// Whether this territory lies on the national border.
    #[serde(default)]
    pub is_border: bool,
}

/// Strategic weight of a territory in national aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerritoryWeight {
    /// The weighted territory.
    pub territory_id: TerritoryId,
    /// Relative importance; territories not listed weigh 1.
    pub strategic_value: f64,
}
