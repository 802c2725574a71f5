//! The morale ledger: keyed per-territory morale records.
//!
//! The [`MoraleLedger`] holds one [`RegionalMorale`] per territory and is
//! the only component that writes morale. Every write goes through the same
//! clamp and history window, and stamps the ledger's turn counter.
//!
//! # Design
//!
//! - **Clamped**: morale never leaves `[0, 100]`; the realized (post-clamp)
//!   delta is what gets recorded.
//! - **Windowed**: each record keeps its last five morale values.
//! - **Lenient**: unknown territory ids are ignored, never an error.
//! - **Ordered**: storage is a `BTreeMap`, so iteration and snapshots are
//!   deterministic.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use unrest_types::{
    CONQUEST_MORALE_OFFSET, MORALE_MAX, MORALE_MIN, ProtestState, RegionalMorale, StrikeState,
    TerritoryId, TerritoryWeight, clamp_morale,
};

use crate::invariants::{self, InvariantResult};
use crate::national::{self, NationalMorale};
use crate::{LedgerAnomaly, LedgerError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Seed morale for a territory held since campaign start.
pub const DEFAULT_INITIAL_MORALE: f64 = 60.0;

/// Default target for [`MoraleLedger::apply_natural_change`].
pub const DEFAULT_NATURAL_TARGET: f64 = 60.0;

/// Default pull strength for [`MoraleLedger::apply_natural_change`].
pub const DEFAULT_RECOVERY_RATE: f64 = 0.5;

/// Largest morale penalty a single refugee influx can cause.
const MAX_REFUGEE_PENALTY: f64 = 10.0;

/// Refugees per point of morale penalty.
const REFUGEES_PER_MORALE_POINT: f64 = 100.0;

/// Morale below which a territory counts toward instability.
const UNSTABLE_MORALE: f64 = 40.0;

/// Trend below which a territory counts toward instability.
const UNSTABLE_TREND: f64 = -2.0;

/// Number of instability factors that must hold at once.
const UNSTABLE_FACTOR_COUNT: usize = 2;

/// Number of history samples considered by [`MoraleLedger::get_morale_trend`].
const TREND_WINDOW: usize = 3;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Whether a territory was held at campaign start or taken by force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerritoryOrigin {
    /// Part of the nation from the start.
    #[default]
    Core,
    /// Taken from another nation.
    Conquered,
}

impl TerritoryOrigin {
    /// Seed morale for a territory of this origin.
    pub fn seed_morale(self) -> f64 {
        match self {
            Self::Core => DEFAULT_INITIAL_MORALE,
            Self::Conquered => DEFAULT_INITIAL_MORALE + CONQUEST_MORALE_OFFSET,
        }
    }
}

/// Full ledger state for save/load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Every tracked record, keyed by territory.
    pub territories: BTreeMap<TerritoryId, RegionalMorale>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Authoritative store of per-territory morale.
#[derive(Debug, Clone, Default)]
pub struct MoraleLedger {
    /// Records keyed by territory.
    territories: BTreeMap<TerritoryId, RegionalMorale>,
    /// Turn stamped onto every mutation.
    current_turn: u64,
}

impl MoraleLedger {
    /// Create an empty ledger at turn 0.
    pub const fn new() -> Self {
        Self {
            territories: BTreeMap::new(),
            current_turn: 0,
        }
    }

    /// Number of tracked territories.
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    /// Whether no territories are tracked.
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    /// The turn stamped onto mutations.
    pub const fn current_turn(&self) -> u64 {
        self.current_turn
    }

    /// Move the ledger to `turn`.
    pub const fn set_turn(&mut self, turn: u64) {
        self.current_turn = turn;
    }

    /// Look up a territory's record.
    pub fn get(&self, id: &TerritoryId) -> Option<&RegionalMorale> {
        self.territories.get(id)
    }

    /// Current morale of a territory.
    pub fn morale(&self, id: &TerritoryId) -> Option<f64> {
        self.territories.get(id).map(|r| r.morale)
    }

    /// Iterate over all records in territory order.
    pub fn records(&self) -> impl Iterator<Item = &RegionalMorale> {
        self.territories.values()
    }

    /// Borrow the underlying storage.
    pub const fn as_map(&self) -> &BTreeMap<TerritoryId, RegionalMorale> {
        &self.territories
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create (or overwrite) the record for `id`.
    ///
    /// `initial_morale` is clamped into range. Calling this again for a
    /// tracked territory replaces the record outright; nothing is merged.
    pub fn initialize_territory(
        &mut self,
        id: TerritoryId,
        initial_morale: f64,
        turn: u64,
    ) -> &RegionalMorale {
        let record = RegionalMorale::new(id.clone(), initial_morale, turn);
        debug!(territory = %id, morale = record.morale, turn, "Initialized territory morale");
        match self.territories.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(record);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(record),
        }
    }

    /// Seed every territory of a nation at campaign start.
    ///
    /// Core territory starts at [`DEFAULT_INITIAL_MORALE`]; conquered
    /// territory starts forty points lower (see [`CONQUEST_MORALE_OFFSET`]).
    pub fn initialize_nation(
        &mut self,
        territories: impl IntoIterator<Item = (TerritoryId, TerritoryOrigin)>,
        turn: u64,
    ) {
        for (id, origin) in territories {
            self.initialize_territory(id, origin.seed_morale(), turn);
        }
    }

    // -----------------------------------------------------------------------
    // Morale writes
    // -----------------------------------------------------------------------

    /// Shift a territory's morale by `delta`.
    ///
    /// The new value is clamped; the realized delta is recorded as
    /// `last_morale_change`, the value is appended to the history window,
    /// and `last_event_turn` is stamped with the ledger's turn. Returns
    /// `None` for an unknown territory.
    pub fn update_morale(
        &mut self,
        id: &TerritoryId,
        delta: f64,
        reason: Option<&str>,
    ) -> Option<&RegionalMorale> {
        let turn = self.current_turn;
        let record = self.territories.get_mut(id)?;
        let requested = if delta.is_finite() { delta } else { 0.0 };
        let target = record.morale + requested;
        write_morale(record, target, turn, reason);
        debug!(
            territory = %id,
            requested = delta,
            realized = record.last_morale_change,
            morale = record.morale,
            reason = reason.unwrap_or(""),
            "Applied morale change"
        );
        Some(record)
    }

    /// Set a territory's morale to an absolute value.
    ///
    /// Same clamp and audit trail as [`update_morale`](Self::update_morale).
    pub fn set_morale(&mut self, id: &TerritoryId, value: f64) -> Option<&RegionalMorale> {
        let turn = self.current_turn;
        let record = self.territories.get_mut(id)?;
        write_morale(record, value, turn, Some("set"));
        debug!(territory = %id, morale = record.morale, "Set morale");
        Some(record)
    }

    /// Pull morale toward `target_morale` by `recovery_rate` of the gap.
    pub fn apply_natural_change(
        &mut self,
        id: &TerritoryId,
        target_morale: f64,
        recovery_rate: f64,
    ) -> Option<&RegionalMorale> {
        let current = self.morale(id)?;
        let delta = (target_morale - current) * recovery_rate;
        self.update_morale(id, delta, Some("natural_change"))
    }

    // -----------------------------------------------------------------------
    // Unrest attachments
    // -----------------------------------------------------------------------

    /// Attach a protest and apply its `morale_impact` as a penalty.
    pub fn apply_protest_effects(
        &mut self,
        id: &TerritoryId,
        protest: ProtestState,
    ) -> Option<&RegionalMorale> {
        let impact = protest.morale_impact.abs();
        self.territories.get_mut(id)?.protests = Some(protest);
        self.update_morale(id, -impact, Some("protest"))
    }

    /// Detach the territory's protest, returning it.
    pub fn remove_protest(&mut self, id: &TerritoryId) -> Option<ProtestState> {
        self.territories.get_mut(id)?.protests.take()
    }

    /// Attach (or refresh) the territory's strike reference.
    ///
    /// Strikes cost production, not morale, so no penalty is applied here.
    pub fn apply_strike_effects(
        &mut self,
        id: &TerritoryId,
        strike: StrikeState,
    ) -> Option<&RegionalMorale> {
        let record = self.territories.get_mut(id)?;
        record.strikes = Some(strike);
        Some(record)
    }

    /// Detach the territory's strike reference, returning it.
    pub fn remove_strike(&mut self, id: &TerritoryId) -> Option<StrikeState> {
        self.territories.get_mut(id)?.strikes.take()
    }

    /// Record a refugee influx and apply its morale penalty.
    ///
    /// The penalty is one point per hundred refugees, capped at ten.
    pub fn apply_refugee_influx(
        &mut self,
        id: &TerritoryId,
        refugee_count: u32,
    ) -> Option<&RegionalMorale> {
        self.territories.get_mut(id)?.refugee_influx = refugee_count;
        let penalty = (f64::from(refugee_count) / REFUGEES_PER_MORALE_POINT).min(MAX_REFUGEE_PENALTY);
        self.update_morale(id, -penalty, Some("refugee_influx"))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Mean turn-over-turn change across the last three history samples.
    ///
    /// `Some(0.0)` when fewer than two samples exist.
    pub fn get_morale_trend(&self, id: &TerritoryId) -> Option<f64> {
        let history = &self.territories.get(id)?.historical_morale;
        let start = history.len().saturating_sub(TREND_WINDOW);
        let window = history.get(start..).unwrap_or_default();

        let deltas: Vec<f64> = window
            .windows(2)
            .filter_map(|pair| match pair {
                [prev, next] => Some(next - prev),
                _ => None,
            })
            .collect();

        if deltas.is_empty() {
            return Some(0.0);
        }

        #[allow(clippy::cast_precision_loss)]
        let count = deltas.len() as f64;
        Some(deltas.iter().sum::<f64>() / count)
    }

    /// Whether at least two of these hold at once: morale below 40, an
    /// active protest, an active strike, a trend below -2.
    ///
    /// `false` for an unknown territory.
    pub fn is_unstable(&self, id: &TerritoryId) -> bool {
        let Some(record) = self.territories.get(id) else {
            return false;
        };
        let trend = self.get_morale_trend(id).unwrap_or(0.0);

        let factors = [
            record.morale < UNSTABLE_MORALE,
            record.has_protest(),
            record.has_strike(),
            trend < UNSTABLE_TREND,
        ];
        factors.iter().filter(|&&f| f).count() >= UNSTABLE_FACTOR_COUNT
    }

    /// Weighted national morale across every tracked territory.
    pub fn calculate_national_morale(&self, weights: &[TerritoryWeight]) -> NationalMorale {
        national::aggregate(&self.territories, weights)
    }

    /// Territories with morale strictly below `threshold`.
    pub fn get_critical_territories(&self, threshold: f64) -> Vec<TerritoryId> {
        self.territories
            .values()
            .filter(|r| r.morale < threshold)
            .map(|r| r.territory_id.clone())
            .collect()
    }

    /// Territories with an active protest.
    pub fn get_territories_with_protests(&self) -> Vec<TerritoryId> {
        self.territories
            .values()
            .filter(|r| r.has_protest())
            .map(|r| r.territory_id.clone())
            .collect()
    }

    /// Territories with an active strike.
    pub fn get_territories_with_strikes(&self) -> Vec<TerritoryId> {
        self.territories
            .values()
            .filter(|r| r.has_strike())
            .map(|r| r.territory_id.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Integrity and persistence
    // -----------------------------------------------------------------------

    /// Check every record against the ledger invariants.
    pub fn verify_invariants(&self) -> InvariantResult {
        invariants::verify_invariants(self.current_turn, &self.territories)
    }

    /// Copy out the full ledger state.
    pub fn export_state(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            territories: self.territories.clone(),
        }
    }

    /// Replace the ledger contents with `state` and move to `turn`.
    ///
    /// Nothing is merged: territories absent from `state` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSnapshot`] if any record breaks an
    /// invariant; the ledger is left untouched in that case.
    pub fn import_state(&mut self, state: LedgerSnapshot, turn: u64) -> Result<(), LedgerError> {
        if let InvariantResult::Anomaly(anomaly) =
            invariants::verify_invariants(turn, &state.territories)
        {
            warn!(turn, violations = anomaly.violations.len(), "Rejected ledger snapshot");
            return Err(LedgerError::InvalidSnapshot { anomaly });
        }

        self.territories = state.territories;
        self.current_turn = turn;
        debug!(turn, territories = self.territories.len(), "Imported ledger state");
        Ok(())
    }

    /// Build an anomaly report for the current state, if any.
    pub fn anomaly(&self) -> Option<LedgerAnomaly> {
        match self.verify_invariants() {
            InvariantResult::Healthy => None,
            InvariantResult::Anomaly(anomaly) => Some(anomaly),
        }
    }
}

/// Clamp `value`, record the realized delta, push history and stamp the turn.
fn write_morale(record: &mut RegionalMorale, value: f64, turn: u64, reason: Option<&str>) {
    let previous = record.morale;
    let next = clamp_morale(value);
    debug_assert!((MORALE_MIN..=MORALE_MAX).contains(&next));

    record.morale = next;
    record.last_morale_change = next - previous;
    record.last_event_turn = turn;
    record.last_change_reason = reason.map(str::to_owned);
    record.push_history(next);
}
