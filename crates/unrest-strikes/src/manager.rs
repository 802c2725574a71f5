//! Per-territory strike lifecycle.
//!
//! The [`StrikeManager`] owns every active strike, keyed by territory. A
//! strike moves from creation through negotiation, escalation or failed
//! suppression, and is deleted once resolved. The manager never touches
//! morale: every player action returns the morale consequences for the
//! caller to apply.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use unrest_types::{StrikeDemand, StrikeState, StrikeType, TerritoryId};

use crate::config::StrikeConfig;
use crate::error::StrikeError;
use crate::gold;
use crate::production::calculate_total_strike_production_penalty;
use crate::spawn::{generate_demands, should_spawn_strike};

/// Negotiation progress at which a strike is resolved.
const PROGRESS_COMPLETE: f64 = 100.0;
/// Weakest and strongest allowed suppression force.
const MIN_FORCE: u8 = 1;
const MAX_FORCE: u8 = 10;
/// Success chance, in percent, per point of force.
const SUCCESS_PER_FORCE: f64 = 8.0;
/// Width of the random success bonus, in percent.
const SUCCESS_SPREAD: f64 = 20.0;
/// Morale lost per point of force, win or lose.
const MORALE_PENALTY_PER_FORCE: f64 = 3.0;
/// Government approval lost per point of force.
const APPROVAL_PENALTY_PER_FORCE: f64 = 4.0;
/// Guaranteed casualties per point of force.
const CASUALTIES_PER_FORCE: u32 = 2;
/// Exclusive upper bound of the random extra casualties.
const CASUALTY_SPREAD: u32 = 10;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a gold offer to strikers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    /// Whether the strike ended.
    pub resolved: bool,
    /// Progress after the offer, in `[0, 100]`.
    pub progress: f64,
    /// Gold still needed to settle; zero once resolved.
    pub remaining_cost: Decimal,
}

/// Result of a suppression attempt.
///
/// The penalties and casualties apply whether or not the attempt worked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionOutcome {
    /// Whether the strike was broken.
    pub success: bool,
    /// Morale points the territory should lose.
    pub morale_penalty: f64,
    /// Government approval points lost.
    pub approval_penalty: f64,
    /// Estimated casualties.
    pub casualties: u32,
}

/// Result of paying the strikers off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Gold charged: what negotiation had not already covered.
    pub cost: Decimal,
    /// Full price of the demands at settlement, before negotiation credit.
    pub total_cost: Decimal,
    /// Morale points the territory should gain.
    pub morale_boost: f64,
}

/// Result of waiting a strike out for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitOutcome {
    /// Whether the strikers escalated.
    pub escalated: bool,
    /// Resolution cost after the turn.
    pub resolution_cost: Decimal,
    /// Production penalty after the turn.
    pub production_penalty: f64,
}

/// Why a strike ended during turn processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionCause {
    /// Negotiation progress reached 100.
    Negotiated,
    /// The strike outlasted the auto-resolve limit and both sides gave up.
    Exhausted,
}

/// A strike ended by [`StrikeManager::process_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStrike {
    /// Territory that is no longer on strike.
    pub territory_id: TerritoryId,
    /// Kind of strike that ended.
    pub strike_type: StrikeType,
    /// Why it ended.
    pub cause: ResolutionCause,
    /// Turns it lasted.
    pub duration: u32,
}

/// Aggregate view over every active strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeStatistics {
    /// Number of active strikes.
    pub total_strikes: usize,
    /// Number of territories whose production is halted.
    pub halted_territories: usize,
    /// Active strikes per type.
    pub by_type: BTreeMap<StrikeType, usize>,
    /// Gold needed to settle every strike at once.
    pub total_resolution_cost: Decimal,
    /// Mean share of output lost, in percent; a halted territory counts 100.
    pub average_production_penalty: f64,
    /// Mean strike duration in turns.
    pub average_duration: f64,
    /// Strikes that survived a suppression attempt.
    pub hardened_by_force: usize,
}

/// Persisted form of the strike manager.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrikeSnapshot {
    /// Every active strike, keyed by territory.
    pub strikes: BTreeMap<TerritoryId, StrikeState>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Gold still owed on a strike given its negotiation progress.
fn remaining_cost(strike: &StrikeState) -> Decimal {
    let outstanding = (1.0 - strike.negotiation_progress / PROGRESS_COMPLETE).clamp(0.0, 1.0);
    if outstanding >= 1.0 {
        return strike.resolution_cost;
    }
    gold::from_f64(gold::to_f64(strike.resolution_cost) * outstanding)
}

/// Advance one strike by a turn, escalating its cost past the grace period.
fn advance(strike: &mut StrikeState, config: &StrikeConfig) {
    strike.duration = strike.duration.saturating_add(1);
    if strike.duration > config.escalation_grace_turns {
        strike.resolution_cost = gold::scale(strike.resolution_cost, config.escalation_factor);
    }
}

/// Why a snapshot entry is unusable, if it is.
fn snapshot_defect(strike: &StrikeState) -> Option<&'static str> {
    let progress = strike.negotiation_progress;
    let penalty = strike.production_penalty;
    if !progress.is_finite() || !(0.0..=PROGRESS_COMPLETE).contains(&progress) {
        return Some("negotiation progress outside [0, 100]");
    }
    if !penalty.is_finite() || !(0.0..=100.0).contains(&penalty) {
        return Some("production penalty outside [0, 100]");
    }
    if strike.resolution_cost < Decimal::ZERO {
        return Some("negative resolution cost");
    }
    if strike.production_halted != strike.strike_type.halts_production() {
        return Some("halt flag does not match strike type");
    }
    None
}

// ---------------------------------------------------------------------------
// StrikeManager
// ---------------------------------------------------------------------------

/// Owner of every active strike.
#[derive(Debug, Clone, Default)]
pub struct StrikeManager {
    config: StrikeConfig,
    strikes: BTreeMap<TerritoryId, StrikeState>,
    current_turn: u64,
}

impl StrikeManager {
    /// Create an empty manager.
    pub const fn new(config: StrikeConfig) -> Self {
        Self {
            config,
            strikes: BTreeMap::new(),
            current_turn: 0,
        }
    }

    /// The tuning parameters in use.
    pub const fn config(&self) -> &StrikeConfig {
        &self.config
    }

    /// Turn stamped on newly created strikes.
    pub const fn current_turn(&self) -> u64 {
        self.current_turn
    }

    /// Set the turn stamped on newly created strikes.
    pub const fn set_turn(&mut self, turn: u64) {
        self.current_turn = turn;
    }

    /// Number of active strikes.
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    /// Whether no strike is active.
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// The strike in a territory, if any.
    pub fn get_strike(&self, territory_id: &TerritoryId) -> Option<&StrikeState> {
        self.strikes.get(territory_id)
    }

    /// Whether a territory is on strike.
    pub fn has_strike(&self, territory_id: &TerritoryId) -> bool {
        self.strikes.contains_key(territory_id)
    }

    /// Territories currently on strike, in id order.
    pub fn active_territories(&self) -> Vec<TerritoryId> {
        self.strikes.keys().cloned().collect()
    }

    /// Every active strike, keyed by territory.
    pub const fn strikes(&self) -> &BTreeMap<TerritoryId, StrikeState> {
        &self.strikes
    }

    /// Gold still owed on a territory's strike.
    pub fn remaining_cost(&self, territory_id: &TerritoryId) -> Option<Decimal> {
        self.strikes.get(territory_id).map(remaining_cost)
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// Roll whether a strike spawns, using this manager's configuration.
    ///
    /// Always `false` for a territory that is already on strike.
    pub fn should_spawn_strike(
        &self,
        territory_id: &TerritoryId,
        morale: f64,
        production_value: f64,
        has_protest: bool,
        rng: &mut impl Rng,
    ) -> bool {
        if self.has_strike(territory_id) {
            return false;
        }
        should_spawn_strike(&self.config, morale, production_value, has_protest, rng)
    }

    /// Generate demands and open a strike in one step.
    ///
    /// # Errors
    ///
    /// Returns [`StrikeError::StrikeAlreadyActive`] if the territory is
    /// already on strike.
    pub fn spawn_strike(
        &mut self,
        territory_id: &TerritoryId,
        strike_type: StrikeType,
        morale: f64,
        production_value: f64,
        rng: &mut impl Rng,
    ) -> Result<&StrikeState, StrikeError> {
        if self.has_strike(territory_id) {
            warn!(territory = %territory_id, "Rejected spawn for territory already on strike");
            return Err(StrikeError::StrikeAlreadyActive(territory_id.clone()));
        }
        let demands = generate_demands(strike_type, morale, production_value, rng);
        self.create_strike(territory_id, strike_type, demands)
    }

    /// Open a strike with the given demands.
    ///
    /// The resolution cost is the sum of the demand costs. Only a general
    /// strike halts production; the others carry a fixed penalty.
    ///
    /// # Errors
    ///
    /// Returns [`StrikeError::StrikeAlreadyActive`] if the territory is
    /// already on strike and [`StrikeError::NoDemands`] if `demands` is
    /// empty. The existing strike is left untouched.
    pub fn create_strike(
        &mut self,
        territory_id: &TerritoryId,
        strike_type: StrikeType,
        demands: Vec<StrikeDemand>,
    ) -> Result<&StrikeState, StrikeError> {
        let slot = match self.strikes.entry(territory_id.clone()) {
            Entry::Occupied(_) => {
                warn!(territory = %territory_id, "Rejected second strike for territory");
                return Err(StrikeError::StrikeAlreadyActive(territory_id.clone()));
            }
            Entry::Vacant(slot) => slot,
        };
        if demands.is_empty() {
            return Err(StrikeError::NoDemands(territory_id.clone()));
        }

        let resolution_cost = demands
            .iter()
            .fold(Decimal::ZERO, |acc, d| acc.checked_add(d.cost).unwrap_or(acc));

        debug!(
            territory = %territory_id,
            strike_type = %strike_type,
            demands = demands.len(),
            %resolution_cost,
            "Strike created"
        );

        Ok(slot.insert(StrikeState {
            strike_type,
            start_turn: self.current_turn,
            duration: 0,
            striker_demands: demands,
            production_halted: strike_type.halts_production(),
            production_penalty: strike_type.base_production_penalty(),
            resolution_cost,
            negotiation_progress: 0.0,
            force_suppression: false,
        }))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Advance one strike by a turn.
    ///
    /// Duration grows by one. Past the grace period the resolution cost is
    /// multiplied by the escalation factor, so escalation compounds.
    pub fn update_strike(&mut self, territory_id: &TerritoryId) -> Option<&StrikeState> {
        let strike = self.strikes.get_mut(territory_id)?;
        advance(strike, &self.config);
        Some(strike)
    }

    /// Offer gold toward the strikers' demands.
    ///
    /// Progress grows by `gold_offered / resolution_cost * 100`. The strike
    /// is deleted once progress reaches 100 or the offer alone covers the
    /// remaining cost. A non-positive offer changes nothing.
    pub fn negotiate(
        &mut self,
        territory_id: &TerritoryId,
        gold_offered: Decimal,
    ) -> Option<NegotiationOutcome> {
        let strike = self.strikes.get_mut(territory_id)?;
        let remaining = remaining_cost(strike);

        if gold_offered <= Decimal::ZERO {
            return Some(NegotiationOutcome {
                resolved: false,
                progress: strike.negotiation_progress,
                remaining_cost: remaining,
            });
        }

        let gained = if strike.resolution_cost > Decimal::ZERO {
            gold::to_f64(gold_offered) / gold::to_f64(strike.resolution_cost) * PROGRESS_COMPLETE
        } else {
            PROGRESS_COMPLETE
        };
        let progress = (strike.negotiation_progress + gained).min(PROGRESS_COMPLETE);

        if gold_offered >= remaining || progress >= PROGRESS_COMPLETE {
            self.strikes.remove(territory_id);
            debug!(territory = %territory_id, %gold_offered, "Strike settled by negotiation");
            return Some(NegotiationOutcome {
                resolved: true,
                progress: PROGRESS_COMPLETE,
                remaining_cost: Decimal::ZERO,
            });
        }

        strike.negotiation_progress = progress;
        let remaining = remaining_cost(strike);
        debug!(territory = %territory_id, progress, %remaining, "Negotiation advanced");
        Some(NegotiationOutcome {
            resolved: false,
            progress,
            remaining_cost: remaining,
        })
    }

    /// Try to break a strike by force.
    ///
    /// `force_level` is clamped to `1..=10`. Success chance is
    /// `force * 8 + U(0, 20)` percent. A failed attempt hardens the
    /// strikers: the strike is flagged and its cost rises by half. The
    /// penalties are returned either way for the caller to apply.
    pub fn suppress_strike(
        &mut self,
        territory_id: &TerritoryId,
        force_level: u8,
        rng: &mut impl Rng,
    ) -> Option<SuppressionOutcome> {
        let strike = self.strikes.get_mut(territory_id)?;
        let force = force_level.clamp(MIN_FORCE, MAX_FORCE);
        let force_f = f64::from(force);

        let chance = SUCCESS_PER_FORCE.mul_add(force_f, rng.random_range(0.0..SUCCESS_SPREAD));
        let success = rng.random_range(0.0..100.0) < chance;
        let casualties = u32::from(force)
            .saturating_mul(CASUALTIES_PER_FORCE)
            .saturating_add(rng.random_range(0..CASUALTY_SPREAD));

        if success {
            self.strikes.remove(territory_id);
            debug!(territory = %territory_id, force, casualties, "Strike suppressed");
        } else {
            strike.force_suppression = true;
            strike.resolution_cost =
                gold::scale(strike.resolution_cost, self.config.failed_suppression_cost_factor);
            debug!(
                territory = %territory_id,
                force,
                casualties,
                resolution_cost = %strike.resolution_cost,
                "Suppression failed; demands hardened"
            );
        }

        Some(SuppressionOutcome {
            success,
            morale_penalty: MORALE_PENALTY_PER_FORCE * force_f,
            approval_penalty: APPROVAL_PENALTY_PER_FORCE * force_f,
            casualties,
        })
    }

    /// Meet every demand and end the strike.
    ///
    /// The charge is whatever negotiation has not already covered; the
    /// full price is reported alongside it. Peace bought after a failed
    /// crackdown earns a smaller morale boost.
    pub fn pay_demands(&mut self, territory_id: &TerritoryId) -> Option<PaymentOutcome> {
        let strike = self.strikes.remove(territory_id)?;
        let cost = remaining_cost(&strike);
        let total_cost = strike.resolution_cost;
        let morale_boost = if strike.force_suppression {
            self.config.payment_boost_after_force
        } else {
            self.config.payment_morale_boost
        };
        debug!(territory = %territory_id, %cost, %total_cost, morale_boost, "Strike demands paid");
        Some(PaymentOutcome {
            cost,
            total_cost,
            morale_boost,
        })
    }

    /// Do nothing about a strike this turn.
    ///
    /// The strikers may escalate with probability `duration * 5%`, capped
    /// at 50%. Escalation raises the cost by 15% and the production
    /// penalty by 10, capped at 90. A halted strike already loses all
    /// output, so only its cost rises.
    pub fn wait_out(&mut self, territory_id: &TerritoryId, rng: &mut impl Rng) -> Option<WaitOutcome> {
        let strike = self.strikes.get_mut(territory_id)?;
        let chance = (f64::from(strike.duration) * self.config.wait_escalation_chance_per_turn)
            .min(self.config.max_wait_escalation_chance);
        let escalated = rng.random::<f64>() < chance;

        if escalated {
            strike.resolution_cost = gold::scale(strike.resolution_cost, self.config.wait_cost_factor);
            let cap = self.config.max_wait_penalty;
            if !strike.production_halted && strike.production_penalty < cap {
                strike.production_penalty =
                    (strike.production_penalty + self.config.wait_penalty_increase).min(cap);
            }
            debug!(territory = %territory_id, "Strikers escalated while waited out");
        }

        Some(WaitOutcome {
            escalated,
            resolution_cost: strike.resolution_cost,
            production_penalty: strike.production_penalty,
        })
    }

    /// Advance every strike by one turn and end the ones that are over.
    ///
    /// A strike ends when its negotiation progress has reached 100 or its
    /// duration exceeds the auto-resolve limit. Ended strikes are deleted
    /// and returned in territory order.
    pub fn process_turn(&mut self) -> Vec<ResolvedStrike> {
        for strike in self.strikes.values_mut() {
            advance(strike, &self.config);
        }

        let ended: Vec<ResolvedStrike> = self
            .strikes
            .iter()
            .filter_map(|(id, strike)| {
                let cause = if strike.negotiation_progress >= PROGRESS_COMPLETE {
                    ResolutionCause::Negotiated
                } else if strike.duration > self.config.auto_resolve_turns {
                    ResolutionCause::Exhausted
                } else {
                    return None;
                };
                Some(ResolvedStrike {
                    territory_id: id.clone(),
                    strike_type: strike.strike_type,
                    cause,
                    duration: strike.duration,
                })
            })
            .collect();

        for resolved in &ended {
            self.strikes.remove(&resolved.territory_id);
            debug!(
                territory = %resolved.territory_id,
                cause = ?resolved.cause,
                duration = resolved.duration,
                "Strike ended"
            );
        }

        ended
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Aggregate counts, costs and penalties across every active strike.
    pub fn get_statistics(&self) -> StrikeStatistics {
        let mut by_type = BTreeMap::new();
        let mut total_resolution_cost = Decimal::ZERO;
        let mut penalty_sum = 0.0;
        let mut duration_sum = 0.0;
        let mut halted_territories: usize = 0;
        let mut hardened_by_force: usize = 0;

        for strike in self.strikes.values() {
            let count = by_type.entry(strike.strike_type).or_insert(0_usize);
            *count = count.saturating_add(1);
            total_resolution_cost = total_resolution_cost
                .checked_add(strike.resolution_cost)
                .unwrap_or(total_resolution_cost);
            if strike.production_halted {
                halted_territories = halted_territories.saturating_add(1);
                penalty_sum += 100.0;
            } else {
                penalty_sum += strike.production_penalty;
            }
            if strike.force_suppression {
                hardened_by_force = hardened_by_force.saturating_add(1);
            }
            duration_sum += f64::from(strike.duration);
        }

        let total_strikes = self.strikes.len();
        #[allow(clippy::cast_precision_loss)]
        let n = total_strikes as f64;
        let (average_production_penalty, average_duration) = if total_strikes == 0 {
            (0.0, 0.0)
        } else {
            (penalty_sum / n, duration_sum / n)
        };

        StrikeStatistics {
            total_strikes,
            halted_territories,
            by_type,
            total_resolution_cost,
            average_production_penalty,
            average_duration,
            hardened_by_force,
        }
    }

    /// Output lost to strikes, given each territory's production value.
    pub fn total_production_penalty(&self, territory_productions: &BTreeMap<TerritoryId, f64>) -> f64 {
        calculate_total_strike_production_penalty(&self.strikes, territory_productions)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Copy of every active strike for saving.
    pub fn export_state(&self) -> StrikeSnapshot {
        StrikeSnapshot {
            strikes: self.strikes.clone(),
        }
    }

    /// Replace every strike with a saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StrikeError::InvalidSnapshot`] for the first entry with an
    /// out-of-range field; the manager is left unchanged.
    pub fn import_state(&mut self, snapshot: StrikeSnapshot, turn: u64) -> Result<(), StrikeError> {
        for (territory, strike) in &snapshot.strikes {
            if let Some(reason) = snapshot_defect(strike) {
                warn!(territory = %territory, reason, "Rejected strike snapshot");
                return Err(StrikeError::InvalidSnapshot {
                    territory: territory.clone(),
                    reason: reason.to_owned(),
                });
            }
        }
        self.strikes = snapshot.strikes;
        self.current_turn = turn;
        debug!(strikes = self.strikes.len(), turn, "Strike state imported");
        Ok(())
    }
}
