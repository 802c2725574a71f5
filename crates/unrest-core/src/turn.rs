//! Turn cycle: the per-turn engine loop of the unrest simulation.
//!
//! Each turn runs through these phases, in order:
//!
//! 1. **Contagion** -- compute every territory's diffusion delta against a
//!    frozen snapshot of the previous turn's state, then apply them all.
//! 2. **Protests** -- attach newly reported protests (applying their morale
//!    penalty) and detach the ones that ended.
//! 3. **Events** -- protest resolutions and discrete morale events (battles,
//!    conquest, nuclear strikes, refugees, border instability).
//! 4. **Recovery** -- optional natural pull toward the morale target.
//! 5. **Strike turn** -- advance every strike and detach the ones that ended.
//! 6. **Spawning** -- roll for new strikes in territories without one.
//! 7. **Reconcile** -- copy current strike state into the ledger.
//! 8. **Summary** -- national morale, lost production, invariant check.
//!
//! Given the same seed and inputs, the cycle is deterministic.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use unrest_diffusion::{
    DiffusionConfig, calculate_border_instability_effect, calculate_conquest_morale_effect,
    calculate_defeat_morale_penalty, calculate_morale_spread_for_nation,
    calculate_morale_stability, calculate_nuclear_strike_morale_effect,
    calculate_protest_resolution_boost, calculate_refugee_morale_impact,
    calculate_victory_morale_boost, predict_morale_trend,
};
use unrest_ledger::{
    DEFAULT_INITIAL_MORALE, LedgerAnomaly, LedgerError, LedgerSnapshot, MoraleLedger,
    NationalMorale, calculate_morale_production_modifier, calculate_morale_recruitment_modifier,
};
use unrest_strikes::{
    NegotiationOutcome, PaymentOutcome, ResolvedStrike, StrikeError, StrikeManager,
    StrikeSnapshot, SuppressionOutcome, WaitOutcome, determine_strike_type,
};
use unrest_types::{
    DefeatTier, NuclearTier, ProtestOutcome, ProtestState, TerritoryAdjacency, TerritoryId,
    TerritoryWeight, VictoryTier,
};

use crate::clock::{ClockError, TurnClock};
use crate::config::{ConfigError, MoraleConfig, UnrestConfig};
use crate::rng::build_rng;

/// Distance used for territories not connected to an event's origin.
const UNREACHABLE: u32 = u32::MAX;

/// Errors that can occur during turn execution.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A ledger operation failed.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// A strike operation failed.
    #[error("strike error: {source}")]
    Strike {
        /// The underlying strike error.
        #[from]
        source: StrikeError,
    },

    /// The ledger broke one of its invariants.
    #[error("{anomaly}")]
    Anomaly {
        /// What was found.
        anomaly: LedgerAnomaly,
    },

    /// The ledger's strike record disagrees with the strike manager.
    #[error("strike record drift for territory {territory}")]
    StrikeDrift {
        /// The territory whose records disagree.
        territory: TerritoryId,
    },

    /// A save state could not be encoded or decoded.
    #[error("save state serialization failed: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Economic and political traits of a territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryProfile {
    /// Production value per turn.
    pub production: f64,
    /// Whether this is the capital.
    pub is_capital: bool,
    /// Whether it lies on the national border.
    pub is_border: bool,
    /// Whether heavy industry dominates.
    pub is_industrial: bool,
    /// Whether it is a transport hub.
    pub has_transportation: bool,
}

/// A discrete event that moves morale this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoraleEvent {
    /// A battle was won. Every territory is lifted, less with distance.
    Victory {
        /// How large the victory was.
        tier: VictoryTier,
        /// Territory where the battle took place.
        battle: TerritoryId,
    },
    /// A battle was lost. Every territory suffers, less with distance.
    Defeat {
        /// How bad the defeat was.
        tier: DefeatTier,
        /// Territory where the battle took place.
        battle: TerritoryId,
    },
    /// A territory is under occupation; its morale is reset from the
    /// campaign baseline by the occupation offset.
    Conquest {
        /// The occupied territory.
        territory: TerritoryId,
        /// Turns since it was taken.
        turns_occupied: u32,
        /// How harsh the occupier is, in `[0, 100]`.
        occupier_harshness: f64,
    },
    /// A nuclear weapon detonated.
    NuclearStrike {
        /// Weapon yield tier.
        tier: NuclearTier,
        /// Territory hit.
        target: TerritoryId,
    },
    /// Refugees arrived; one morale point lost per hundred, up to ten.
    RefugeeInflux {
        /// Host territory.
        territory: TerritoryId,
        /// Number of refugees.
        refugees: u32,
    },
    /// Refugees arrived into a population whose opinion of them is known.
    RefugeeSentiment {
        /// Host territory.
        territory: TerritoryId,
        /// Number of refugees.
        refugees: u32,
        /// Host population.
        population: u32,
        /// Public opinion of refugees, in `[0, 100]`.
        public_opinion: f64,
    },
    /// Neighboring nations are in turmoil; border territories suffer.
    BorderInstability {
        /// Morale of each neighboring nation.
        neighboring_nation_morale: Vec<f64>,
    },
}

/// Everything the outside world reports for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnInputs {
    /// Protests that broke out, attached with their morale penalty.
    #[serde(default)]
    pub protests_started: Vec<(TerritoryId, ProtestState)>,
    /// Protests that ended, and how.
    #[serde(default)]
    pub protests_resolved: Vec<(TerritoryId, ProtestOutcome)>,
    /// Discrete morale events.
    #[serde(default)]
    pub events: Vec<MoraleEvent>,
}

/// Summary of a single turn's execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// The turn that was executed.
    pub turn: u64,
    /// National morale at the end of the turn.
    pub national: NationalMorale,
    /// Contagion delta computed for each territory.
    pub contagion: BTreeMap<TerritoryId, f64>,
    /// Territory morale changes caused by events and protest resolutions.
    pub event_effects: usize,
    /// Territories where a strike broke out.
    pub strikes_started: Vec<TerritoryId>,
    /// Strikes that ended on their own.
    pub strikes_ended: Vec<ResolvedStrike>,
    /// Strikes still running.
    pub active_strikes: usize,
    /// Production lost to strikes this turn.
    pub production_lost: f64,
    /// Territories below the critical morale threshold.
    pub critical_territories: Vec<TerritoryId>,
    /// Territories flagged unstable.
    pub unstable_territories: Vec<TerritoryId>,
}

/// Stability and forecast for one territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryOutlook {
    /// The territory described.
    pub territory_id: TerritoryId,
    /// Current morale.
    pub morale: f64,
    /// Mean recent change, if enough history exists.
    pub trend: Option<f64>,
    /// Composite stability score in `[0, 100]`.
    pub stability: f64,
    /// Forecast morale, starting with the current value.
    pub forecast: Vec<f64>,
    /// Production multiplier at current morale.
    pub production_modifier: f64,
    /// Recruitment multiplier at current morale.
    pub recruitment_modifier: f64,
}

/// Persisted form of a whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    /// Turn the save was taken at.
    pub turn: u64,
    /// Morale ledger contents.
    pub ledger: LedgerSnapshot,
    /// Active strikes.
    pub strikes: StrikeSnapshot,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Owner of all simulation state; runs turns and player strike actions.
#[derive(Debug)]
pub struct TurnRunner {
    clock: TurnClock,
    ledger: MoraleLedger,
    strikes: StrikeManager,
    adjacencies: Vec<TerritoryAdjacency>,
    neighbors: BTreeMap<TerritoryId, Vec<TerritoryId>>,
    weights: Vec<TerritoryWeight>,
    profiles: BTreeMap<TerritoryId, TerritoryProfile>,
    productions: BTreeMap<TerritoryId, f64>,
    diffusion: DiffusionConfig,
    morale: MoraleConfig,
    rng: StdRng,
}

impl TurnRunner {
    /// Build a runner from configuration, with the random source it names.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Config`] if the configuration fails validation.
    pub fn from_config(config: &UnrestConfig) -> Result<Self, TurnError> {
        Self::with_rng(config, build_rng(config.simulation.seed))
    }

    /// Build a runner from configuration with an explicit random source.
    ///
    /// Every configured territory is seeded at turn 0 according to its
    /// origin.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Config`] if the configuration fails validation.
    pub fn with_rng(config: &UnrestConfig, rng: StdRng) -> Result<Self, TurnError> {
        config.validate()?;

        let mut ledger = MoraleLedger::new();
        ledger.initialize_nation(
            config.territories.iter().map(|t| (t.id.clone(), t.origin)),
            0,
        );

        let adjacencies = config.adjacencies();
        let neighbors = adjacencies
            .iter()
            .map(|a| (a.territory_id.clone(), a.adjacent_territories.clone()))
            .collect();

        let profiles = config
            .territories
            .iter()
            .map(|t| {
                (
                    t.id.clone(),
                    TerritoryProfile {
                        production: t.production,
                        is_capital: t.is_capital,
                        is_border: t.is_border,
                        is_industrial: t.is_industrial,
                        has_transportation: t.has_transportation,
                    },
                )
            })
            .collect();
        let productions = config
            .territories
            .iter()
            .map(|t| (t.id.clone(), t.production))
            .collect();

        info!(
            territories = config.territories.len(),
            seeded = config.simulation.seed.is_some(),
            "Simulation initialized"
        );

        Ok(Self {
            clock: TurnClock::new(),
            ledger,
            strikes: StrikeManager::new(config.strikes.clone()),
            adjacencies,
            neighbors,
            weights: config.weights(),
            profiles,
            productions,
            diffusion: config.diffusion.clone(),
            morale: config.morale.clone(),
            rng,
        })
    }

    /// The last completed turn.
    pub const fn turn(&self) -> u64 {
        self.clock.turn()
    }

    /// The morale ledger.
    pub const fn ledger(&self) -> &MoraleLedger {
        &self.ledger
    }

    /// The strike manager.
    pub const fn strikes(&self) -> &StrikeManager {
        &self.strikes
    }

    /// Traits of every territory in the scenario.
    pub const fn profiles(&self) -> &BTreeMap<TerritoryId, TerritoryProfile> {
        &self.profiles
    }

    /// Execute one complete turn.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Clock`] on turn overflow, and
    /// [`TurnError::Anomaly`] or [`TurnError::StrikeDrift`] if the state
    /// fails verification at the end of the turn.
    pub fn run_turn(&mut self, inputs: &TurnInputs) -> Result<TurnSummary, TurnError> {
        let turn = self.clock.advance()?;
        self.ledger.set_turn(turn);
        self.strikes.set_turn(turn);
        debug!(turn, events = inputs.events.len(), "Turn started");

        // --- Phase 1: Contagion ---
        let contagion = self.phase_contagion();

        // --- Phase 2: Protests ---
        let ended_protests = self.phase_protests(inputs);

        // --- Phase 3: Events ---
        let mut event_effects = 0_usize;
        for (id, outcome, intensity) in ended_protests {
            let delta = calculate_protest_resolution_boost(outcome, intensity);
            if self.apply_delta(&id, delta, "protest_resolved") {
                event_effects = event_effects.saturating_add(1);
            }
        }
        for event in &inputs.events {
            event_effects = event_effects.saturating_add(self.apply_event(event));
        }

        // --- Phase 4: Recovery ---
        self.phase_recovery();

        // --- Phase 5: Strike turn ---
        let strikes_ended = self.strikes.process_turn();
        for resolved in &strikes_ended {
            self.ledger.remove_strike(&resolved.territory_id);
        }

        // --- Phase 6: Spawning ---
        let strikes_started = self.phase_spawning()?;

        // --- Phase 7: Reconcile ---
        self.reconcile_strikes();

        // --- Phase 8: Summary ---
        verify_state(&self.ledger, &self.strikes)?;

        let national = self.ledger.calculate_national_morale(&self.weights);
        let production_lost = self.strikes.total_production_penalty(&self.productions);
        let critical_territories = self.ledger.get_critical_territories(self.morale.critical_threshold);
        let unstable_territories: Vec<TerritoryId> = self
            .ledger
            .records()
            .filter(|r| self.ledger.is_unstable(&r.territory_id))
            .map(|r| r.territory_id.clone())
            .collect();

        info!(
            turn,
            national_morale = national.average,
            volatility = national.volatility,
            active_strikes = self.strikes.len(),
            strikes_started = strikes_started.len(),
            strikes_ended = strikes_ended.len(),
            production_lost,
            "Turn complete"
        );

        Ok(TurnSummary {
            turn,
            national,
            contagion,
            event_effects,
            strikes_started,
            strikes_ended,
            active_strikes: self.strikes.len(),
            production_lost,
            critical_territories,
            unstable_territories,
        })
    }

    /// Phase 1: contagion against the previous turn's state.
    fn phase_contagion(&mut self) -> BTreeMap<TerritoryId, f64> {
        let deltas = calculate_morale_spread_for_nation(
            self.ledger.records(),
            &self.adjacencies,
            &self.diffusion,
        );
        for (id, delta) in &deltas {
            if delta.abs() > f64::EPSILON {
                self.ledger.update_morale(id, *delta, Some("contagion"));
            }
        }
        deltas
    }

    /// Phase 2: attach new protests, detach ended ones.
    ///
    /// Returns each ended protest with its outcome and intensity.
    fn phase_protests(&mut self, inputs: &TurnInputs) -> Vec<(TerritoryId, ProtestOutcome, f64)> {
        for (id, protest) in &inputs.protests_started {
            if self.ledger.apply_protest_effects(id, protest.clone()).is_none() {
                warn!(territory = %id, "Protest reported for unknown territory");
            }
        }

        inputs
            .protests_resolved
            .iter()
            .filter_map(|(id, outcome)| {
                let protest = self.ledger.remove_protest(id);
                if protest.is_none() {
                    debug!(territory = %id, "No protest to resolve");
                }
                protest.map(|p| (id.clone(), *outcome, p.intensity))
            })
            .collect()
    }

    /// Phase 4: natural pull toward the morale target.
    fn phase_recovery(&mut self) {
        let rate = self.morale.natural_recovery_rate;
        if rate <= 0.0 {
            return;
        }
        let ids: Vec<TerritoryId> = self.profiles.keys().cloned().collect();
        for id in &ids {
            self.ledger.apply_natural_change(id, self.morale.natural_target, rate);
        }
    }

    /// Phase 6: roll for strikes where none is running.
    fn phase_spawning(&mut self) -> Result<Vec<TerritoryId>, TurnError> {
        let mut started = Vec::new();
        for (id, profile) in &self.profiles {
            let Some(record) = self.ledger.get(id) else {
                continue;
            };
            let morale = record.morale;
            let spawns = self.strikes.should_spawn_strike(
                id,
                morale,
                profile.production,
                record.has_protest(),
                &mut self.rng,
            );
            if !spawns {
                continue;
            }

            let strike_type = determine_strike_type(
                profile.is_industrial,
                profile.has_transportation,
                profile.is_capital,
            );
            let strike =
                self.strikes
                    .spawn_strike(id, strike_type, morale, profile.production, &mut self.rng)?;
            info!(
                territory = %id,
                strike_type = %strike_type,
                morale,
                resolution_cost = %strike.resolution_cost,
                "Strike broke out"
            );
            started.push(id.clone());
        }
        Ok(started)
    }

    /// Phase 7: copy strike state into the ledger and drop stale copies.
    fn reconcile_strikes(&mut self) {
        for (id, strike) in self.strikes.strikes() {
            self.ledger.apply_strike_effects(id, strike.clone());
        }
        for id in self.ledger.get_territories_with_strikes() {
            if !self.strikes.has_strike(&id) {
                self.ledger.remove_strike(&id);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Apply a whole-point morale delta. Returns whether anything changed.
    fn apply_delta(&mut self, id: &TerritoryId, delta: i32, reason: &str) -> bool {
        if delta == 0 {
            return false;
        }
        self.ledger
            .update_morale(id, f64::from(delta), Some(reason))
            .is_some()
    }

    /// Apply one event. Returns the number of territories it changed.
    fn apply_event(&mut self, event: &MoraleEvent) -> usize {
        let ids: Vec<TerritoryId> = self.profiles.keys().cloned().collect();
        let mut changed = 0_usize;
        let mut count = |applied: bool| {
            if applied {
                changed = changed.saturating_add(1);
            }
        };

        match event {
            MoraleEvent::Victory { tier, battle } => {
                let distances = self.hop_distances(battle);
                for id in &ids {
                    let distance = distances.get(id).copied().unwrap_or(UNREACHABLE);
                    let delta = calculate_victory_morale_boost(*tier, self.is_capital(id), distance);
                    count(self.apply_delta(id, delta, "victory"));
                }
            }
            MoraleEvent::Defeat { tier, battle } => {
                let distances = self.hop_distances(battle);
                for id in &ids {
                    let distance = distances.get(id).copied().unwrap_or(UNREACHABLE);
                    let delta = calculate_defeat_morale_penalty(*tier, self.is_capital(id), distance);
                    count(self.apply_delta(id, delta, "defeat"));
                }
            }
            MoraleEvent::Conquest {
                territory,
                turns_occupied,
                occupier_harshness,
            } => {
                let offset = calculate_conquest_morale_effect(*turns_occupied, *occupier_harshness);
                if let Some(current) = self.ledger.morale(territory) {
                    let target = DEFAULT_INITIAL_MORALE + f64::from(offset);
                    self.ledger
                        .update_morale(territory, target - current, Some("conquest"));
                    count(true);
                }
            }
            MoraleEvent::NuclearStrike { tier, target } => {
                let distances = self.hop_distances(target);
                for id in &ids {
                    let distance = distances.get(id).copied().unwrap_or(UNREACHABLE);
                    let delta =
                        calculate_nuclear_strike_morale_effect(*tier, id == target, distance);
                    count(self.apply_delta(id, delta, "nuclear_strike"));
                }
            }
            MoraleEvent::RefugeeInflux {
                territory,
                refugees,
            } => {
                count(self.ledger.apply_refugee_influx(territory, *refugees).is_some());
            }
            MoraleEvent::RefugeeSentiment {
                territory,
                refugees,
                population,
                public_opinion,
            } => {
                let delta = calculate_refugee_morale_impact(*refugees, *population, *public_opinion);
                count(self.apply_delta(territory, delta, "refugee_sentiment"));
            }
            MoraleEvent::BorderInstability {
                neighboring_nation_morale,
            } => {
                let borders: Vec<TerritoryId> = ids
                    .iter()
                    .filter(|id| self.profiles.get(*id).is_some_and(|p| p.is_border))
                    .cloned()
                    .collect();
                let unstable = borders
                    .iter()
                    .filter(|id| self.ledger.is_unstable(id))
                    .count();
                let delta = calculate_border_instability_effect(unstable, neighboring_nation_morale);
                for id in &borders {
                    count(self.apply_delta(id, delta, "border_instability"));
                }
            }
        }

        debug!(?event, changed, "Applied morale event");
        changed
    }

    fn is_capital(&self, id: &TerritoryId) -> bool {
        self.profiles.get(id).is_some_and(|p| p.is_capital)
    }

    /// Hop distance from `origin` to every territory reachable from it.
    fn hop_distances(&self, origin: &TerritoryId) -> BTreeMap<TerritoryId, u32> {
        let mut distances = BTreeMap::new();
        if !self.neighbors.contains_key(origin) {
            return distances;
        }

        let mut queue = VecDeque::new();
        distances.insert(origin.clone(), 0_u32);
        queue.push_back((origin.clone(), 0_u32));

        while let Some((current, distance)) = queue.pop_front() {
            let next = distance.saturating_add(1);
            for neighbor in self.neighbors.get(&current).into_iter().flatten() {
                if !distances.contains_key(neighbor) {
                    distances.insert(neighbor.clone(), next);
                    queue.push_back((neighbor.clone(), next));
                }
            }
        }

        distances
    }

    // -----------------------------------------------------------------------
    // Player strike actions
    // -----------------------------------------------------------------------

    /// Offer gold to a territory's strikers.
    pub fn negotiate(&mut self, id: &TerritoryId, gold_offered: Decimal) -> Option<NegotiationOutcome> {
        let outcome = self.strikes.negotiate(id, gold_offered)?;
        self.sync_strike(id);
        Some(outcome)
    }

    /// Send in force. The morale penalty is applied to the territory; the
    /// approval penalty and casualties are returned for the caller.
    pub fn suppress(&mut self, id: &TerritoryId, force_level: u8) -> Option<SuppressionOutcome> {
        let outcome = self.strikes.suppress_strike(id, force_level, &mut self.rng)?;
        self.ledger
            .update_morale(id, -outcome.morale_penalty, Some("strike_suppression"));
        self.sync_strike(id);
        Some(outcome)
    }

    /// Pay the strikers off. The morale boost is applied to the territory.
    pub fn pay_demands(&mut self, id: &TerritoryId) -> Option<PaymentOutcome> {
        let outcome = self.strikes.pay_demands(id)?;
        self.ledger
            .update_morale(id, outcome.morale_boost, Some("strike_settled"));
        self.sync_strike(id);
        Some(outcome)
    }

    /// Leave a strike alone this turn.
    pub fn wait_out(&mut self, id: &TerritoryId) -> Option<WaitOutcome> {
        let outcome = self.strikes.wait_out(id, &mut self.rng)?;
        self.sync_strike(id);
        Some(outcome)
    }

    /// Mirror one territory's strike state into the ledger.
    fn sync_strike(&mut self, id: &TerritoryId) {
        match self.strikes.get_strike(id) {
            Some(strike) => {
                self.ledger.apply_strike_effects(id, strike.clone());
            }
            None => {
                self.ledger.remove_strike(id);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Stability score and a `turns`-long forecast for one territory.
    pub fn territory_outlook(&self, id: &TerritoryId, turns: u32) -> Option<TerritoryOutlook> {
        let record = self.ledger.get(id)?;

        let neighbor_morale: Vec<f64> = self
            .adjacencies
            .iter()
            .find(|a| a.territory_id == *id)
            .map(|a| {
                a.adjacent_territories
                    .iter()
                    .filter_map(|n| self.ledger.morale(n))
                    .collect()
            })
            .unwrap_or_default();
        let adjacent_average = if neighbor_morale.is_empty() {
            record.morale
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = neighbor_morale.len() as f64;
            neighbor_morale.iter().sum::<f64>() / n
        };

        Some(TerritoryOutlook {
            territory_id: id.clone(),
            morale: record.morale,
            trend: self.ledger.get_morale_trend(id),
            stability: calculate_morale_stability(
                record.morale,
                &record.historical_morale,
                record.has_protest(),
                record.has_strike(),
            ),
            forecast: predict_morale_trend(
                record.morale,
                &record.historical_morale,
                adjacent_average,
                &self.diffusion,
                turns,
            ),
            production_modifier: calculate_morale_production_modifier(record.morale),
            recruitment_modifier: calculate_morale_recruitment_modifier(record.morale),
        })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Capture the turn, ledger and strikes.
    pub fn export_state(&self) -> SaveState {
        SaveState {
            turn: self.clock.turn(),
            ledger: self.ledger.export_state(),
            strikes: self.strikes.export_state(),
        }
    }

    /// Replace all state with a save.
    ///
    /// Both halves are validated before anything is replaced. The random
    /// source is not part of the save and carries on from where it was.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Ledger`] or [`TurnError::Strike`] for an
    /// invalid half and [`TurnError::StrikeDrift`] if the halves disagree.
    pub fn import_state(&mut self, save: SaveState) -> Result<(), TurnError> {
        let mut strikes = StrikeManager::new(self.strikes.config().clone());
        strikes.import_state(save.strikes, save.turn)?;
        let mut ledger = MoraleLedger::new();
        ledger.import_state(save.ledger, save.turn)?;
        verify_state(&ledger, &strikes)?;

        self.strikes = strikes;
        self.ledger = ledger;
        self.clock = TurnClock::from_turn(save.turn);
        info!(turn = save.turn, "Simulation state restored");
        Ok(())
    }

    /// Encode the save state as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Serialization`] if encoding fails.
    pub fn save_json(&self) -> Result<String, TurnError> {
        Ok(serde_json::to_string(&self.export_state())?)
    }

    /// Restore from JSON produced by [`save_json`](Self::save_json).
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Serialization`] for malformed JSON and the
    /// errors of [`import_state`](Self::import_state) otherwise.
    pub fn load_json(&mut self, json: &str) -> Result<(), TurnError> {
        let save: SaveState = serde_json::from_str(json)?;
        self.import_state(save)
    }
}

/// Check ledger invariants and that the ledger mirrors every strike.
fn verify_state(ledger: &MoraleLedger, strikes: &StrikeManager) -> Result<(), TurnError> {
    if let Some(anomaly) = ledger.anomaly() {
        warn!(%anomaly, "Ledger verification failed");
        return Err(TurnError::Anomaly { anomaly });
    }

    for id in ledger.get_territories_with_strikes() {
        let mirrored = ledger.get(&id).and_then(|r| r.strikes.as_ref());
        if mirrored != strikes.get_strike(&id) {
            warn!(territory = %id, "Strike record drift");
            return Err(TurnError::StrikeDrift { territory: id });
        }
    }
    for id in strikes.active_territories() {
        if ledger.get(&id).is_some_and(|r| !r.has_strike()) {
            warn!(territory = %id, "Strike missing from ledger");
            return Err(TurnError::StrikeDrift { territory: id });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use unrest_types::{DemandSeverity, DemandType, StrikeDemand, StrikeType};

    const LINE: &str = "
territories:
  - id: a
    adjacent: [b]
    is_capital: true
    production: 600
  - id: b
    adjacent: [a, c]
    is_border: true
    is_industrial: true
    production: 400
  - id: c
    adjacent: [b]
    is_border: true
    origin: conquered
    production: 200
";

    fn runner() -> TurnRunner {
        let config = UnrestConfig::parse(LINE).unwrap();
        TurnRunner::with_rng(&config, build_rng(Some(42))).unwrap()
    }

    fn id(name: &str) -> TerritoryId {
        TerritoryId::from(name)
    }

    fn wage(cost: Decimal) -> Vec<StrikeDemand> {
        vec![StrikeDemand {
            demand_type: DemandType::Wages,
            severity: DemandSeverity::Minor,
            cost,
        }]
    }

    #[test]
    fn nation_is_seeded_by_origin() {
        let runner = runner();
        assert_eq!(runner.ledger().morale(&id("a")), Some(60.0));
        assert_eq!(runner.ledger().morale(&id("c")), Some(20.0));
        assert_eq!(runner.turn(), 0);
    }

    #[test]
    fn hop_distances_follow_the_graph() {
        let runner = runner();
        let distances = runner.hop_distances(&id("a"));
        assert_eq!(distances.get(&id("a")).copied(), Some(0));
        assert_eq!(distances.get(&id("b")).copied(), Some(1));
        assert_eq!(distances.get(&id("c")).copied(), Some(2));
        assert!(runner.hop_distances(&id("ghost")).is_empty());
    }

    #[test]
    fn contagion_reads_pre_turn_snapshot() {
        let mut runner = runner();
        let summary = runner.run_turn(&TurnInputs::default()).unwrap();

        // b sees a=60 and c=20: avg 40, diff -20, * 0.15 = -3.
        assert_eq!(summary.contagion.get(&id("b")).copied(), Some(-3.0));
        // c sees b=60: diff 40 * 0.15 = 6 -> bounded 5.
        assert_eq!(summary.contagion.get(&id("c")).copied(), Some(5.0));
        assert_eq!(summary.turn, 1);
        assert_eq!(runner.ledger().morale(&id("c")), Some(25.0));
    }

    #[test]
    fn border_listed_on_one_side_spreads_both_ways() {
        let config = UnrestConfig::parse(
            "
territories:
  - id: capital
    adjacent: [north]
  - id: north
    origin: conquered
",
        )
        .unwrap();
        let mut runner = TurnRunner::with_rng(&config, build_rng(Some(42))).unwrap();
        let summary = runner.run_turn(&TurnInputs::default()).unwrap();

        // 40 points apart: 6 either way, bounded to 5.
        assert_eq!(summary.contagion.get(&id("capital")).copied(), Some(-5.0));
        assert_eq!(summary.contagion.get(&id("north")).copied(), Some(5.0));
        assert_eq!(runner.ledger().morale(&id("north")), Some(25.0));

        let outlook = runner.territory_outlook(&id("north"), 1).unwrap();
        assert!(outlook.forecast.get(1).is_some_and(|v| *v > 25.0));
    }

    #[test]
    fn new_protest_is_invisible_to_same_turn_contagion() {
        let config = UnrestConfig::parse(
            "
territories:
  - id: a
    adjacent: [b]
  - id: b
",
        )
        .unwrap();
        let mut runner = TurnRunner::with_rng(&config, build_rng(Some(42))).unwrap();
        let inputs = TurnInputs {
            protests_started: vec![(
                id("a"),
                ProtestState {
                    intensity: 8.0,
                    morale_impact: 40.0,
                    start_turn: 1,
                },
            )],
            ..TurnInputs::default()
        };
        let summary = runner.run_turn(&inputs).unwrap();

        // Both sat at 60 when the turn began.
        assert_eq!(summary.contagion.get(&id("b")).copied(), Some(0.0));
        assert_eq!(runner.ledger().morale(&id("b")), Some(60.0));
        assert_eq!(runner.ledger().morale(&id("a")), Some(20.0));

        // The next turn sees the protest's effect.
        let summary = runner.run_turn(&TurnInputs::default()).unwrap();
        assert_eq!(summary.contagion.get(&id("b")).copied(), Some(-5.0));
    }

    #[test]
    fn victory_decays_across_the_map() {
        let mut runner = runner();
        let inputs = TurnInputs {
            events: vec![MoraleEvent::Victory {
                tier: VictoryTier::Decisive,
                battle: id("c"),
            }],
            ..TurnInputs::default()
        };
        let summary = runner.run_turn(&inputs);
        assert!(summary.is_ok_and(|s| s.event_effects == 3));
        // Capital: full +10 on top of contagion 0 (a sees b=60).
        let capital = runner.ledger().get(&id("a")).unwrap();
        assert_eq!(capital.last_change_reason.as_deref(), Some("victory"));
        assert_eq!(runner.ledger().morale(&id("a")), Some(70.0));
    }

    #[test]
    fn conquest_resets_to_occupation_offset() {
        let mut runner = runner();
        let inputs = TurnInputs {
            events: vec![MoraleEvent::Conquest {
                territory: id("a"),
                turns_occupied: 5,
                occupier_harshness: 0.0,
            }],
            ..TurnInputs::default()
        };
        assert!(runner.run_turn(&inputs).is_ok());
        // 60 - 40 + 10 = 30.
        assert_eq!(runner.ledger().morale(&id("a")), Some(30.0));
    }

    #[test]
    fn protests_attach_then_resolve() {
        let mut runner = runner();
        let protest = ProtestState {
            intensity: 4.0,
            morale_impact: 3.0,
            start_turn: 1,
        };
        let start = TurnInputs {
            protests_started: vec![(id("a"), protest)],
            ..TurnInputs::default()
        };
        assert!(runner.run_turn(&start).is_ok());
        assert!(runner.ledger().get(&id("a")).is_some_and(|r| r.has_protest()));

        let end = TurnInputs {
            protests_resolved: vec![(id("a"), ProtestOutcome::DemandsMet)],
            ..TurnInputs::default()
        };
        let summary = runner.run_turn(&end);
        assert!(summary.is_ok_and(|s| s.event_effects == 1));
        assert!(runner.ledger().get(&id("a")).is_some_and(|r| !r.has_protest()));
    }

    #[test]
    fn player_actions_keep_ledger_in_sync() {
        let mut runner = runner();
        let mill = id("b");
        assert!(
            runner
                .strikes
                .create_strike(&mill, StrikeType::IndustrialStrike, wage(dec!(200)))
                .is_ok()
        );
        runner.sync_strike(&mill);
        assert!(verify_state(&runner.ledger, &runner.strikes).is_ok());

        let partial = runner.negotiate(&mill, dec!(50));
        assert!(partial.is_some_and(|o| !o.resolved));
        assert!(
            runner
                .ledger()
                .get(&mill)
                .and_then(|r| r.strikes.as_ref())
                .is_some_and(|s| (s.negotiation_progress - 25.0).abs() < 1e-9)
        );

        let paid = runner.pay_demands(&mill);
        assert!(paid.is_some_and(|p| p.cost == dec!(150) && p.total_cost == dec!(200)));
        assert!(runner.ledger().get(&mill).is_some_and(|r| !r.has_strike()));
        assert_eq!(runner.ledger().morale(&mill), Some(70.0));
    }

    #[test]
    fn suppression_applies_morale_penalty() {
        let mut runner = runner();
        let mill = id("b");
        assert!(
            runner
                .strikes
                .create_strike(&mill, StrikeType::IndustrialStrike, wage(dec!(200)))
                .is_ok()
        );
        runner.sync_strike(&mill);

        let outcome = runner.suppress(&mill, 5);
        assert!(outcome.is_some_and(|o| (o.morale_penalty - 15.0).abs() < f64::EPSILON));
        assert_eq!(runner.ledger().morale(&mill), Some(45.0));
        assert!(verify_state(&runner.ledger, &runner.strikes).is_ok());
        assert!(runner.suppress(&id("ghost"), 5).is_none());
    }

    #[test]
    fn drift_is_detected() {
        let mut runner = runner();
        let mill = id("b");
        assert!(
            runner
                .strikes
                .create_strike(&mill, StrikeType::IndustrialStrike, wage(dec!(200)))
                .is_ok()
        );
        let result = verify_state(&runner.ledger, &runner.strikes);
        assert!(matches!(result, Err(TurnError::StrikeDrift { .. })));
    }

    #[test]
    fn outlook_reports_stability_and_forecast() {
        let runner = runner();
        let outlook = runner.territory_outlook(&id("a"), 3);
        assert!(outlook.as_ref().is_some_and(|o| o.forecast.len() == 4));
        assert!(outlook.as_ref().is_some_and(|o| (0.0..=100.0).contains(&o.stability)));
        assert!(outlook.is_some_and(|o| o.production_modifier > 1.0));
        assert!(runner.territory_outlook(&id("ghost"), 3).is_none());
    }

    #[test]
    fn save_round_trips_through_json() {
        let mut runner = runner();
        for _ in 0..3 {
            assert!(runner.run_turn(&TurnInputs::default()).is_ok());
        }
        let json = runner.save_json().unwrap();

        let config = UnrestConfig::parse(LINE).unwrap();
        let mut restored = TurnRunner::with_rng(&config, build_rng(Some(1))).unwrap();
        assert!(restored.load_json(&json).is_ok());
        assert_eq!(restored.turn(), 3);
        assert_eq!(restored.export_state(), runner.export_state());

        assert!(restored.load_json("{not json").is_err());
        assert_eq!(restored.turn(), 3);
    }
}
