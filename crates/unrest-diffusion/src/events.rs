//! Discrete-event morale calculators.
//!
//! Each calculator turns one event descriptor into a signed whole-point
//! morale delta for one territory. They share no state and can be tested
//! in isolation.
//!
//! | Event | Range |
//! |-------|-------|
//! | Border instability | `[-5, 0]` |
//! | Victory | `[0, +10]` |
//! | Defeat | `[-23, 0]` |
//! | Conquest | `[-55, -20]` |
//! | Protest resolution | `±1.5 × intensity` |
//! | Nuclear strike | `[-50, 0]` |
//! | Refugees | `[-15, +5]` |

use unrest_types::{
    CONQUEST_MORALE_OFFSET, DefeatTier, NuclearTier, ProtestOutcome, VictoryTier,
};

/// Round a fractional delta to whole morale points.
fn to_delta(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    // `as` saturates; all calculator outputs are small.
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round() as i32;
    rounded
}

/// Linear decay with distance, never below `floor`.
fn distance_decay(distance: u32, per_step: f64, floor: f64) -> f64 {
    per_step
        .mul_add(-f64::from(distance), 1.0)
        .max(floor)
}

// ---------------------------------------------------------------------------
// Borders
// ---------------------------------------------------------------------------

/// Penalty per unstable border territory of one's own.
const UNSTABLE_BORDER_PENALTY: f64 = -0.5;
/// Largest border instability penalty.
const MAX_BORDER_PENALTY: f64 = -5.0;

/// Penalty from instability along the nation's borders.
///
/// Each unstable own border territory costs half a point. Each neighboring
/// nation costs a point if its morale is below 25, half a point if below 40.
/// The total is capped at -5.
pub fn calculate_border_instability_effect(
    unstable_border_territories: usize,
    neighboring_nation_morale: &[f64],
) -> i32 {
    #[allow(clippy::cast_precision_loss)]
    let own = UNSTABLE_BORDER_PENALTY * unstable_border_territories as f64;

    let foreign: f64 = neighboring_nation_morale
        .iter()
        .map(|&m| {
            if m < 25.0 {
                -1.0
            } else if m < 40.0 {
                -0.5
            } else {
                0.0
            }
        })
        .sum();

    to_delta((own + foreign).max(MAX_BORDER_PENALTY))
}

// ---------------------------------------------------------------------------
// Battles
// ---------------------------------------------------------------------------

/// Morale gained from a victory.
///
/// The capital feels the full effect. Other territories lose 10% per step
/// of distance from the battle, down to 30%.
pub fn calculate_victory_morale_boost(
    tier: VictoryTier,
    is_capital: bool,
    distance_from_battle: u32,
) -> i32 {
    let base = match tier {
        VictoryTier::Minor => 3.0,
        VictoryTier::Major => 6.0,
        VictoryTier::Decisive => 10.0,
    };

    let factor = if is_capital {
        1.0
    } else {
        distance_decay(distance_from_battle, 0.1, 0.3)
    };

    to_delta(base * factor)
}

/// Morale lost to a defeat.
///
/// The capital feels it half again as hard. Other territories lose 10% per
/// step of distance from the battle, down to 20%.
pub fn calculate_defeat_morale_penalty(
    tier: DefeatTier,
    is_capital: bool,
    distance_from_battle: u32,
) -> i32 {
    let base = match tier {
        DefeatTier::Minor => -4.0,
        DefeatTier::Major => -8.0,
        DefeatTier::Catastrophic => -15.0,
    };

    let factor = if is_capital {
        1.5
    } else {
        distance_decay(distance_from_battle, 0.1, 0.2)
    };

    to_delta(base * factor)
}

// ---------------------------------------------------------------------------
// Occupation
// ---------------------------------------------------------------------------

/// Morale recovered per turn of continued occupation.
const CONQUEST_RECOVERY_PER_TURN: f64 = 2.0;
/// Most morale occupation can win back.
const MAX_CONQUEST_RECOVERY: f64 = 20.0;
/// Penalty at maximum occupier harshness.
const MAX_HARSHNESS_PENALTY: f64 = 15.0;

/// Morale offset of conquered territory relative to the campaign baseline.
///
/// Starts at the conquest offset of -40, recovers two points per turn of
/// occupation up to +20, and loses up to 15 points to a harsh occupier
/// (`occupier_harshness` in `[0, 100]`).
pub fn calculate_conquest_morale_effect(turns_occupied: u32, occupier_harshness: f64) -> i32 {
    let recovery =
        (CONQUEST_RECOVERY_PER_TURN * f64::from(turns_occupied)).min(MAX_CONQUEST_RECOVERY);
    let harshness = if occupier_harshness.is_finite() {
        occupier_harshness.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let oppression = harshness / 100.0 * MAX_HARSHNESS_PENALTY;

    to_delta(CONQUEST_MORALE_OFFSET + recovery - oppression)
}

// ---------------------------------------------------------------------------
// Protests
// ---------------------------------------------------------------------------

/// Morale effect of a protest ending, scaled by its intensity.
pub fn calculate_protest_resolution_boost(outcome: ProtestOutcome, intensity: f64) -> i32 {
    let multiplier = match outcome {
        ProtestOutcome::DemandsMet => 1.5,
        ProtestOutcome::Negotiated => 0.5,
        ProtestOutcome::Suppressed => -1.2,
    };
    to_delta(multiplier * intensity)
}

// ---------------------------------------------------------------------------
// Nuclear strikes
// ---------------------------------------------------------------------------

/// Morale lost to a nuclear detonation.
///
/// A direct hit takes the full tier penalty. Fallout elsewhere decays by
/// 15% per step of distance, down to 10%.
pub fn calculate_nuclear_strike_morale_effect(
    tier: NuclearTier,
    direct_hit: bool,
    distance: u32,
) -> i32 {
    let base = match tier {
        NuclearTier::Tactical => -15.0,
        NuclearTier::Strategic => -30.0,
        NuclearTier::Massive => -50.0,
    };

    let factor = if direct_hit {
        1.0
    } else {
        distance_decay(distance, 0.15, 0.1)
    };

    to_delta(base * factor)
}

// ---------------------------------------------------------------------------
// Refugees
// ---------------------------------------------------------------------------

/// Refugee share of the population below which a welcoming public can
/// take heart.
const WELCOME_RATIO: f64 = 0.02;
/// Public opinion above which small influxes help.
const WELCOME_OPINION: f64 = 70.0;

/// Morale effect of hosting refugees.
///
/// The penalty is the refugee share of the population in percent, scaled
/// by public opinion (`[0, 100]`): hostile opinion amplifies it up to 1.5x,
/// friendly opinion softens it to 0.5x. A small influx into a welcoming
/// territory is mildly positive instead. Clamped to `[-15, +5]`.
pub fn calculate_refugee_morale_impact(refugees: u32, population: u32, public_opinion: f64) -> i32 {
    if population == 0 || refugees == 0 {
        return 0;
    }

    let ratio = f64::from(refugees) / f64::from(population);
    let opinion = if public_opinion.is_finite() {
        public_opinion.clamp(0.0, 100.0)
    } else {
        50.0
    };

    let effect = if ratio < WELCOME_RATIO && opinion > WELCOME_OPINION {
        (opinion - WELCOME_OPINION) / 10.0
    } else {
        let hostility = 1.5 - opinion / 100.0;
        -(ratio * 100.0) * hostility
    };

    to_delta(effect.clamp(-15.0, 5.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_penalty_is_capped() {
        assert_eq!(calculate_border_instability_effect(0, &[]), 0);
        // -0.5 * 2 + -1 + -0.5 = -2.5 -> rounds away from zero
        assert_eq!(calculate_border_instability_effect(2, &[20.0, 35.0, 80.0]), -3);
        assert_eq!(calculate_border_instability_effect(30, &[10.0, 10.0]), -5);
    }

    #[test]
    fn victory_decays_with_distance() {
        assert_eq!(calculate_victory_morale_boost(VictoryTier::Decisive, true, 9), 10);
        assert_eq!(calculate_victory_morale_boost(VictoryTier::Decisive, false, 0), 10);
        assert_eq!(calculate_victory_morale_boost(VictoryTier::Decisive, false, 5), 5);
        // Floor of 30%.
        assert_eq!(calculate_victory_morale_boost(VictoryTier::Decisive, false, 40), 3);
    }

    #[test]
    fn defeat_hits_capital_harder() {
        assert_eq!(calculate_defeat_morale_penalty(DefeatTier::Major, true, 0), -12);
        assert_eq!(calculate_defeat_morale_penalty(DefeatTier::Major, false, 0), -8);
        // Floor of 20%.
        assert_eq!(
            calculate_defeat_morale_penalty(DefeatTier::Catastrophic, false, 100),
            -3
        );
    }

    #[test]
    fn conquest_starts_at_offset_and_recovers() {
        assert_eq!(calculate_conquest_morale_effect(0, 0.0), -40);
        assert_eq!(calculate_conquest_morale_effect(5, 0.0), -30);
        assert_eq!(calculate_conquest_morale_effect(50, 0.0), -20);
        assert_eq!(calculate_conquest_morale_effect(50, 100.0), -35);
        assert_eq!(calculate_conquest_morale_effect(0, 500.0), -55);
    }

    #[test]
    fn protest_resolution_multipliers() {
        assert_eq!(calculate_protest_resolution_boost(ProtestOutcome::DemandsMet, 10.0), 15);
        assert_eq!(calculate_protest_resolution_boost(ProtestOutcome::Negotiated, 10.0), 5);
        assert_eq!(calculate_protest_resolution_boost(ProtestOutcome::Suppressed, 10.0), -12);
    }

    #[test]
    fn nuclear_fallout_decays_to_floor() {
        assert_eq!(
            calculate_nuclear_strike_morale_effect(NuclearTier::Strategic, true, 3),
            -30
        );
        // 1 - 0.15 * 2 = 0.7
        assert_eq!(
            calculate_nuclear_strike_morale_effect(NuclearTier::Strategic, false, 2),
            -21
        );
        assert_eq!(
            calculate_nuclear_strike_morale_effect(NuclearTier::Massive, false, 50),
            -5
        );
    }

    #[test]
    fn refugee_impact_depends_on_ratio_and_opinion() {
        assert_eq!(calculate_refugee_morale_impact(100, 0, 50.0), 0);
        // 5% at neutral opinion.
        assert_eq!(calculate_refugee_morale_impact(500, 10_000, 50.0), -5);
        // Hostile opinion amplifies.
        assert_eq!(calculate_refugee_morale_impact(500, 10_000, 0.0), -8);
        // Small influx, welcoming public.
        assert_eq!(calculate_refugee_morale_impact(100, 10_000, 90.0), 2);
        // Huge influx is clamped.
        assert_eq!(calculate_refugee_morale_impact(9_000, 10_000, 0.0), -15);
    }
}
