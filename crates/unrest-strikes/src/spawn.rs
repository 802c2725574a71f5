//! Strike spawning: whether a strike breaks out, what kind, and what the
//! strikers ask for.

use rand::Rng;
use rust_decimal::Decimal;

use unrest_types::{DemandSeverity, DemandType, StrikeDemand, StrikeType};

use crate::config::StrikeConfig;
use crate::gold;

/// Share of production value demanded as wages.
const WAGE_SHARE: f64 = 0.30;
/// Upper bound of the random extra added to wage demands, as a share of
/// production value.
const WAGE_NOISE_SHARE: f64 = 0.10;
/// Share of production value demanded as reform by public servants.
const REFORM_SHARE: f64 = 0.20;
/// Share of production value demanded as resources in a general strike.
const RESOURCE_SHARE: f64 = 0.15;
/// Morale below which strikers add a political peace demand.
const PEACE_DEMAND_MORALE: f64 = 25.0;
/// Morale below which general strikers also demand resources.
const RESOURCE_DEMAND_MORALE: f64 = 30.0;
/// Morale below which wage demands are critical.
const CRITICAL_WAGE_MORALE: f64 = 20.0;
/// Morale below which wage demands are major.
const MAJOR_WAGE_MORALE: f64 = 30.0;

/// Production value as a usable non-negative float.
fn sanitize_production(production_value: f64) -> f64 {
    if production_value.is_finite() {
        production_value.max(0.0)
    } else {
        0.0
    }
}

/// Probability in `[0, max_spawn_chance]` that a strike spawns this turn.
///
/// Zero at or above the morale threshold. Below it, the base chance is
/// scaled by how far below the threshold morale sits, by the protest
/// multiplier when a protest is active, and by the economic bias
/// `production_value / production_reference` (capped).
pub fn strike_spawn_chance(
    config: &StrikeConfig,
    morale: f64,
    production_value: f64,
    has_protest: bool,
) -> f64 {
    if !morale.is_finite() || morale >= config.morale_threshold || config.morale_threshold <= 0.0 {
        return 0.0;
    }

    let deficit = ((config.morale_threshold - morale) / config.morale_threshold).clamp(0.0, 1.0);
    let mut chance = deficit * config.base_spawn_chance;

    if has_protest {
        chance *= config.protest_multiplier;
    }

    let bias = if config.production_reference > 0.0 {
        (sanitize_production(production_value) / config.production_reference)
            .min(config.max_production_bias)
    } else {
        config.max_production_bias
    };
    chance *= bias;

    if chance.is_finite() {
        chance.clamp(0.0, config.max_spawn_chance.max(0.0))
    } else {
        0.0
    }
}

/// Roll whether a strike spawns.
///
/// Returns `false` without drawing from `rng` when morale is at or above
/// the threshold.
pub fn should_spawn_strike(
    config: &StrikeConfig,
    morale: f64,
    production_value: f64,
    has_protest: bool,
    rng: &mut impl Rng,
) -> bool {
    let chance = strike_spawn_chance(config, morale, production_value, has_protest);
    if chance <= 0.0 {
        return false;
    }
    rng.random::<f64>() < chance
}

/// Pick the strike type for a territory.
///
/// Priority: capital, then transportation, then industrial, else general.
pub const fn determine_strike_type(
    is_industrial: bool,
    has_transportation: bool,
    is_capital: bool,
) -> StrikeType {
    if is_capital {
        StrikeType::PublicSectorStrike
    } else if has_transportation {
        StrikeType::TransportationStrike
    } else if is_industrial {
        StrikeType::IndustrialStrike
    } else {
        StrikeType::GeneralStrike
    }
}

/// Wage demand severity for a morale level.
fn wage_severity(morale: f64) -> DemandSeverity {
    if morale < CRITICAL_WAGE_MORALE {
        DemandSeverity::Critical
    } else if morale < MAJOR_WAGE_MORALE {
        DemandSeverity::Major
    } else {
        DemandSeverity::Minor
    }
}

/// Build the strikers' demands.
///
/// A wage demand is always first. Desperate territories add a zero-cost
/// peace demand, public servants add reform, and general strikers at low
/// morale add resources.
pub fn generate_demands(
    strike_type: StrikeType,
    morale: f64,
    production_value: f64,
    rng: &mut impl Rng,
) -> Vec<StrikeDemand> {
    let production = sanitize_production(production_value);
    let mut demands = Vec::with_capacity(4);

    let noise = rng.random_range(0.0..WAGE_NOISE_SHARE);
    demands.push(StrikeDemand {
        demand_type: DemandType::Wages,
        severity: wage_severity(morale),
        cost: gold::from_f64(production * (WAGE_SHARE + noise)),
    });

    if morale < PEACE_DEMAND_MORALE {
        demands.push(StrikeDemand {
            demand_type: DemandType::Peace,
            severity: DemandSeverity::Major,
            cost: Decimal::ZERO,
        });
    }

    if strike_type == StrikeType::PublicSectorStrike {
        demands.push(StrikeDemand {
            demand_type: DemandType::Reform,
            severity: DemandSeverity::Major,
            cost: gold::from_f64(production * REFORM_SHARE),
        });
    }

    if strike_type == StrikeType::GeneralStrike && morale < RESOURCE_DEMAND_MORALE {
        demands.push(StrikeDemand {
            demand_type: DemandType::Resources,
            severity: DemandSeverity::Critical,
            cost: gold::from_f64(production * RESOURCE_SHARE),
        });
    }

    demands
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal_macros::dec;

    #[test]
    fn no_spawn_at_or_above_threshold() {
        let config = StrikeConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            assert!(!should_spawn_strike(&config, 50.0, 400.0, false, &mut rng));
            assert!(!should_spawn_strike(&config, 35.0, 10_000.0, true, &mut rng));
        }
    }

    #[test]
    fn spawn_chance_scales_and_caps() {
        let config = StrikeConfig::default();
        // Deficit 0.5, base 0.4, bias 1.0.
        let chance = strike_spawn_chance(&config, 17.5, 500.0, false);
        assert!((chance - 0.2).abs() < 1e-9);

        let with_protest = strike_spawn_chance(&config, 17.5, 500.0, true);
        assert!((with_protest - 0.3).abs() < 1e-9);

        // 1.0 * 0.4 * 1.5 * 1.5 = 0.9, capped.
        let capped = strike_spawn_chance(&config, 0.0, 5_000.0, true);
        assert!((capped - 0.6).abs() < 1e-9);

        assert!(strike_spawn_chance(&config, 10.0, 0.0, true).abs() < f64::EPSILON);
    }

    #[test]
    fn spawn_rolls_follow_chance() {
        let config = StrikeConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let spawned = (0..1_000)
            .filter(|_| should_spawn_strike(&config, 0.0, 5_000.0, true, &mut rng))
            .count();
        // Expected around 600.
        assert!((450..750).contains(&spawned));
    }

    #[test]
    fn strike_type_priority() {
        assert_eq!(determine_strike_type(true, true, true), StrikeType::PublicSectorStrike);
        assert_eq!(determine_strike_type(true, true, false), StrikeType::TransportationStrike);
        assert_eq!(determine_strike_type(true, false, false), StrikeType::IndustrialStrike);
        assert_eq!(determine_strike_type(false, false, false), StrikeType::GeneralStrike);
    }

    #[test]
    fn wage_demand_always_present() {
        let mut rng = SmallRng::seed_from_u64(42);
        let demands = generate_demands(StrikeType::IndustrialStrike, 32.0, 1_000.0, &mut rng);
        assert_eq!(demands.len(), 1);
        let wage = demands.first();
        assert!(wage.is_some_and(|d| d.demand_type == DemandType::Wages));
        assert!(wage.is_some_and(|d| d.severity == DemandSeverity::Minor));
        assert!(wage.is_some_and(|d| d.cost >= dec!(300) && d.cost <= dec!(400)));
    }

    #[test]
    fn desperate_general_strike_demands_everything_but_reform() {
        let mut rng = SmallRng::seed_from_u64(7);
        let demands = generate_demands(StrikeType::GeneralStrike, 15.0, 1_000.0, &mut rng);
        let kinds: Vec<DemandType> = demands.iter().map(|d| d.demand_type).collect();
        assert_eq!(kinds, vec![DemandType::Wages, DemandType::Peace, DemandType::Resources]);
        assert!(demands.first().is_some_and(|d| d.severity == DemandSeverity::Critical));
        assert!(demands.get(1).is_some_and(|d| d.cost == Decimal::ZERO));
        assert!(demands.get(2).is_some_and(|d| d.cost == dec!(150)));
    }

    #[test]
    fn public_sector_adds_reform() {
        let mut rng = SmallRng::seed_from_u64(7);
        let demands = generate_demands(StrikeType::PublicSectorStrike, 28.0, 500.0, &mut rng);
        let kinds: Vec<DemandType> = demands.iter().map(|d| d.demand_type).collect();
        assert_eq!(kinds, vec![DemandType::Wages, DemandType::Reform]);
        assert!(demands.first().is_some_and(|d| d.severity == DemandSeverity::Major));
        assert!(demands.get(1).is_some_and(|d| d.cost == dec!(100)));
    }
}
