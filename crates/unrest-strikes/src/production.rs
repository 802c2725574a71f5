//! Output lost to strikes.

use std::collections::BTreeMap;

use unrest_types::{StrikeState, TerritoryId};

/// Total production lost across `strikes`.
///
/// A halted territory loses all of its production; any other striking
/// territory loses `production_penalty` percent of it. Territories with no
/// production entry, or a negative one, contribute nothing.
pub fn calculate_total_strike_production_penalty<'a>(
    strikes: impl IntoIterator<Item = (&'a TerritoryId, &'a StrikeState)>,
    territory_productions: &BTreeMap<TerritoryId, f64>,
) -> f64 {
    strikes
        .into_iter()
        .map(|(id, strike)| {
            let production = territory_productions
                .get(id)
                .copied()
                .filter(|p| p.is_finite())
                .unwrap_or(0.0)
                .max(0.0);
            if strike.production_halted {
                production
            } else {
                production * strike.production_penalty.clamp(0.0, 100.0) / 100.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use unrest_types::StrikeType;

    fn strike(strike_type: StrikeType) -> StrikeState {
        StrikeState {
            strike_type,
            start_turn: 0,
            duration: 0,
            striker_demands: Vec::new(),
            production_halted: strike_type.halts_production(),
            production_penalty: strike_type.base_production_penalty(),
            resolution_cost: Decimal::ZERO,
            negotiation_progress: 0.0,
            force_suppression: false,
        }
    }

    #[test]
    fn halted_loses_everything_others_proportionally() {
        let mut strikes = BTreeMap::new();
        strikes.insert(TerritoryId::from("city"), strike(StrikeType::GeneralStrike));
        strikes.insert(TerritoryId::from("port"), strike(StrikeType::TransportationStrike));
        strikes.insert(TerritoryId::from("ghost"), strike(StrikeType::IndustrialStrike));

        let mut productions = BTreeMap::new();
        productions.insert(TerritoryId::from("city"), 300.0);
        productions.insert(TerritoryId::from("port"), 200.0);
        productions.insert(TerritoryId::from("farm"), 1_000.0);

        let lost = calculate_total_strike_production_penalty(&strikes, &productions);
        assert!((lost - 400.0).abs() < 1e-9);
    }

    #[test]
    fn no_strikes_no_loss() {
        let strikes: BTreeMap<TerritoryId, StrikeState> = BTreeMap::new();
        let productions = BTreeMap::from([(TerritoryId::from("a"), 50.0)]);
        assert!(calculate_total_strike_production_penalty(&strikes, &productions).abs() < f64::EPSILON);
    }
}
