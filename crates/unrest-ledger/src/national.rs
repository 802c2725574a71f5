//! National morale aggregation.
//!
//! Collapses the per-territory ledger into one nation-level reading,
//! weighted by each territory's strategic value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use unrest_types::{RegionalMorale, TerritoryId, TerritoryWeight};

/// Morale below which a territory counts as a critical region.
pub const CRITICAL_MORALE_THRESHOLD: f64 = 30.0;

/// Reading reported when there is nothing to aggregate.
const NEUTRAL_MORALE: f64 = 50.0;

/// Nation-level morale summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalMorale {
    /// Strategic-value weighted mean morale.
    pub average: f64,
    /// Lowest territory morale.
    pub lowest: f64,
    /// Highest territory morale.
    pub highest: f64,
    /// Population standard deviation of territory morale around `average`.
    pub volatility: f64,
    /// Territories with morale below [`CRITICAL_MORALE_THRESHOLD`].
    pub critical_regions: Vec<TerritoryId>,
}

impl NationalMorale {
    /// The reading for a nation with no tracked territories.
    pub const fn neutral() -> Self {
        Self {
            average: NEUTRAL_MORALE,
            lowest: NEUTRAL_MORALE,
            highest: NEUTRAL_MORALE,
            volatility: 0.0,
            critical_regions: Vec::new(),
        }
    }
}

impl Default for NationalMorale {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Aggregate `records` into a [`NationalMorale`].
///
/// Territories missing from `weights` weigh 1. Non-positive or non-finite
/// weights are ignored; if nothing carries weight the plain mean is used.
/// An empty ledger yields [`NationalMorale::neutral`].
pub fn aggregate(
    records: &BTreeMap<TerritoryId, RegionalMorale>,
    weights: &[TerritoryWeight],
) -> NationalMorale {
    if records.is_empty() {
        return NationalMorale::neutral();
    }

    let weight_of: BTreeMap<&TerritoryId, f64> = weights
        .iter()
        .map(|w| (&w.territory_id, w.strategic_value))
        .collect();

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut plain_sum = 0.0;
    let mut lowest = f64::INFINITY;
    let mut highest = f64::NEG_INFINITY;
    let mut critical_regions = Vec::new();

    for (id, record) in records {
        let weight = weight_of.get(id).copied().unwrap_or(1.0);
        if weight.is_finite() && weight > 0.0 {
            weighted_sum += record.morale * weight;
            total_weight += weight;
        }
        plain_sum += record.morale;
        lowest = lowest.min(record.morale);
        highest = highest.max(record.morale);
        if record.morale < CRITICAL_MORALE_THRESHOLD {
            critical_regions.push(id.clone());
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let count = records.len() as f64;

    let average = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        plain_sum / count
    };

    let variance = records
        .values()
        .map(|r| (r.morale - average).powi(2))
        .sum::<f64>()
        / count;

    NationalMorale {
        average,
        lowest,
        highest,
        volatility: variance.sqrt(),
        critical_regions,
    }
}
