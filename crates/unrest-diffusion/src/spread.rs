//! Neighbor contagion.
//!
//! A territory drifts toward the mean morale of its neighbors. The drift is
//! a fixed fraction of the differential, accelerated when the neighbors are
//! at an extreme, and bounded per turn so no topology (cycles included) can
//! make the system oscillate without limit.

use std::collections::BTreeMap;

use tracing::trace;

use unrest_types::{RegionalMorale, TerritoryAdjacency, TerritoryId};

use crate::config::DiffusionConfig;

/// Bound `value` to `[-limit, limit]` without panicking on odd limits.
pub(crate) fn bounded(value: f64, limit: f64) -> f64 {
    value.max(-limit).min(limit)
}

/// Contagion delta for a territory at `own` morale whose neighbors average
/// `neighbor_average`.
pub(crate) fn spread_toward(own: f64, neighbor_average: f64, config: &DiffusionConfig) -> f64 {
    let difference = neighbor_average - own;
    let mut spread = difference * config.diffusion_rate;

    if neighbor_average > config.high_morale_threshold
        || neighbor_average < config.low_morale_threshold
    {
        spread *= config.extreme_multiplier;
    }

    if !spread.is_finite() {
        return 0.0;
    }
    bounded(spread, config.change_limit())
}

/// Contagion delta for one territory given its neighbors' records.
///
/// Returns 0 when there are no neighbors. The result never exceeds
/// `config.max_change_per_turn` in magnitude.
pub fn calculate_morale_spread(
    territory: &RegionalMorale,
    adjacent: &[&RegionalMorale],
    config: &DiffusionConfig,
) -> f64 {
    if adjacent.is_empty() {
        return 0.0;
    }

    let total: f64 = adjacent.iter().map(|r| r.morale).sum();
    #[allow(clippy::cast_precision_loss)]
    let average = total / adjacent.len() as f64;

    spread_toward(territory.morale, average, config)
}

/// Contagion deltas for every territory in `adjacencies`.
///
/// A lookup map over `all_morale` is built once, before any delta is
/// computed, so every territory reads its neighbors' pre-turn values.
/// Territories without a morale record are skipped; neighbors without a
/// record are ignored.
pub fn calculate_morale_spread_for_nation<'a>(
    all_morale: impl IntoIterator<Item = &'a RegionalMorale>,
    adjacencies: &[TerritoryAdjacency],
    config: &DiffusionConfig,
) -> BTreeMap<TerritoryId, f64> {
    let snapshot: BTreeMap<&TerritoryId, &RegionalMorale> = all_morale
        .into_iter()
        .map(|r| (&r.territory_id, r))
        .collect();

    let mut deltas = BTreeMap::new();

    for adjacency in adjacencies {
        let Some(&territory) = snapshot.get(&adjacency.territory_id) else {
            continue;
        };

        let neighbors: Vec<&RegionalMorale> = adjacency
            .adjacent_territories
            .iter()
            .filter_map(|id| snapshot.get(id).copied())
            .collect();

        let delta = calculate_morale_spread(territory, &neighbors, config);
        trace!(
            territory = %adjacency.territory_id,
            neighbors = neighbors.len(),
            delta,
            "Computed contagion delta"
        );
        deltas.insert(adjacency.territory_id.clone(), delta);
    }

    deltas
}
