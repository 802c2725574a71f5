//! Stability scoring and morale forecasting.

use unrest_types::{MORALE_MAX, clamp_morale};

use crate::config::DiffusionConfig;
use crate::spread::{bounded, spread_toward};

/// Score every territory starts from.
const STABILITY_BASE: f64 = 50.0;
/// Points per unit of distance from the nearer extreme (0 or 100).
const MIDPOINT_REWARD: f64 = 0.4;
/// Points lost per unit of historical standard deviation.
const VOLATILITY_WEIGHT: f64 = 2.0;
/// Flat penalty for an active protest.
const PROTEST_PENALTY: f64 = 20.0;
/// Flat penalty for an active strike.
const STRIKE_PENALTY: f64 = 15.0;
/// Weight given to the last observed trend in forecasts.
const TREND_CONTINUATION: f64 = 0.3;

/// Population standard deviation of `values`; 0 for fewer than two.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Composite stability score in `[0, 100]`.
///
/// Starts at 50, gains up to 20 for sitting near the midpoint (0.4 per
/// point of distance from the nearer extreme), loses twice the standard
/// deviation of `history`, and takes flat hits for an active protest (-20)
/// or strike (-15).
pub fn calculate_morale_stability(
    morale: f64,
    history: &[f64],
    has_protest: bool,
    has_strike: bool,
) -> f64 {
    let morale = clamp_morale(morale);
    let distance_from_extreme = morale.min(MORALE_MAX - morale);

    let mut score = MIDPOINT_REWARD.mul_add(distance_from_extreme, STABILITY_BASE);
    score -= VOLATILITY_WEIGHT * std_dev(history);
    if has_protest {
        score -= PROTEST_PENALTY;
    }
    if has_strike {
        score -= STRIKE_PENALTY;
    }

    clamp_morale(score)
}

/// Forecast morale for `turns` turns ahead.
///
/// Each step blends the contagion pull toward `adjacent_average` with 30%
/// of the most recent observed change in `history`, bounded to
/// `config.max_change_per_turn` and then to `[0, 100]`. The returned
/// sequence starts with `current` and has `turns + 1` entries. This is a
/// display aid, not the authoritative simulation.
pub fn predict_morale_trend(
    current: f64,
    history: &[f64],
    adjacent_average: f64,
    config: &DiffusionConfig,
    turns: u32,
) -> Vec<f64> {
    let recent_trend = match history {
        [.., previous, last] => last - previous,
        _ => 0.0,
    };
    let recent_trend = if recent_trend.is_finite() { recent_trend } else { 0.0 };

    let mut value = clamp_morale(current);
    let mut forecast = Vec::with_capacity(usize::try_from(turns).unwrap_or(0).saturating_add(1));
    forecast.push(value);

    for _ in 0..turns {
        let pull = spread_toward(value, adjacent_average, config);
        let step = bounded(
            TREND_CONTINUATION.mul_add(recent_trend, pull),
            config.change_limit(),
        );
        value = clamp_morale(value + step);
        forecast.push(value);
    }

    forecast
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn calm_midpoint_scores_seventy() {
        assert!(approx(calculate_morale_stability(50.0, &[], false, false), 70.0));
        assert!(approx(
            calculate_morale_stability(50.0, &[50.0, 50.0, 50.0], false, false),
            70.0
        ));
    }

    #[test]
    fn extremes_and_unrest_lower_stability() {
        assert!(approx(calculate_morale_stability(100.0, &[], false, false), 50.0));
        assert!(approx(calculate_morale_stability(50.0, &[], true, true), 35.0));
        // std dev of [40, 60] is 10 -> -20
        assert!(approx(calculate_morale_stability(50.0, &[40.0, 60.0], false, false), 50.0));
    }

    #[test]
    fn stability_is_clamped() {
        let score = calculate_morale_stability(0.0, &[0.0, 100.0, 0.0, 100.0], true, true);
        assert!(approx(score, 0.0));
    }

    #[test]
    fn forecast_includes_start_and_converges() {
        let config = DiffusionConfig::default();
        let forecast = predict_morale_trend(40.0, &[40.0], 60.0, &config, 4);
        assert_eq!(forecast.len(), 5);
        assert_eq!(forecast.first().copied(), Some(40.0));
        // 20 * 0.15 = 3 on the first step.
        assert!(forecast.get(1).is_some_and(|v| approx(*v, 43.0)));
        assert!(forecast.windows(2).all(|w| matches!(w, [a, b] if b >= a)));
    }

    #[test]
    fn forecast_respects_bounds() {
        let config = DiffusionConfig::default();
        let forecast = predict_morale_trend(98.0, &[80.0, 98.0], 100.0, &config, 10);
        assert!(forecast.iter().all(|v| (0.0..=100.0).contains(v)));
        assert!(
            forecast
                .windows(2)
                .all(|w| matches!(w, [a, b] if (b - a).abs() <= 5.0 + 1e-12))
        );
    }

    #[test]
    fn zero_turns_returns_only_current() {
        let config = DiffusionConfig::default();
        assert_eq!(predict_morale_trend(55.0, &[], 55.0, &config, 0), vec![55.0]);
    }
}
