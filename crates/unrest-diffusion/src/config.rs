//! Tuning knobs for morale contagion.

use serde::{Deserialize, Serialize};

/// Parameters for neighbor contagion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionConfig {
    /// Fraction of the neighbor differential absorbed per turn.
    #[serde(default = "default_diffusion_rate")]
    pub diffusion_rate: f64,

    /// Neighbor average above which contagion accelerates.
    #[serde(default = "default_high_morale_threshold")]
    pub high_morale_threshold: f64,

    /// Neighbor average below which contagion accelerates.
    #[serde(default = "default_low_morale_threshold")]
    pub low_morale_threshold: f64,

    /// Acceleration applied past either threshold.
    #[serde(default = "default_extreme_multiplier")]
    pub extreme_multiplier: f64,

    /// Largest contagion delta in either direction per turn.
    #[serde(default = "default_max_change_per_turn")]
    pub max_change_per_turn: f64,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            diffusion_rate: default_diffusion_rate(),
            high_morale_threshold: default_high_morale_threshold(),
            low_morale_threshold: default_low_morale_threshold(),
            extreme_multiplier: default_extreme_multiplier(),
            max_change_per_turn: default_max_change_per_turn(),
        }
    }
}

impl DiffusionConfig {
    /// The per-turn bound as a usable, non-negative limit.
    ///
    /// A non-finite configured bound falls back to the default.
    pub fn change_limit(&self) -> f64 {
        if self.max_change_per_turn.is_finite() {
            self.max_change_per_turn.abs()
        } else {
            default_max_change_per_turn()
        }
    }
}

const fn default_diffusion_rate() -> f64 {
    0.15
}

const fn default_high_morale_threshold() -> f64 {
    75.0
}

const fn default_low_morale_threshold() -> f64 {
    25.0
}

const fn default_extreme_multiplier() -> f64 {
    1.5
}

const fn default_max_change_per_turn() -> f64 {
    5.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: DiffusionConfig =
            serde_json::from_str(r#"{"diffusion_rate": 0.3}"#).unwrap_or_default();
        assert!((config.diffusion_rate - 0.3).abs() < f64::EPSILON);
        assert!((config.max_change_per_turn - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn change_limit_is_non_negative() {
        let config = DiffusionConfig {
            max_change_per_turn: -3.0,
            ..DiffusionConfig::default()
        };
        assert!((config.change_limit() - 3.0).abs() < f64::EPSILON);

        let config = DiffusionConfig {
            max_change_per_turn: f64::NAN,
            ..DiffusionConfig::default()
        };
        assert!((config.change_limit() - 5.0).abs() < f64::EPSILON);
    }
}
