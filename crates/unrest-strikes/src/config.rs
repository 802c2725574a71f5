//! Strike tuning parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tunables for strike spawning, escalation and resolution.
///
/// Every field has a serde default, so a partial YAML section is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeConfig {
    /// Morale at or above which strikes never spawn.
    #[serde(default = "default_morale_threshold")]
    pub morale_threshold: f64,
    /// Spawn chance at zero morale, before multipliers.
    #[serde(default = "default_base_spawn_chance")]
    pub base_spawn_chance: f64,
    /// Spawn chance multiplier while a protest is active.
    #[serde(default = "default_protest_multiplier")]
    pub protest_multiplier: f64,
    /// Production value at which the economic bias is 1.
    #[serde(default = "default_production_reference")]
    pub production_reference: f64,
    /// Upper bound of the economic bias.
    #[serde(default = "default_max_production_bias")]
    pub max_production_bias: f64,
    /// Upper bound of the final spawn chance.
    #[serde(default = "default_max_spawn_chance")]
    pub max_spawn_chance: f64,
    /// Turns a strike runs before its cost starts escalating.
    #[serde(default = "default_escalation_grace_turns")]
    pub escalation_grace_turns: u32,
    /// Multiplier applied to the resolution cost per escalating turn.
    #[serde(default = "default_escalation_factor")]
    pub escalation_factor: Decimal,
    /// Strikes running longer than this are ended by exhaustion.
    #[serde(default = "default_auto_resolve_turns")]
    pub auto_resolve_turns: u32,
    /// Escalation chance per turn of duration when waiting a strike out.
    #[serde(default = "default_wait_escalation_chance")]
    pub wait_escalation_chance_per_turn: f64,
    /// Upper bound of the wait-out escalation chance.
    #[serde(default = "default_max_wait_escalation_chance")]
    pub max_wait_escalation_chance: f64,
    /// Cost multiplier when waiting out escalates.
    #[serde(default = "default_wait_cost_factor")]
    pub wait_cost_factor: Decimal,
    /// Production penalty added when waiting out escalates.
    #[serde(default = "default_wait_penalty_increase")]
    pub wait_penalty_increase: f64,
    /// Upper bound of a wait-escalated production penalty.
    #[serde(default = "default_max_wait_penalty")]
    pub max_wait_penalty: f64,
    /// Cost multiplier after a failed suppression.
    #[serde(default = "default_failed_suppression_cost_factor")]
    pub failed_suppression_cost_factor: Decimal,
    /// Morale boost recommended after paying demands.
    #[serde(default = "default_payment_morale_boost")]
    pub payment_morale_boost: f64,
    /// Morale boost recommended after paying a strike that survived force.
    #[serde(default = "default_payment_boost_after_force")]
    pub payment_boost_after_force: f64,
}

const fn default_morale_threshold() -> f64 {
    35.0
}

const fn default_base_spawn_chance() -> f64 {
    0.4
}

const fn default_protest_multiplier() -> f64 {
    1.5
}

const fn default_production_reference() -> f64 {
    500.0
}

const fn default_max_production_bias() -> f64 {
    1.5
}

const fn default_max_spawn_chance() -> f64 {
    0.6
}

const fn default_escalation_grace_turns() -> u32 {
    2
}

const fn default_escalation_factor() -> Decimal {
    Decimal::from_parts(105, 0, 0, false, 2)
}

const fn default_auto_resolve_turns() -> u32 {
    10
}

const fn default_wait_escalation_chance() -> f64 {
    0.05
}

const fn default_max_wait_escalation_chance() -> f64 {
    0.5
}

const fn default_wait_cost_factor() -> Decimal {
    Decimal::from_parts(115, 0, 0, false, 2)
}

const fn default_wait_penalty_increase() -> f64 {
    10.0
}

const fn default_max_wait_penalty() -> f64 {
    90.0
}

const fn default_failed_suppression_cost_factor() -> Decimal {
    Decimal::from_parts(15, 0, 0, false, 1)
}

const fn default_payment_morale_boost() -> f64 {
    10.0
}

const fn default_payment_boost_after_force() -> f64 {
    5.0
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            morale_threshold: default_morale_threshold(),
            base_spawn_chance: default_base_spawn_chance(),
            protest_multiplier: default_protest_multiplier(),
            production_reference: default_production_reference(),
            max_production_bias: default_max_production_bias(),
            max_spawn_chance: default_max_spawn_chance(),
            escalation_grace_turns: default_escalation_grace_turns(),
            escalation_factor: default_escalation_factor(),
            auto_resolve_turns: default_auto_resolve_turns(),
            wait_escalation_chance_per_turn: default_wait_escalation_chance(),
            max_wait_escalation_chance: default_max_wait_escalation_chance(),
            wait_cost_factor: default_wait_cost_factor(),
            wait_penalty_increase: default_wait_penalty_increase(),
            max_wait_penalty: default_max_wait_penalty(),
            failed_suppression_cost_factor: default_failed_suppression_cost_factor(),
            payment_morale_boost: default_payment_morale_boost(),
            payment_boost_after_force: default_payment_boost_after_force(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_documented_values() {
        let config = StrikeConfig::default();
        assert!((config.morale_threshold - 35.0).abs() < f64::EPSILON);
        assert_eq!(config.auto_resolve_turns, 10);
        assert_eq!(config.escalation_factor, dec!(1.05));
        assert_eq!(config.wait_cost_factor, dec!(1.15));
        assert_eq!(config.failed_suppression_cost_factor, dec!(1.5));
    }

    #[test]
    fn gold_factors_are_usable_in_const_context() {
        const FACTORS: [Decimal; 3] = [
            default_escalation_factor(),
            default_wait_cost_factor(),
            default_failed_suppression_cost_factor(),
        ];
        assert_eq!(FACTORS, [dec!(1.05), dec!(1.15), dec!(1.5)]);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StrikeConfig =
            serde_json::from_str(r#"{"auto_resolve_turns": 4}"#).unwrap_or_default();
        assert_eq!(config.auto_resolve_turns, 4);
        assert_eq!(config.escalation_grace_turns, 2);
    }
}
