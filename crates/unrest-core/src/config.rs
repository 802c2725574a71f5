//! Configuration loading and typed config structures for the unrest
//! simulation.
//!
//! The canonical configuration lives in `unrest-config.yaml` at the project
//! root. Every section and field has a default, so an empty file yields a
//! runnable (if territory-less) simulation. [`UnrestConfig::validate`]
//! rejects values the engine cannot run with.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use unrest_diffusion::DiffusionConfig;
use unrest_ledger::{CRITICAL_MORALE_THRESHOLD, DEFAULT_NATURAL_TARGET, TerritoryOrigin};
use unrest_strikes::StrikeConfig;
use unrest_types::{MORALE_MAX, MORALE_MIN, TerritoryAdjacency, TerritoryId, TerritoryWeight};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but cannot be used.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Shorthand for an [`ConfigError::Invalid`].
fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `unrest-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UnrestConfig {
    /// Run length and randomness.
    #[serde(default)]
    pub simulation: SimulationSection,

    /// Morale baseline and recovery.
    #[serde(default)]
    pub morale: MoraleConfig,

    /// Neighbor contagion.
    #[serde(default)]
    pub diffusion: DiffusionConfig,

    /// Strike spawning, escalation and resolution.
    #[serde(default)]
    pub strikes: StrikeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The territory scenario.
    #[serde(default)]
    pub territories: Vec<TerritoryConfig>,
}

impl UnrestConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every section for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.morale.validate()?;
        validate_diffusion(&self.diffusion)?;
        validate_strikes(&self.strikes)?;
        validate_territories(&self.territories)
    }

    /// Adjacency lists for the diffusion engine, in scenario order.
    ///
    /// Borders are symmetric: a territory listed by a neighbour is adjacent
    /// to it even if its own `adjacent` list omits that neighbour. Each list
    /// keeps the territory's own entries first, then the mirrored ones.
    pub fn adjacencies(&self) -> Vec<TerritoryAdjacency> {
        let mut neighbors: BTreeMap<&TerritoryId, Vec<TerritoryId>> = self
            .territories
            .iter()
            .map(|t| (&t.id, t.adjacent.clone()))
            .collect();
        for territory in &self.territories {
            for adjacent in &territory.adjacent {
                if let Some(list) = neighbors
                    .get_mut(adjacent)
                    .filter(|list| !list.contains(&territory.id))
                {
                    list.push(territory.id.clone());
                }
            }
        }

        self.territories
            .iter()
            .map(|t| TerritoryAdjacency {
                territory_id: t.id.clone(),
                adjacent_territories: neighbors.remove(&t.id).unwrap_or_default(),
                is_capital: t.is_capital,
                is_border: t.is_border,
            })
            .collect()
    }

    /// Strategic weights for national aggregation.
    pub fn weights(&self) -> Vec<TerritoryWeight> {
        self.territories
            .iter()
            .map(|t| TerritoryWeight {
                territory_id: t.id.clone(),
                strategic_value: t.strategic_value,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Run length and randomness.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSection {
    /// Seed for replayable runs; `None` draws a seed from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Turns the headless engine runs.
    #[serde(default = "default_turns")]
    pub turns: u32,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: None,
            turns: default_turns(),
        }
    }
}

/// Morale baseline and recovery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoraleConfig {
    /// Morale the natural pull moves toward.
    #[serde(default = "default_natural_target")]
    pub natural_target: f64,

    /// Fraction of the gap to the target closed per turn; 0 disables it.
    #[serde(default)]
    pub natural_recovery_rate: f64,

    /// Morale below which a territory is reported as critical.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

impl Default for MoraleConfig {
    fn default() -> Self {
        Self {
            natural_target: default_natural_target(),
            natural_recovery_rate: 0.0,
            critical_threshold: default_critical_threshold(),
        }
    }
}

impl MoraleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_morale_scale("morale.natural_target", self.natural_target)?;
        check_morale_scale("morale.critical_threshold", self.critical_threshold)?;
        check_fraction("morale.natural_recovery_rate", self.natural_recovery_rate)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One territory in the scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerritoryConfig {
    /// Territory identifier.
    pub id: TerritoryId,

    /// Territories sharing a border with this one.
    #[serde(default)]
    pub adjacent: Vec<TerritoryId>,

    /// Held at campaign start or conquered.
    #[serde(default)]
    pub origin: TerritoryOrigin,

    /// Whether this is the capital.
    #[serde(default)]
    pub is_capital: bool,

    /// Whether this lies on the national border.
    #[serde(default)]
    pub is_border: bool,

    /// Whether heavy industry dominates the economy.
    #[serde(default)]
    pub is_industrial: bool,

    /// Whether the territory is a transport hub.
    #[serde(default)]
    pub has_transportation: bool,

    /// Weight in national morale.
    #[serde(default = "default_strategic_value")]
    pub strategic_value: f64,

    /// Production value per turn.
    #[serde(default)]
    pub production: f64,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_turns() -> u32 {
    20
}

const fn default_natural_target() -> f64 {
    DEFAULT_NATURAL_TARGET
}

const fn default_critical_threshold() -> f64 {
    CRITICAL_MORALE_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_strategic_value() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_morale_scale(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (MORALE_MIN..=MORALE_MAX).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 100]")))
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be a non-negative number")))
    }
}

fn check_growth_factor(field: &str, value: Decimal) -> Result<(), ConfigError> {
    if value >= Decimal::ONE {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be at least 1")))
    }
}

fn validate_diffusion(config: &DiffusionConfig) -> Result<(), ConfigError> {
    check_fraction("diffusion.diffusion_rate", config.diffusion_rate)?;
    check_non_negative("diffusion.extreme_multiplier", config.extreme_multiplier)?;
    check_non_negative("diffusion.max_change_per_turn", config.max_change_per_turn)?;
    check_morale_scale("diffusion.high_morale_threshold", config.high_morale_threshold)?;
    check_morale_scale("diffusion.low_morale_threshold", config.low_morale_threshold)?;
    if config.low_morale_threshold > config.high_morale_threshold {
        return Err(invalid(
            "diffusion.low_morale_threshold",
            "must not exceed high_morale_threshold",
        ));
    }
    Ok(())
}

fn validate_strikes(config: &StrikeConfig) -> Result<(), ConfigError> {
    check_morale_scale("strikes.morale_threshold", config.morale_threshold)?;
    check_fraction("strikes.base_spawn_chance", config.base_spawn_chance)?;
    check_fraction("strikes.max_spawn_chance", config.max_spawn_chance)?;
    check_fraction(
        "strikes.wait_escalation_chance_per_turn",
        config.wait_escalation_chance_per_turn,
    )?;
    check_fraction("strikes.max_wait_escalation_chance", config.max_wait_escalation_chance)?;
    check_non_negative("strikes.protest_multiplier", config.protest_multiplier)?;
    check_non_negative("strikes.production_reference", config.production_reference)?;
    check_non_negative("strikes.max_production_bias", config.max_production_bias)?;
    check_non_negative("strikes.wait_penalty_increase", config.wait_penalty_increase)?;
    check_morale_scale("strikes.max_wait_penalty", config.max_wait_penalty)?;
    check_non_negative("strikes.payment_morale_boost", config.payment_morale_boost)?;
    check_non_negative("strikes.payment_boost_after_force", config.payment_boost_after_force)?;
    check_growth_factor("strikes.escalation_factor", config.escalation_factor)?;
    check_growth_factor("strikes.wait_cost_factor", config.wait_cost_factor)?;
    check_growth_factor(
        "strikes.failed_suppression_cost_factor",
        config.failed_suppression_cost_factor,
    )?;
    if config.auto_resolve_turns == 0 {
        return Err(invalid("strikes.auto_resolve_turns", "must be at least 1"));
    }
    Ok(())
}

fn validate_territories(territories: &[TerritoryConfig]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for territory in territories {
        if !seen.insert(&territory.id) {
            return Err(invalid("territories", format!("duplicate id {}", territory.id)));
        }
    }

    for territory in territories {
        let field = format!("territories.{}", territory.id);
        check_non_negative(&format!("{field}.strategic_value"), territory.strategic_value)?;
        check_non_negative(&format!("{field}.production"), territory.production)?;
        if let Some(unknown) = territory.adjacent.iter().find(|id| !seen.contains(id)) {
            return Err(invalid(
                format!("{field}.adjacent"),
                format!("unknown territory {unknown}"),
            ));
        }
        if territory.adjacent.contains(&territory.id) {
            return Err(invalid(format!("{field}.adjacent"), "territory lists itself"));
        }
    }

    if territories.iter().filter(|t| t.is_capital).count() > 1 {
        return Err(invalid("territories", "more than one capital"));
    }
    Ok(())
}
