//! Enumeration types for the unrest simulation.
//!
//! Strike taxonomy, demand taxonomy, and the severity tiers carried by
//! combat, occupation and nuclear event descriptors.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Strikes
// ---------------------------------------------------------------------------

/// The kind of labor strike, which determines how hard production is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StrikeType {
    /// Territory-wide walkout. Production halts completely.
    GeneralStrike,
    /// Factory and mine workers down tools.
    IndustrialStrike,
    /// Rail, port and road workers stop moving goods.
    TransportationStrike,
    /// Civil servants stop administering the territory.
    PublicSectorStrike,
}

impl StrikeType {
    /// All strike types, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::GeneralStrike,
        Self::IndustrialStrike,
        Self::TransportationStrike,
        Self::PublicSectorStrike,
    ];

    /// Whether this strike halts production outright.
    pub const fn halts_production(self) -> bool {
        matches!(self, Self::GeneralStrike)
    }

    /// Percentage of output lost while the strike is active.
    ///
    /// A general strike reports 0: its loss is total and carried by the
    /// halt flag instead.
    pub const fn base_production_penalty(self) -> f64 {
        match self {
            Self::GeneralStrike => 0.0,
            Self::IndustrialStrike => 70.0,
            Self::TransportationStrike => 50.0,
            Self::PublicSectorStrike => 30.0,
        }
    }
}

impl core::fmt::Display for StrikeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::GeneralStrike => "general_strike",
            Self::IndustrialStrike => "industrial_strike",
            Self::TransportationStrike => "transportation_strike",
            Self::PublicSectorStrike => "public_sector_strike",
        };
        f.write_str(name)
    }
}

/// What the strikers are asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DemandType {
    /// Higher pay.
    Wages,
    /// An end to the war. Political, carries no gold cost.
    Peace,
    /// Administrative or labor reform.
    Reform,
    /// Food, fuel or material relief.
    Resources,
}

/// How strongly a demand is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DemandSeverity {
    /// Negotiable grievance.
    Minor,
    /// Serious grievance.
    Major,
    /// Non-negotiable grievance.
    Critical,
}

// ---------------------------------------------------------------------------
// Event tiers
// ---------------------------------------------------------------------------

/// Magnitude of a battlefield victory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum VictoryTier {
    /// Skirmish won.
    Minor,
    /// Battle won.
    Major,
    /// War-turning victory.
    Decisive,
}

/// Magnitude of a battlefield defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DefeatTier {
    /// Skirmish lost.
    Minor,
    /// Battle lost.
    Major,
    /// Army destroyed or front collapsed.
    Catastrophic,
}

/// Yield class of a nuclear detonation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NuclearTier {
    /// Battlefield weapon.
    Tactical,
    /// City-killer.
    Strategic,
    /// Multiple warheads or a salvo.
    Massive,
}

/// How a protest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProtestOutcome {
    /// The government gave the protesters what they asked for.
    DemandsMet,
    /// A compromise was reached.
    Negotiated,
    /// The protest was broken up by force.
    Suppressed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_general_strike_halts() {
        for strike_type in StrikeType::ALL {
            assert_eq!(
                strike_type.halts_production(),
                strike_type == StrikeType::GeneralStrike
            );
        }
    }

    #[test]
    fn strike_type_serializes_snake_case() {
        let json = serde_json::to_string(&StrikeType::PublicSectorStrike).ok();
        assert_eq!(json.as_deref(), Some("\"public_sector_strike\""));
        assert_eq!(
            StrikeType::TransportationStrike.to_string(),
            "transportation_strike"
        );
    }
}
