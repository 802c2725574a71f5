//! Error types for the `unrest-strikes` crate.
//!
//! Lookups on unknown territories are not errors; they return `None`.
//! [`StrikeError`] covers the few operations that can be refused outright.

use unrest_types::TerritoryId;

/// Errors raised by the strike manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrikeError {
    /// The territory already has an active strike. At most one strike may
    /// exist per territory.
    #[error("territory {0} already has an active strike")]
    StrikeAlreadyActive(TerritoryId),

    /// A strike was created without any demands.
    #[error("strike in territory {0} has no demands")]
    NoDemands(TerritoryId),

    /// A persisted snapshot failed validation and was not imported.
    #[error("invalid strike snapshot for territory {territory}: {reason}")]
    InvalidSnapshot {
        /// The offending entry.
        territory: TerritoryId,
        /// What was wrong with it.
        reason: String,
    },
}
