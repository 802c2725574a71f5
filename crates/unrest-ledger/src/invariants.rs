//! Invariant verification for the morale ledger.
//!
//! Every write path clamps morale into `[0, 100]` and trims history to
//! [`MORALE_HISTORY_LEN`] samples, so a live ledger passes these checks by
//! construction. Restored snapshots are checked here before they are
//! accepted.
//!
//! At most one strike per territory is enforced by the data model
//! (`Option<StrikeState>`), so there is nothing to count here.

use std::collections::BTreeMap;

use unrest_types::{MORALE_HISTORY_LEN, MORALE_MAX, MORALE_MIN, RegionalMorale, TerritoryId};

use crate::LedgerAnomaly;

/// The result of an invariant check.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantResult {
    /// All records satisfy the ledger invariants.
    Healthy,
    /// One or more records are corrupt.
    Anomaly(LedgerAnomaly),
}

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    /// Morale (current or historical) outside `[0, 100]` or not a number.
    MoraleOutOfRange {
        /// Offending territory.
        territory: TerritoryId,
        /// Offending value.
        value: f64,
    },
    /// History window longer than [`MORALE_HISTORY_LEN`].
    HistoryTooLong {
        /// Offending territory.
        territory: TerritoryId,
        /// Observed length.
        len: usize,
    },
    /// A record stored under a key that is not its own territory id.
    KeyMismatch {
        /// Storage key.
        key: TerritoryId,
        /// The record's own id.
        record: TerritoryId,
    },
}

impl core::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MoraleOutOfRange { territory, value } => {
                write!(f, "{territory}: morale {value} outside [0, 100]")
            }
            Self::HistoryTooLong { territory, len } => {
                write!(f, "{territory}: history length {len} exceeds {MORALE_HISTORY_LEN}")
            }
            Self::KeyMismatch { key, record } => {
                write!(f, "record for {record} stored under key {key}")
            }
        }
    }
}

fn in_range(value: f64) -> bool {
    (MORALE_MIN..=MORALE_MAX).contains(&value)
}

/// Collect every violation in `records`, in key order.
pub fn find_violations(
    records: &BTreeMap<TerritoryId, RegionalMorale>,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (key, record) in records {
        if *key != record.territory_id {
            violations.push(InvariantViolation::KeyMismatch {
                key: key.clone(),
                record: record.territory_id.clone(),
            });
        }

        if !in_range(record.morale) {
            violations.push(InvariantViolation::MoraleOutOfRange {
                territory: key.clone(),
                value: record.morale,
            });
        }

        if record.historical_morale.len() > MORALE_HISTORY_LEN {
            violations.push(InvariantViolation::HistoryTooLong {
                territory: key.clone(),
                len: record.historical_morale.len(),
            });
        }

        if let Some(&value) = record.historical_morale.iter().find(|v| !in_range(**v)) {
            violations.push(InvariantViolation::MoraleOutOfRange {
                territory: key.clone(),
                value,
            });
        }
    }

    violations
}

/// Verify the ledger invariants for all records.
pub fn verify_invariants(
    turn: u64,
    records: &BTreeMap<TerritoryId, RegionalMorale>,
) -> InvariantResult {
    let violations = find_violations(records);
    if violations.is_empty() {
        return InvariantResult::Healthy;
    }

    let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
    let message = format!(
        "LEDGER_ANOMALY at turn {turn}: {} violation(s): {}",
        violations.len(),
        details.join("; ")
    );

    InvariantResult::Anomaly(LedgerAnomaly {
        turn,
        violations,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, morale: f64) -> RegionalMorale {
        RegionalMorale::new(TerritoryId::from(id), morale, 0)
    }

    #[test]
    fn healthy_records_pass() {
        let mut records = BTreeMap::new();
        records.insert(TerritoryId::from("a"), record("a", 40.0));
        records.insert(TerritoryId::from("b"), record("b", 90.0));
        assert_eq!(verify_invariants(1, &records), InvariantResult::Healthy);
    }

    #[test]
    fn out_of_range_morale_is_reported() {
        let mut bad = record("a", 40.0);
        bad.morale = 120.0;
        let mut records = BTreeMap::new();
        records.insert(TerritoryId::from("a"), bad);

        let InvariantResult::Anomaly(anomaly) = verify_invariants(7, &records) else {
            panic!("expected anomaly");
        };
        assert_eq!(anomaly.turn, 7);
        assert_eq!(anomaly.violations.len(), 1);
        assert!(anomaly.message.contains("LEDGER_ANOMALY"));
    }

    #[test]
    fn long_history_and_key_mismatch_are_reported() {
        let mut bad = record("a", 40.0);
        bad.historical_morale = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut records = BTreeMap::new();
        records.insert(TerritoryId::from("z"), bad);

        let violations = find_violations(&records);
        assert_eq!(violations.len(), 2);
        assert!(matches!(violations.first(), Some(InvariantViolation::KeyMismatch { .. })));
        assert!(matches!(
            violations.get(1),
            Some(InvariantViolation::HistoryTooLong { len: 6, .. })
        ));
    }
}
