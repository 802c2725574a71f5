//! Turn counter for the unrest simulation.
//!
//! The clock is the single source of truth for the current turn. The
//! ledger and strike manager are stamped from it; neither advances time
//! on its own.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u64::MAX")]
    TurnOverflow,
}

/// Monotonic turn counter.
///
/// Turn 0 is campaign setup; the first call to [`advance`](Self::advance)
/// starts turn 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnClock {
    turn: u64,
}

impl TurnClock {
    /// A clock at turn 0.
    pub const fn new() -> Self {
        Self { turn: 0 }
    }

    /// A clock resumed at `turn` (state restoration).
    pub const fn from_turn(turn: u64) -> Self {
        Self { turn }
    }

    /// Advance by one turn. Returns the new turn number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TurnOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.turn = self.turn.checked_add(1).ok_or(ClockError::TurnOverflow)?;
        Ok(self.turn)
    }

    /// The current turn.
    pub const fn turn(&self) -> u64 {
        self.turn
    }
}
