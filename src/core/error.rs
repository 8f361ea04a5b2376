//! Error taxonomy for the engine.
//!
//! Game-logic errors (`IllegalPlay`, `EmptyDeck`, `WrongPhase`, `Busy`,
//! `RoundIncomplete`) are recoverable results returned to the caller.
//! `Config` and `Snapshot` fail the operation that hit them. `Consistency`
//! means a software defect: the engine halts the session when it sees one.
//!
//! Hardware faults never appear here directly; port controllers retry them
//! and report exhaustion as events. `PortEvent::fault` turns an exhausted
//! render into a `HardwareTimeout`.

use thiserror::Error;

use super::ids::{PhysicalCardId, PortId};
use super::player::PlayerId;
use crate::engine::Phase;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors returned by deck, registry and engine operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// Malformed deck or variant configuration, or an unknown variant.
    #[error("configuration error: {0}")]
    Config(String),

    /// A draw asked for more cards than the deck holds.
    #[error("cannot draw {requested} cards: only {remaining} remain")]
    EmptyDeck { requested: usize, remaining: usize },

    /// A play was rejected; turn state is unchanged.
    #[error("illegal play by {player}: {reason}")]
    IllegalPlay { player: PlayerId, reason: String },

    /// A hardware operation did not complete in time.
    #[error("hardware timeout on {port} after {attempts} attempt(s)")]
    HardwareTimeout { port: PortId, attempts: u32 },

    /// Registry or card-set invariant violated.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Operation not valid in the current phase.
    #[error("{operation} is not allowed during {phase:?}")]
    WrongPhase { operation: &'static str, phase: Phase },

    /// The physical card is locked by an in-flight render.
    #[error("{0} is busy with an in-flight render")]
    Busy(PhysicalCardId),

    /// `resolve_round` was called before every play was on the table.
    #[error("round incomplete: {played} of {required} plays on the table")]
    RoundIncomplete { played: usize, required: usize },

    /// A persisted snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl GameError {
    /// Whether the caller can carry on after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::EmptyDeck { .. }
                | GameError::IllegalPlay { .. }
                | GameError::HardwareTimeout { .. }
                | GameError::WrongPhase { .. }
                | GameError::Busy(_)
                | GameError::RoundIncomplete { .. }
        )
    }

    pub fn illegal(player: PlayerId, reason: impl Into<String>) -> Self {
        GameError::IllegalPlay {
            player,
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        GameError::Config(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(GameError::EmptyDeck { requested: 3, remaining: 1 }.is_recoverable());
        assert!(GameError::illegal(PlayerId::new(0), "not your turn").is_recoverable());
        assert!(GameError::Busy(PhysicalCardId::new(7)).is_recoverable());
        assert!(!GameError::config("bad deck").is_recoverable());
        assert!(!GameError::Consistency("double binding".into()).is_recoverable());
    }

    #[test]
    fn test_messages() {
        let err = GameError::EmptyDeck { requested: 5, remaining: 2 };
        assert_eq!(err.to_string(), "cannot draw 5 cards: only 2 remain");

        let err = GameError::illegal(PlayerId::new(1), "not your turn");
        assert_eq!(err.to_string(), "illegal play by Player 1: not your turn");
    }
}
