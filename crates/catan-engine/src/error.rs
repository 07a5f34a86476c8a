//! Error types for the engine.
//!
//! Two layers:
//! - [`RuleViolation`]: the acting player tried something illegal. The turn
//!   ends with `DoneWithError` and the error goes back to the caller.
//! - [`GameError`]: everything an engine call can return, including broken
//!   internal invariants (`Corrupted`) which end the game instance.

use crate::pieces::PieceKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A player-attributable rule violation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleViolation {
    #[error("Game is not running")]
    GameNotRunning,

    #[error("Turn is already finished")]
    TurnFinished,

    #[error("Action not allowed in turn state {0}")]
    WrongState(String),

    #[error("Action not allowed during setup")]
    NotAllowedInSetup,

    #[error("Setup turn needs a settlement and a road first")]
    SetupIncomplete,

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Not enough resources")]
    CannotAfford,

    #[error("No {0:?} pieces left for sale")]
    NoPiecesRemaining(PieceKind),

    #[error("Development card deck is empty")]
    EmptyDeck,

    #[error("No unplayed development card of that kind")]
    NoSuchCard,

    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("Invalid discard: expected {expected} cards, got {got}")]
    InvalidDiscard { expected: usize, got: usize },

    #[error("Invalid bandit move: {0}")]
    InvalidBanditMove(String),

    #[error("Selected player is not a candidate")]
    InvalidSelection,

    #[error("{0} free roads still to place")]
    UnplacedFreeRoads(u32),
}

/// Errors returned by engine operations
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("Internal invariant broken: {0}")]
    Corrupted(String),

    #[error("A hex already occupies {0}")]
    HexOccupied(String),

    #[error("Invalid tile: {0}")]
    InvalidTile(String),

    #[error("Position {0} is outside 0..=5")]
    InvalidPosition(u8),

    #[error("Game already started")]
    AlreadyStarted,

    #[error("No players registered")]
    NoPlayers,

    #[error("Worker pool error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl GameError {
    /// Whether this error ends the game instance
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::Corrupted(_))
    }

    /// The rule violation carried by this error, if any
    pub fn as_rule(&self) -> Option<&RuleViolation> {
        match self {
            GameError::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_violation_converts() {
        let err: GameError = RuleViolation::CannotAfford.into();
        assert_eq!(err.as_rule(), Some(&RuleViolation::CannotAfford));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Not enough resources");
    }

    #[test]
    fn test_corrupted_is_fatal() {
        let err = GameError::Corrupted("no bandit".into());
        assert!(err.is_fatal());
        assert!(err.as_rule().is_none());
    }
}
