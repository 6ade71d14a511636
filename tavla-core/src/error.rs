//! Typed error surface for the rules engine
//!
//! Every error here is recoverable at the call site: the engine never
//! mutates board state on a failed validation, so the UI can report the
//! violated rule and carry on.

use thiserror::Error;

/// The specific movement rule an attempted move broke
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("move runs against the player's direction of travel")]
    WrongDirection,

    #[error("destination point is held by two or more opposing checkers")]
    DestinationBlocked,

    #[error("checkers on the bar must re-enter before any other move")]
    BarCheckerMustEnterFirst,

    #[error("bearing off requires every checker in the home board")]
    BearOffIneligible,

    #[error("no rolled die matches that distance")]
    DieMismatch,
}

/// Errors surfaced by the turn lifecycle and the session API
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// A staged move violated a movement rule.
    #[error("illegal move: {0}")]
    IllegalMove(#[from] RuleViolation),

    /// The requested destination is reachable by no remaining die value.
    #[error("no remaining die reaches that destination")]
    NoMatchingDie,

    /// End-of-turn requested while a usable die and a legal move both exist.
    #[error("a usable die with a legal move remains; the turn cannot end")]
    MovesRemaining,

    /// `roll_dice` called twice within one turn.
    #[error("dice were already rolled this turn")]
    TurnAlreadyRolled,

    /// An operation that needs dice ran before the roll.
    #[error("dice have not been rolled this turn")]
    TurnNotRolled,

    /// Per-move confirmation is pending; confirm or reject it first.
    #[error("a staged move is awaiting confirmation")]
    ConfirmationPending,

    /// The turn already committed or rolled back.
    #[error("the turn has already finished")]
    TurnComplete,

    /// Structural board violation. Signals an internal consistency bug
    /// rather than a player mistake; validation should gate all mutation.
    #[error("board consistency violation: {0}")]
    InvalidMove(&'static str),

    /// The game has a winner; no further turns are accepted.
    #[error("the game has already been won")]
    GameOver,
}
