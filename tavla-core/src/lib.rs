//! Tavla Core - backgammon rules engine
//!
//! This crate provides the rules authority for a single local game:
//! - Board position (point stacks, bar, borne-off trays)
//! - Dice rolling with doubles expansion and optional seeding
//! - Move legality (direction, hitting, bar priority, bear-off)
//! - Turn lifecycle with batched commit/rollback
//! - Game session composing turns into a full game with win detection
//!
//! Rendering, input handling, and packaging live outside this crate; the
//! `GameSession` API is the boundary a UI consumes.

pub mod board;
pub mod dice;
pub mod error;
pub mod rules;
pub mod session;
pub mod turn;

// Re-exports for convenient access
pub use board::{BoardState, Color, Location, Move, PointStack, CHECKERS_PER_SIDE, NUM_POINTS};
pub use dice::{DiceRoll, DiceRoller};
pub use error::{GameError, RuleViolation};
pub use rules::{
    combined_destinations, has_any_legal_move, legal_destinations, legal_sources, ComboMove,
};
pub use session::{GameConfig, GameResult, GameSession, RollReport, TurnOutcome};
pub use turn::{ConfirmOutcome, ConfirmationMode, TurnController, TurnPhase};
