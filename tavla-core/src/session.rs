//! Full-game composition and the UI-facing API
//!
//! `GameSession` is the single owner of the canonical `BoardState`. It
//! strings turns together, detects the win, and exposes the surface a
//! rendering layer consumes: roll, query, stage, end-turn, save/resume.

use crate::board::{BoardState, Color, Location, Move};
use crate::dice::{DiceRoll, DiceRoller};
use crate::error::GameError;
use crate::rules::{self, ComboMove};
use crate::turn::{ConfirmOutcome, ConfirmationMode, TurnController, TurnPhase};
use serde::{Deserialize, Serialize};

/// Session configuration
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Whole-turn batch confirmation or per-move confirmation
    pub confirmation_mode: ConfirmationMode,
    /// Color to move first
    pub starting_color: Color,
    /// Seed for reproducible dice (None = entropy)
    pub dice_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            confirmation_mode: ConfirmationMode::Batch,
            starting_color: Color::White,
            dice_seed: None,
        }
    }
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    WhiteWins,
    BlackWins,
}

impl GameResult {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::Ongoing => None,
            GameResult::WhiteWins => Some(Color::White),
            GameResult::BlackWins => Some(Color::Black),
        }
    }
}

/// What a turn's roll produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollReport {
    pub roll: DiceRoll,
    /// Expanded die allotment (four values on doubles)
    pub dice: Vec<u8>,
    /// False means a forced pass: no legal move exists for any die
    pub playable: bool,
}

/// Outcome of `end_turn`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Turn committed; play passes to `next`.
    Committed { moves: Vec<Move>, next: Color },
    /// Turn committed and the mover has borne off all 15 checkers.
    GameOver { winner: Color, moves: Vec<Move> },
    /// Staged work discarded; the same color keeps the turn.
    Rejected { color: Color },
    /// Per-move acceptance with dice still in play; the turn continues.
    InProgress,
}

/// Persisted form: board, active color, mode, and result. Staging is
/// never persisted; a restored game resumes at the top of a turn.
#[derive(Serialize, Deserialize)]
struct SavedGame {
    board: BoardState,
    active: Color,
    mode: ConfirmationMode,
    result: GameResult,
}

/// One local game of tavla, start to win
pub struct GameSession {
    board: BoardState,
    roller: DiceRoller,
    mode: ConfirmationMode,
    active: Color,
    turn: Option<TurnController>,
    result: GameResult,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        let roller = match config.dice_seed {
            Some(seed) => DiceRoller::with_seed(seed),
            None => DiceRoller::new(),
        };
        Self {
            board: BoardState::standard(),
            roller,
            mode: config.confirmation_mode,
            active: config.starting_color,
            turn: None,
            result: GameResult::Ongoing,
        }
    }

    /// Open the first turn and report the initial position and mover
    pub fn start(&mut self) -> (BoardState, Color) {
        self.turn = Some(TurnController::begin(&self.board, self.active, self.mode));
        tracing::debug!(first = ?self.active, "game started");
        (self.board.clone(), self.active)
    }

    /// Read-only snapshot of the canonical position
    pub fn current_state(&self) -> BoardState {
        self.board.clone()
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn active_color(&self) -> Color {
        self.active
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// The open turn, if any
    pub fn turn(&self) -> Option<&TurnController> {
        self.turn.as_ref()
    }

    /// Roll the active player's dice. `playable: false` in the report
    /// means the turn can end immediately with zero staged moves.
    pub fn roll_for_turn(&mut self) -> Result<RollReport, GameError> {
        if self.result != GameResult::Ongoing {
            return Err(GameError::GameOver);
        }
        let turn = self.turn.as_mut().ok_or(GameError::TurnNotRolled)?;
        let roll = turn.roll_dice(&mut self.roller)?;
        let playable = rules::has_any_legal_move(&self.board, turn.color(), turn.remaining_dice());
        if !playable {
            tracing::debug!(color = ?turn.color(), "no legal move for any die");
        }
        Ok(RollReport {
            roll,
            dice: turn.remaining_dice().to_vec(),
            playable,
        })
    }

    /// Legal destinations from `source` with `die`, against the current
    /// partially-staged position
    pub fn legal_destinations(
        &self,
        source: Location,
        die: u8,
    ) -> Result<Vec<Location>, GameError> {
        let turn = self.open_turn()?;
        Ok(turn.legal_destinations(&self.board, source, die))
    }

    /// Sources holding at least one legal move for the remaining dice
    pub fn legal_sources(&self) -> Result<Vec<Location>, GameError> {
        let turn = self.open_turn()?;
        Ok(rules::legal_sources(
            &self.board,
            turn.color(),
            turn.remaining_dice(),
        ))
    }

    /// Destinations reachable by chaining two remaining dice from `source`
    pub fn combined_destinations(&self, source: Location) -> Result<Vec<ComboMove>, GameError> {
        let turn = self.open_turn()?;
        Ok(rules::combined_destinations(
            &self.board,
            turn.color(),
            turn.remaining_dice(),
            source,
        ))
    }

    /// Stage one move into the open turn
    pub fn stage_move(&mut self, source: Location, dest: Location) -> Result<Move, GameError> {
        if self.result != GameResult::Ongoing {
            return Err(GameError::GameOver);
        }
        let turn = self.turn.as_mut().ok_or(GameError::TurnNotRolled)?;
        turn.stage_move(&mut self.board, source, dest)
    }

    /// Reverse the most recent staged move
    pub fn undo_last_staged(&mut self) -> Result<Option<Move>, GameError> {
        let turn = self.turn.as_mut().ok_or(GameError::TurnNotRolled)?;
        turn.undo_last_staged(&mut self.board)
    }

    /// Confirm or reject the open turn's staged work.
    ///
    /// Confirmation commits (after the mandatory end-of-turn gate) and
    /// either declares the winner or passes play across. Rejection in
    /// batch mode restores the pre-turn snapshot and hands the same dice
    /// back to the same player; in per-move mode it reverses only the
    /// pending move.
    pub fn end_turn(&mut self, confirm: bool) -> Result<TurnOutcome, GameError> {
        if self.result != GameResult::Ongoing {
            return Err(GameError::GameOver);
        }
        let turn = self.turn.as_mut().ok_or(GameError::TurnNotRolled)?;

        if confirm {
            let outcome = turn.confirm(&self.board)?;
            match outcome {
                ConfirmOutcome::Committed(moves) => self.finish_committed(moves),
                ConfirmOutcome::Staging => Ok(TurnOutcome::InProgress),
            }
        } else {
            turn.reject(&mut self.board)?;
            if turn.phase() == TurnPhase::RolledBack {
                // The turn object is done; reopen for the same player,
                // keeping the same dice when they were already rolled.
                let roll = turn.roll();
                self.turn = Some(match roll {
                    Some(roll) => TurnController::resume(&self.board, self.active, self.mode, roll),
                    None => TurnController::begin(&self.board, self.active, self.mode),
                });
            }
            Ok(TurnOutcome::Rejected { color: self.active })
        }
    }

    fn finish_committed(&mut self, moves: Vec<Move>) -> Result<TurnOutcome, GameError> {
        let mover = self.active;
        if self.board.has_won(mover) {
            self.result = match mover {
                Color::White => GameResult::WhiteWins,
                Color::Black => GameResult::BlackWins,
            };
            self.turn = None;
            tracing::info!(winner = ?mover, "game over");
            return Ok(TurnOutcome::GameOver {
                winner: mover,
                moves,
            });
        }

        self.active = mover.opponent();
        self.turn = Some(TurnController::begin(&self.board, self.active, self.mode));
        Ok(TurnOutcome::Committed {
            moves,
            next: self.active,
        })
    }

    fn open_turn(&self) -> Result<&TurnController, GameError> {
        let turn = self.turn.as_ref().ok_or(GameError::TurnNotRolled)?;
        if turn.phase() == TurnPhase::AwaitingRoll {
            return Err(GameError::TurnNotRolled);
        }
        Ok(turn)
    }

    /// Opaque save blob for resume across process restarts
    pub fn snapshot_for_persistence(&self) -> anyhow::Result<String> {
        let saved = SavedGame {
            board: self.board.clone(),
            active: self.active,
            mode: self.mode,
            result: self.result,
        };
        Ok(serde_json::to_string(&saved)?)
    }

    /// Rebuild a session from a save blob. An ongoing game resumes at the
    /// top of the active player's turn.
    pub fn restore_from_persistence(blob: &str) -> anyhow::Result<Self> {
        let saved: SavedGame = serde_json::from_str(blob)?;
        let mut session = Self {
            board: saved.board,
            roller: DiceRoller::new(),
            mode: saved.mode,
            active: saved.active,
            turn: None,
            result: saved.result,
        };
        if session.result == GameResult::Ongoing {
            session.turn = Some(TurnController::begin(
                &session.board,
                session.active,
                session.mode,
            ));
        }
        Ok(session)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_reports_standard_position_and_first_mover() {
        let mut session = GameSession::new(GameConfig::default());
        let (board, first) = session.start();
        assert_eq!(board, BoardState::standard());
        assert_eq!(first, Color::White);
        assert_eq!(session.result(), GameResult::Ongoing);
    }

    #[test]
    fn queries_before_roll_are_refused() {
        let mut session = GameSession::new(GameConfig::default());
        session.start();
        assert_eq!(
            session.legal_destinations(Location::Point(23), 3),
            Err(GameError::TurnNotRolled)
        );
        assert_eq!(session.legal_sources(), Err(GameError::TurnNotRolled));
    }

    #[test]
    fn roll_then_query_and_reject_keeps_position() {
        let mut session = GameSession::new(GameConfig {
            dice_seed: Some(11),
            ..GameConfig::default()
        });
        session.start();
        let report = session.roll_for_turn().unwrap();
        assert!(report.dice.iter().all(|d| (1..=6).contains(d)));

        let before = session.current_state();
        if report.playable {
            let sources = session.legal_sources().unwrap();
            let source = sources[0];
            let die = *report
                .dice
                .iter()
                .find(|&&d| !session.legal_destinations(source, d).unwrap().is_empty())
                .unwrap();
            let dest = session.legal_destinations(source, die).unwrap()[0];
            session.stage_move(source, dest).unwrap();
            assert_ne!(session.current_state(), before);
        }

        let outcome = session.end_turn(false).unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Rejected {
                color: Color::White
            }
        );
        assert_eq!(session.current_state(), before);
        assert_eq!(session.active_color(), Color::White);
        // The reopened turn keeps the same dice; rolling again is misuse.
        assert_eq!(session.roll_for_turn(), Err(GameError::TurnAlreadyRolled));
    }

    #[test]
    fn persistence_round_trip_preserves_game() {
        let mut session = GameSession::new(GameConfig {
            dice_seed: Some(3),
            ..GameConfig::default()
        });
        session.start();

        let blob = session.snapshot_for_persistence().unwrap();
        let restored = GameSession::restore_from_persistence(&blob).unwrap();
        assert_eq!(restored.board(), session.board());
        assert_eq!(restored.active_color(), session.active_color());
        assert_eq!(restored.result(), GameResult::Ongoing);
        // Restored games resume at the top of a turn.
        assert!(restored.turn().is_some());
    }

    #[test]
    fn api_refused_after_game_over() {
        let blob = {
            let mut session = GameSession::new(GameConfig::default());
            session.board = BoardState::from_placements(&[
                (Color::White, Location::Off, 15),
                (Color::Black, Location::Point(0), 15),
            ]);
            session.result = GameResult::WhiteWins;
            session.snapshot_for_persistence().unwrap()
        };
        let mut restored = GameSession::restore_from_persistence(&blob).unwrap();
        assert_eq!(restored.result(), GameResult::WhiteWins);
        assert_eq!(restored.result().winner(), Some(Color::White));
        assert_eq!(restored.roll_for_turn(), Err(GameError::GameOver));
        assert_eq!(restored.end_turn(true), Err(GameError::GameOver));
    }
}
