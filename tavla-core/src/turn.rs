//! Turn lifecycle: staged moves, forced-pass detection, commit/rollback
//!
//! The controller owns one turn's state machine:
//! `AwaitingRoll -> DiceRolled -> (staging) -> PendingConfirmation ->
//! {Committed | RolledBack}`. It never owns the board; the session passes
//! its board in, and every mutation goes through gated move application
//! so a rollback can restore the turn-start snapshot wholesale.

use crate::board::{BoardState, Color, Location, Move};
use crate::dice::{DiceRoll, DiceRoller};
use crate::error::GameError;
use crate::rules;
use serde::{Deserialize, Serialize};

/// How staged moves are confirmed.
///
/// `Batch` stages arbitrarily many moves before one confirm-or-reject-all.
/// `PerMove` asks after every staged move; rejection rolls back only that
/// move, and accepting the last move of the allotment commits the turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationMode {
    #[default]
    Batch,
    PerMove,
}

/// Lifecycle phase. `Committed` and `RolledBack` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingRoll,
    DiceRolled,
    PendingConfirmation,
    Committed,
    RolledBack,
}

/// Outcome of a confirmation step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The turn is over; the finalized move log is returned.
    Committed(Vec<Move>),
    /// Per-move acceptance with dice still in play; staging continues.
    Staging,
}

/// One turn's state machine
pub struct TurnController {
    color: Color,
    mode: ConfirmationMode,
    phase: TurnPhase,
    /// Pre-turn position, restored wholesale on rollback
    snapshot: BoardState,
    roll: Option<DiceRoll>,
    /// Full die allotment at roll time
    allotment: Vec<u8>,
    /// Die values not yet consumed by staged moves
    remaining: Vec<u8>,
    /// Applied moves, in order, for replay or reversal
    log: Vec<Move>,
}

impl TurnController {
    /// Open a turn for `color`, capturing the rollback snapshot
    pub fn begin(board: &BoardState, color: Color, mode: ConfirmationMode) -> Self {
        Self {
            color,
            mode,
            phase: TurnPhase::AwaitingRoll,
            snapshot: board.clone(),
            roll: None,
            allotment: Vec::new(),
            remaining: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Open a turn that reuses an already-rolled pair. Used after a batch
    /// rejection, where the same player keeps the same dice.
    pub fn resume(board: &BoardState, color: Color, mode: ConfirmationMode, roll: DiceRoll) -> Self {
        let allotment = roll.expand();
        Self {
            color,
            mode,
            phase: TurnPhase::DiceRolled,
            snapshot: board.clone(),
            roll: Some(roll),
            remaining: allotment.clone(),
            allotment,
            log: Vec::new(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, TurnPhase::Committed | TurnPhase::RolledBack)
    }

    /// The raw two-die pair, if rolled
    pub fn roll(&self) -> Option<DiceRoll> {
        self.roll
    }

    pub fn remaining_dice(&self) -> &[u8] {
        &self.remaining
    }

    pub fn staged_moves(&self) -> &[Move] {
        &self.log
    }

    /// Roll and expand the turn's dice
    pub fn roll_dice(&mut self, roller: &mut DiceRoller) -> Result<DiceRoll, GameError> {
        match self.phase {
            TurnPhase::AwaitingRoll => {}
            TurnPhase::DiceRolled | TurnPhase::PendingConfirmation => {
                return Err(GameError::TurnAlreadyRolled)
            }
            TurnPhase::Committed | TurnPhase::RolledBack => return Err(GameError::TurnComplete),
        }

        let roll = roller.roll();
        self.roll = Some(roll);
        self.allotment = roll.expand();
        self.remaining = self.allotment.clone();
        self.phase = TurnPhase::DiceRolled;
        tracing::debug!(color = ?self.color, d1 = roll.d1, d2 = roll.d2, "dice rolled");
        Ok(roll)
    }

    /// Legal destinations for `source` and `die` against the current,
    /// possibly partially-staged board
    pub fn legal_destinations(
        &self,
        board: &BoardState,
        source: Location,
        die: u8,
    ) -> Vec<Location> {
        rules::legal_destinations(board, self.color, die, source)
    }

    /// Validate and apply one move to the live board, consuming a die and
    /// appending to the move log so later staged moves see the new position
    pub fn stage_move(
        &mut self,
        board: &mut BoardState,
        from: Location,
        to: Location,
    ) -> Result<Move, GameError> {
        match self.phase {
            TurnPhase::AwaitingRoll => return Err(GameError::TurnNotRolled),
            TurnPhase::DiceRolled => {}
            TurnPhase::PendingConfirmation => {
                if self.mode == ConfirmationMode::PerMove {
                    return Err(GameError::ConfirmationPending);
                }
            }
            TurnPhase::Committed | TurnPhase::RolledBack => return Err(GameError::TurnComplete),
        }

        let Some(die) = self.matching_die(board, from, to) else {
            return Err(rules::explain_rejection(
                board,
                self.color,
                &self.remaining,
                from,
                to,
            ));
        };

        let hit = matches!(to, Location::Point(_))
            && board.checker_count(to, self.color.opponent()) == 1;
        let mv = Move {
            color: self.color,
            from,
            to,
            die,
            hit,
        };
        board.apply(&mv)?;

        let idx = self
            .remaining
            .iter()
            .position(|&d| d == die)
            .ok_or(GameError::InvalidMove("consumed die missing from pool"))?;
        self.remaining.remove(idx);
        self.log.push(mv);
        tracing::debug!(color = ?self.color, ?from, ?to, die, hit, "move staged");

        if self.mode == ConfirmationMode::PerMove {
            self.phase = TurnPhase::PendingConfirmation;
        }
        Ok(mv)
    }

    /// Smallest remaining die that legally produces `to` from `from`
    fn matching_die(&self, board: &BoardState, from: Location, to: Location) -> Option<u8> {
        let mut values = self.remaining.clone();
        values.sort_unstable();
        values.dedup();
        values
            .into_iter()
            .find(|&die| rules::legal_destinations(board, self.color, die, from).contains(&to))
    }

    /// Reverse the most recent staged move, returning its die to the pool.
    /// `None` when nothing is staged.
    pub fn undo_last_staged(
        &mut self,
        board: &mut BoardState,
    ) -> Result<Option<Move>, GameError> {
        match self.phase {
            TurnPhase::AwaitingRoll => return Err(GameError::TurnNotRolled),
            TurnPhase::DiceRolled | TurnPhase::PendingConfirmation => {}
            TurnPhase::Committed | TurnPhase::RolledBack => return Err(GameError::TurnComplete),
        }

        let Some(mv) = self.log.pop() else {
            return Ok(None);
        };
        board.unapply(&mv)?;
        self.remaining.push(mv.die);
        self.phase = TurnPhase::DiceRolled;
        tracing::debug!(color = ?self.color, die = mv.die, "staged move undone");
        Ok(Some(mv))
    }

    /// Move to `PendingConfirmation`. Succeeds only when the die allotment
    /// is spent or no remaining die has a legal move (forced pass).
    pub fn request_end_turn(&mut self, board: &BoardState) -> Result<(), GameError> {
        match self.phase {
            TurnPhase::AwaitingRoll => return Err(GameError::TurnNotRolled),
            TurnPhase::DiceRolled => {}
            TurnPhase::PendingConfirmation => return Ok(()),
            TurnPhase::Committed | TurnPhase::RolledBack => return Err(GameError::TurnComplete),
        }

        if !self.remaining.is_empty()
            && rules::has_any_legal_move(board, self.color, &self.remaining)
        {
            return Err(GameError::MovesRemaining);
        }

        if self.log.is_empty() && !self.remaining.is_empty() {
            tracing::debug!(color = ?self.color, dice = ?self.remaining, "forced pass");
        }
        self.phase = TurnPhase::PendingConfirmation;
        Ok(())
    }

    /// Accept the staged work. In batch mode this commits the whole turn.
    /// In per-move mode it accepts the pending move and commits only when
    /// the allotment is exhausted or no legal move remains.
    pub fn confirm(&mut self, board: &BoardState) -> Result<ConfirmOutcome, GameError> {
        if self.phase == TurnPhase::DiceRolled {
            // Confirming straight from staging implies an end-turn request.
            self.request_end_turn(board)?;
        }
        match self.phase {
            TurnPhase::PendingConfirmation => {}
            TurnPhase::AwaitingRoll => return Err(GameError::TurnNotRolled),
            TurnPhase::Committed | TurnPhase::RolledBack => return Err(GameError::TurnComplete),
            TurnPhase::DiceRolled => unreachable!("request_end_turn transitions or errors"),
        }

        match self.mode {
            ConfirmationMode::Batch => {
                self.phase = TurnPhase::Committed;
                tracing::debug!(color = ?self.color, moves = self.log.len(), "turn committed");
                Ok(ConfirmOutcome::Committed(self.log.clone()))
            }
            ConfirmationMode::PerMove => {
                if self.remaining.is_empty()
                    || !rules::has_any_legal_move(board, self.color, &self.remaining)
                {
                    self.phase = TurnPhase::Committed;
                    tracing::debug!(color = ?self.color, moves = self.log.len(), "turn committed");
                    Ok(ConfirmOutcome::Committed(self.log.clone()))
                } else {
                    self.phase = TurnPhase::DiceRolled;
                    Ok(ConfirmOutcome::Staging)
                }
            }
        }
    }

    /// Discard staged work. Batch mode restores the pre-turn snapshot
    /// wholesale and ends the turn in `RolledBack`; per-move mode reverses
    /// only the pending move and keeps the turn open.
    pub fn reject(&mut self, board: &mut BoardState) -> Result<(), GameError> {
        match self.phase {
            TurnPhase::AwaitingRoll => return Err(GameError::TurnNotRolled),
            TurnPhase::DiceRolled | TurnPhase::PendingConfirmation => {}
            TurnPhase::Committed | TurnPhase::RolledBack => return Err(GameError::TurnComplete),
        }

        match self.mode {
            ConfirmationMode::Batch => {
                *board = self.snapshot.clone();
                self.log.clear();
                self.remaining = self.allotment.clone();
                self.phase = TurnPhase::RolledBack;
                tracing::debug!(color = ?self.color, "turn rolled back to snapshot");
                Ok(())
            }
            ConfirmationMode::PerMove => {
                let Some(mv) = self.log.pop() else {
                    // Nothing staged: behave like a whole-turn rollback.
                    *board = self.snapshot.clone();
                    self.phase = TurnPhase::RolledBack;
                    return Ok(());
                };
                board.unapply(&mv)?;
                self.remaining.push(mv.die);
                self.phase = TurnPhase::DiceRolled;
                tracing::debug!(color = ?self.color, die = mv.die, "pending move rejected");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CHECKERS_PER_SIDE;

    fn rolled_turn(board: &BoardState, color: Color, d1: u8, d2: u8) -> TurnController {
        TurnController::resume(board, color, ConfirmationMode::Batch, DiceRoll { d1, d2 })
    }

    #[test]
    fn second_roll_is_refused() {
        let board = BoardState::standard();
        let mut roller = DiceRoller::with_seed(1);
        let mut turn = TurnController::begin(&board, Color::White, ConfirmationMode::Batch);
        turn.roll_dice(&mut roller).unwrap();
        assert_eq!(
            turn.roll_dice(&mut roller),
            Err(GameError::TurnAlreadyRolled)
        );
    }

    #[test]
    fn staging_before_roll_is_refused() {
        let mut board = BoardState::standard();
        let mut turn = TurnController::begin(&board, Color::Black, ConfirmationMode::Batch);
        assert_eq!(
            turn.stage_move(&mut board, Location::Point(0), Location::Point(6)),
            Err(GameError::TurnNotRolled)
        );
    }

    #[test]
    fn end_turn_refused_while_moves_remain() {
        let mut board = BoardState::standard();
        let mut turn = rolled_turn(&board, Color::Black, 6, 5);
        turn.stage_move(&mut board, Location::Point(0), Location::Point(6))
            .unwrap();
        assert_eq!(turn.request_end_turn(&board), Err(GameError::MovesRemaining));
    }

    #[test]
    fn spent_dice_allow_end_turn() {
        let mut board = BoardState::standard();
        let mut turn = rolled_turn(&board, Color::Black, 6, 5);
        turn.stage_move(&mut board, Location::Point(0), Location::Point(6))
            .unwrap();
        turn.stage_move(&mut board, Location::Point(11), Location::Point(16))
            .unwrap();
        assert!(turn.remaining_dice().is_empty());
        turn.request_end_turn(&board).unwrap();
        let outcome = turn.confirm(&board).unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Committed(ref moves) if moves.len() == 2));
        assert_eq!(turn.phase(), TurnPhase::Committed);
    }

    #[test]
    fn unreachable_destination_reports_no_matching_die() {
        let mut board = BoardState::standard();
        let mut turn = rolled_turn(&board, Color::Black, 6, 5);
        assert_eq!(
            turn.stage_move(&mut board, Location::Point(11), Location::Point(13)),
            Err(GameError::NoMatchingDie)
        );
    }

    #[test]
    fn undo_returns_die_and_position() {
        let mut board = BoardState::standard();
        let before = board.clone();
        let mut turn = rolled_turn(&board, Color::Black, 6, 5);
        turn.stage_move(&mut board, Location::Point(0), Location::Point(6))
            .unwrap();
        let undone = turn.undo_last_staged(&mut board).unwrap().unwrap();
        assert_eq!(undone.die, 6);
        assert_eq!(board, before);
        assert_eq!(turn.remaining_dice().len(), 2);
    }

    #[test]
    fn batch_reject_restores_snapshot_exactly() {
        let mut board = BoardState::standard();
        let before = board.clone();
        let mut turn = rolled_turn(&board, Color::Black, 6, 5);
        turn.stage_move(&mut board, Location::Point(0), Location::Point(6))
            .unwrap();
        turn.stage_move(&mut board, Location::Point(11), Location::Point(16))
            .unwrap();
        assert_ne!(board, before);
        turn.reject(&mut board).unwrap();
        assert_eq!(board, before);
        assert_eq!(turn.phase(), TurnPhase::RolledBack);
        assert_eq!(board.total_checkers(Color::Black), CHECKERS_PER_SIDE);
    }

    #[test]
    fn forced_pass_with_blocked_bar_entries() {
        let board = BoardState::from_placements(&[
            (Color::Black, Location::Bar, 1),
            (Color::Black, Location::Point(11), 2),
            (Color::White, Location::Point(3), 2),
            (Color::White, Location::Point(1), 2),
        ]);
        let mut turn = rolled_turn(&board, Color::Black, 4, 2);
        turn.request_end_turn(&board).unwrap();
        let outcome = turn.confirm(&board).unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Committed(ref moves) if moves.is_empty()));
    }

    #[test]
    fn per_move_accept_and_reject_single_moves() {
        let mut board = BoardState::standard();
        let mut turn = TurnController::resume(
            &board,
            Color::Black,
            ConfirmationMode::PerMove,
            DiceRoll { d1: 6, d2: 5 },
        );

        turn.stage_move(&mut board, Location::Point(0), Location::Point(6))
            .unwrap();
        assert_eq!(turn.phase(), TurnPhase::PendingConfirmation);
        // A second stage must wait for the verdict on the first.
        assert_eq!(
            turn.stage_move(&mut board, Location::Point(11), Location::Point(16)),
            Err(GameError::ConfirmationPending)
        );
        assert_eq!(turn.confirm(&board).unwrap(), ConfirmOutcome::Staging);

        // Reject the second move: only that move is reversed.
        let after_first = board.clone();
        turn.stage_move(&mut board, Location::Point(11), Location::Point(16))
            .unwrap();
        turn.reject(&mut board).unwrap();
        assert_eq!(board, after_first);
        assert_eq!(turn.phase(), TurnPhase::DiceRolled);
        assert_eq!(turn.staged_moves().len(), 1);

        // Accept the final move of the allotment: the turn commits.
        turn.stage_move(&mut board, Location::Point(11), Location::Point(16))
            .unwrap();
        let outcome = turn.confirm(&board).unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Committed(ref moves) if moves.len() == 2));
    }

    #[test]
    fn doubles_grant_four_moves() {
        let mut board = BoardState::standard();
        let mut turn = rolled_turn(&board, Color::Black, 3, 3);
        assert_eq!(turn.remaining_dice(), &[3, 3, 3, 3]);
        for _ in 0..2 {
            turn.stage_move(&mut board, Location::Point(0), Location::Point(3))
                .unwrap();
        }
        for _ in 0..2 {
            turn.stage_move(&mut board, Location::Point(16), Location::Point(19))
                .unwrap();
        }
        assert!(turn.remaining_dice().is_empty());
    }
}
