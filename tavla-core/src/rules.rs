//! Move legality: direction, bar priority, occupancy, and bear-off
//!
//! Pure functions over `BoardState`. Nothing here mutates a live board;
//! the combined-move query works on a scratch clone.

use crate::board::{BoardState, Color, Location, Move, NUM_POINTS};
use crate::error::{GameError, RuleViolation};

/// Where a checker from `source` lands with `die`, ignoring occupancy.
/// Overshooting the board resolves to `Off`; bear-off gating happens later.
fn raw_target(color: Color, source: Location, die: u8) -> Option<Location> {
    match source {
        Location::Bar => Some(Location::Point(color.entry_point(die))),
        Location::Point(p) => {
            let target = p as i8 + color.direction() * die as i8;
            if (0..NUM_POINTS as i8).contains(&target) {
                Some(Location::Point(target as u8))
            } else {
                Some(Location::Off)
            }
        }
        Location::Off => None,
    }
}

/// A point is open when it is empty, held by `color`, or holds exactly
/// one opposing checker (a blot)
fn is_open(board: &BoardState, color: Color, point: u8) -> bool {
    let stack = board.point(point);
    match stack.owner {
        None => true,
        Some(owner) if owner == color => true,
        Some(_) => stack.count == 1,
    }
}

/// Exact-pip bear-off, or an overage die used on the furthest-back checker
fn may_bear_off(board: &BoardState, color: Color, point: u8, die: u8) -> bool {
    if !board.is_all_home(color) {
        return false;
    }
    let distance = color.off_distance(point);
    die == distance || (die > distance && board.furthest_point(color) == Some(point))
}

/// Legal destinations for one source and one die value. At most one
/// destination exists per (source, die) pair; an empty result means the
/// die is unusable from that source.
pub fn legal_destinations(
    board: &BoardState,
    color: Color,
    die: u8,
    source: Location,
) -> Vec<Location> {
    if !(1..=6).contains(&die) {
        return vec![];
    }
    // Bar priority: while checkers wait on the bar, only the bar moves.
    if board.bar_count(color) > 0 && source != Location::Bar {
        return vec![];
    }
    if board.checker_count(source, color) == 0 {
        return vec![];
    }

    match source {
        Location::Bar => {
            let entry = color.entry_point(die);
            if is_open(board, color, entry) {
                vec![Location::Point(entry)]
            } else {
                vec![]
            }
        }
        Location::Point(p) => match raw_target(color, source, die) {
            Some(Location::Point(target)) => {
                if is_open(board, color, target) {
                    vec![Location::Point(target)]
                } else {
                    vec![]
                }
            }
            Some(Location::Off) => {
                if may_bear_off(board, color, p, die) {
                    vec![Location::Off]
                } else {
                    vec![]
                }
            }
            _ => vec![],
        },
        Location::Off => vec![],
    }
}

/// Sources with at least one legal move for the remaining dice.
/// While the bar is occupied it is the only candidate.
pub fn legal_sources(board: &BoardState, color: Color, dice: &[u8]) -> Vec<Location> {
    let values = distinct(dice);

    if board.bar_count(color) > 0 {
        let playable = values
            .iter()
            .any(|&die| !legal_destinations(board, color, die, Location::Bar).is_empty());
        return if playable { vec![Location::Bar] } else { vec![] };
    }

    (0..NUM_POINTS as u8)
        .filter(|&p| {
            board.checker_count(Location::Point(p), color) > 0
                && values
                    .iter()
                    .any(|&die| !legal_destinations(board, color, die, Location::Point(p)).is_empty())
        })
        .map(Location::Point)
        .collect()
}

/// Forced-pass detection: false when no (source, die) pair yields a move
pub fn has_any_legal_move(board: &BoardState, color: Color, dice: &[u8]) -> bool {
    !legal_sources(board, color, dice).is_empty()
}

/// A destination reachable by chaining two remaining dice through a legal
/// intermediate point. Pure UI affordance; the two component moves are
/// still staged individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComboMove {
    pub first_die: u8,
    pub second_die: u8,
    /// Intermediate point after the first die
    pub via: u8,
    /// Final point after the second die
    pub dest: u8,
}

/// Two-die destinations from `source`, deduplicated by final point
pub fn combined_destinations(
    board: &BoardState,
    color: Color,
    dice: &[u8],
    source: Location,
) -> Vec<ComboMove> {
    let mut combos: Vec<ComboMove> = Vec::new();
    if dice.len() < 2 {
        return combos;
    }

    for i in 0..dice.len() {
        for j in (i + 1)..dice.len() {
            let mut orders = vec![(dice[i], dice[j])];
            if dice[i] != dice[j] {
                orders.push((dice[j], dice[i]));
            }

            for (first_die, second_die) in orders {
                for mid in legal_destinations(board, color, first_die, source) {
                    let Location::Point(via) = mid else { continue };

                    let mut scratch = board.clone();
                    let hit = scratch.checker_count(mid, color.opponent()) == 1;
                    let first = Move {
                        color,
                        from: source,
                        to: mid,
                        die: first_die,
                        hit,
                    };
                    if scratch.apply(&first).is_err() {
                        continue;
                    }

                    for fin in legal_destinations(&scratch, color, second_die, mid) {
                        let Location::Point(dest) = fin else { continue };
                        if !combos.iter().any(|c| c.dest == dest) {
                            combos.push(ComboMove {
                                first_die,
                                second_die,
                                via,
                                dest,
                            });
                        }
                    }
                }
            }
        }
    }

    combos
}

/// Map a refused (source, destination) pair to the specific violated rule,
/// checked against every remaining die value
pub fn explain_rejection(
    board: &BoardState,
    color: Color,
    dice: &[u8],
    source: Location,
    dest: Location,
) -> GameError {
    if board.bar_count(color) > 0 && source != Location::Bar {
        return GameError::IllegalMove(RuleViolation::BarCheckerMustEnterFirst);
    }
    if board.checker_count(source, color) == 0 {
        return GameError::InvalidMove("source holds no checker of the moving color");
    }

    let values = distinct(dice);
    let reaches = values
        .iter()
        .any(|&die| raw_target(color, source, die) == Some(dest));

    match dest {
        Location::Point(target) if reaches => {
            if !is_open(board, color, target) {
                GameError::IllegalMove(RuleViolation::DestinationBlocked)
            } else {
                GameError::NoMatchingDie
            }
        }
        Location::Point(target) => {
            if let Location::Point(p) = source {
                let step = (target as i8 - p as i8).signum();
                if step != 0 && step != color.direction() {
                    return GameError::IllegalMove(RuleViolation::WrongDirection);
                }
            }
            GameError::NoMatchingDie
        }
        Location::Off => {
            if !board.is_all_home(color) {
                GameError::IllegalMove(RuleViolation::BearOffIneligible)
            } else {
                GameError::IllegalMove(RuleViolation::DieMismatch)
            }
        }
        Location::Bar => GameError::NoMatchingDie,
    }
}

fn distinct(dice: &[u8]) -> Vec<u8> {
    let mut values = dice.to_vec();
    values.sort_unstable();
    values.dedup();
    values
}
