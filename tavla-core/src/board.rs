//! Board position: point stacks, the bar, and borne-off trays
//!
//! `BoardState` is a plain value type. Cloning it is the snapshot
//! operation the turn machinery relies on, and `PartialEq` makes
//! rollback verifiable bit-for-bit.

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Number of points on the board
pub const NUM_POINTS: usize = 24;

/// Checkers per side
pub const CHECKERS_PER_SIDE: u8 = 15;

/// Checker color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Movement direction along points 0-23.
    /// White travels 23 -> 0, Black travels 0 -> 23.
    pub fn direction(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Point reached when re-entering from the bar with `die`
    pub fn entry_point(self, die: u8) -> u8 {
        match self {
            Color::White => 24 - die,
            Color::Black => die - 1,
        }
    }

    /// Home quadrant: the six points nearest the bear-off edge
    pub fn home_points(self) -> RangeInclusive<u8> {
        match self {
            Color::White => 0..=5,
            Color::Black => 18..=23,
        }
    }

    /// Pips from `point` to this color's bear-off edge
    pub fn off_distance(self, point: u8) -> u8 {
        match self {
            Color::White => point + 1,
            Color::Black => 24 - point,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A place a checker can occupy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Numbered point, 0-23
    Point(u8),
    /// Holding area for hit checkers (per color by context)
    Bar,
    /// Borne-off tray (per color by context)
    Off,
}

/// Checkers stacked on a single point.
/// `owner` is `Some` iff `count > 0`; mixed occupancy is never legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointStack {
    pub owner: Option<Color>,
    pub count: u8,
}

/// One applied checker move, recorded so it can be reversed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub color: Color,
    pub from: Location,
    pub to: Location,
    /// Die value the move consumed
    pub die: u8,
    /// Whether an opposing blot was hit at the destination
    pub hit: bool,
}

/// Canonical position: 24 point stacks plus per-color bar and off counters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    points: [PointStack; NUM_POINTS],
    bar: [u8; 2],
    borne_off: [u8; 2],
}

impl BoardState {
    /// Empty board, no checkers anywhere
    pub fn empty() -> Self {
        Self {
            points: [PointStack::default(); NUM_POINTS],
            bar: [0; 2],
            borne_off: [0; 2],
        }
    }

    /// The fixed standard opening arrangement.
    /// White: 23x2, 12x5, 7x3, 5x5. Black: 0x2, 11x5, 16x3, 18x5.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        for &(point, count) in &[(23, 2), (12, 5), (7, 3), (5, 5)] {
            board.place(Color::White, Location::Point(point), count);
        }
        for &(point, count) in &[(0, 2), (11, 5), (16, 3), (18, 5)] {
            board.place(Color::Black, Location::Point(point), count);
        }
        board
    }

    /// Build an arbitrary position for setup or testing
    pub fn from_placements(placements: &[(Color, Location, u8)]) -> Self {
        let mut board = Self::empty();
        for &(color, location, count) in placements {
            board.place(color, location, count);
        }
        board
    }

    fn place(&mut self, color: Color, location: Location, count: u8) {
        match location {
            Location::Point(p) => {
                let stack = &mut self.points[p as usize];
                stack.owner = Some(color);
                stack.count += count;
            }
            Location::Bar => self.bar[color.index()] += count,
            Location::Off => self.borne_off[color.index()] += count,
        }
    }

    /// Stack on a single point
    pub fn point(&self, point: u8) -> PointStack {
        if (point as usize) < NUM_POINTS {
            self.points[point as usize]
        } else {
            PointStack::default()
        }
    }

    /// Checkers of `color` at `location`
    pub fn checker_count(&self, location: Location, color: Color) -> u8 {
        match location {
            Location::Point(p) => {
                let stack = self.point(p);
                if stack.owner == Some(color) {
                    stack.count
                } else {
                    0
                }
            }
            Location::Bar => self.bar[color.index()],
            Location::Off => self.borne_off[color.index()],
        }
    }

    pub fn bar_count(&self, color: Color) -> u8 {
        self.bar[color.index()]
    }

    pub fn borne_off_count(&self, color: Color) -> u8 {
        self.borne_off[color.index()]
    }

    /// Checkers of `color` anywhere: points, bar, and off
    pub fn total_checkers(&self, color: Color) -> u8 {
        let on_points: u8 = (0..NUM_POINTS as u8)
            .map(|p| self.checker_count(Location::Point(p), color))
            .sum();
        on_points + self.bar[color.index()] + self.borne_off[color.index()]
    }

    /// True when every checker of `color` is off the bar and either in the
    /// home quadrant or already borne off. Gates bear-off legality.
    pub fn is_all_home(&self, color: Color) -> bool {
        if self.bar[color.index()] > 0 {
            return false;
        }
        (0..NUM_POINTS as u8)
            .filter(|p| !color.home_points().contains(p))
            .all(|p| self.checker_count(Location::Point(p), color) == 0)
    }

    /// All 15 checkers borne off
    pub fn has_won(&self, color: Color) -> bool {
        self.borne_off[color.index()] == CHECKERS_PER_SIDE
    }

    /// Occupied point of `color` furthest from its bear-off edge
    pub fn furthest_point(&self, color: Color) -> Option<u8> {
        let occupied =
            (0..NUM_POINTS as u8).filter(|&p| self.checker_count(Location::Point(p), color) > 0);
        match color {
            Color::White => occupied.max(),
            Color::Black => occupied.min(),
        }
    }

    /// Apply `mv`, mutating counts. A hit removes the opposing blot from
    /// the destination and puts it on the opponent's bar. Structural
    /// failures (empty source, blocked destination) leave the board
    /// untouched and report `InvalidMove`.
    pub fn apply(&mut self, mv: &Move) -> Result<(), GameError> {
        self.check_apply(mv)?;

        match mv.from {
            Location::Point(p) => {
                let stack = &mut self.points[p as usize];
                stack.count -= 1;
                if stack.count == 0 {
                    stack.owner = None;
                }
            }
            Location::Bar => self.bar[mv.color.index()] -= 1,
            Location::Off => unreachable!("checked above"),
        }

        match mv.to {
            Location::Point(p) => {
                let opponent = mv.color.opponent();
                if mv.hit {
                    self.points[p as usize] = PointStack {
                        owner: Some(mv.color),
                        count: 1,
                    };
                    self.bar[opponent.index()] += 1;
                } else {
                    let stack = &mut self.points[p as usize];
                    stack.owner = Some(mv.color);
                    stack.count += 1;
                }
            }
            Location::Off => self.borne_off[mv.color.index()] += 1,
            Location::Bar => unreachable!("checked above"),
        }

        Ok(())
    }

    /// Validate `mv` against the live position without mutating anything
    fn check_apply(&self, mv: &Move) -> Result<(), GameError> {
        match mv.from {
            Location::Point(p) => {
                if (p as usize) >= NUM_POINTS {
                    return Err(GameError::InvalidMove("source point out of range"));
                }
                if self.checker_count(mv.from, mv.color) == 0 {
                    return Err(GameError::InvalidMove(
                        "source holds no checker of the moving color",
                    ));
                }
            }
            Location::Bar => {
                if self.bar[mv.color.index()] == 0 {
                    return Err(GameError::InvalidMove("bar holds no checker to enter"));
                }
            }
            Location::Off => {
                return Err(GameError::InvalidMove("checkers cannot leave the off tray"));
            }
        }

        match mv.to {
            Location::Point(p) => {
                if (p as usize) >= NUM_POINTS {
                    return Err(GameError::InvalidMove("destination point out of range"));
                }
                let opposing = self.checker_count(mv.to, mv.color.opponent());
                if opposing >= 2 {
                    return Err(GameError::InvalidMove(
                        "destination held by an opposing wall",
                    ));
                }
                if (opposing == 1) != mv.hit {
                    return Err(GameError::InvalidMove(
                        "hit flag disagrees with the destination stack",
                    ));
                }
            }
            Location::Off => {
                if mv.hit {
                    return Err(GameError::InvalidMove("bear-off cannot hit"));
                }
            }
            Location::Bar => {
                return Err(GameError::InvalidMove("moves never target the bar"));
            }
        }

        Ok(())
    }

    /// Reverse a previously applied `mv`, reinstating a hit blot from the
    /// opponent's bar when one was removed
    pub fn unapply(&mut self, mv: &Move) -> Result<(), GameError> {
        // Take the moved checker back off the destination first.
        match mv.to {
            Location::Point(p) => {
                if self.checker_count(mv.to, mv.color) == 0 {
                    return Err(GameError::InvalidMove(
                        "undo target holds no checker of the moving color",
                    ));
                }
                let stack = &mut self.points[p as usize];
                stack.count -= 1;
                if stack.count == 0 {
                    stack.owner = None;
                }
                if mv.hit {
                    let opponent = mv.color.opponent();
                    if self.bar[opponent.index()] == 0 {
                        return Err(GameError::InvalidMove(
                            "undo expects a hit checker on the opponent's bar",
                        ));
                    }
                    self.bar[opponent.index()] -= 1;
                    self.points[p as usize] = PointStack {
                        owner: Some(opponent),
                        count: 1,
                    };
                }
            }
            Location::Off => {
                if self.borne_off[mv.color.index()] == 0 {
                    return Err(GameError::InvalidMove("undo expects a borne-off checker"));
                }
                self.borne_off[mv.color.index()] -= 1;
            }
            Location::Bar => return Err(GameError::InvalidMove("moves never target the bar")),
        }

        match mv.from {
            Location::Point(p) => {
                let stack = &mut self.points[p as usize];
                if stack.owner == Some(mv.color.opponent()) {
                    return Err(GameError::InvalidMove(
                        "undo source is held by the opponent",
                    ));
                }
                stack.owner = Some(mv.color);
                stack.count += 1;
            }
            Location::Bar => self.bar[mv.color.index()] += 1,
            Location::Off => return Err(GameError::InvalidMove("checkers cannot leave the off tray")),
        }

        Ok(())
    }
}
