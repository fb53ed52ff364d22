//! Static board geometry and piece archetypes.
//!
//! The board is the classical 9×10 Xiangqi grid. Red sits at the bottom
//! (high `y`, palace rows 7..=9) and Black at the top (palace rows 0..=2).
//! All geographic predicates (palace membership, river crossing, forward
//! direction) are side-relative.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::stats::{AttackKey, AttackStat, DefStat, UnitStats};

/// Board width in columns (`x` in `0..=8`).
pub const BOARD_WIDTH: i32 = 9;
/// Board height in rows (`y` in `0..=9`).
pub const BOARD_HEIGHT: i32 = 10;

/// One of the two players.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Red,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// Forward movement direction along `y` (soldiers advance this way).
    pub fn forward_dy(self) -> i32 {
        match self {
            Side::Red => -1,
            Side::Black => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Discrete board position in grid coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn on_board(self) -> bool {
        (0..BOARD_WIDTH).contains(&self.x) && (0..BOARD_HEIGHT).contains(&self.y)
    }

    /// Chebyshev distance, used by every radius-based ability.
    pub fn chebyshev(self, other: Pos) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Returns true if `pos` lies inside `side`'s 3×3 palace.
pub fn in_palace(side: Side, pos: Pos) -> bool {
    let x_ok = (3..=5).contains(&pos.x);
    match side {
        Side::Red => x_ok && (7..=9).contains(&pos.y),
        Side::Black => x_ok && (0..=2).contains(&pos.y),
    }
}

/// Returns true if `pos` is on the far side of the river for `side`.
pub fn has_crossed_river(side: Side, pos: Pos) -> bool {
    match side {
        Side::Red => pos.y <= 4,
        Side::Black => pos.y >= 5,
    }
}

/// Piece archetype. Each base fixes movement/shooting geometry and the
/// unenchanted statline.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum PieceBase {
    King,
    Advisor,
    Elephant,
    Rook,
    Knight,
    Cannon,
    Soldier,
}

impl PieceBase {
    /// Base combat stats for an unenchanted unit of this archetype.
    pub fn base_stats(self) -> UnitStats {
        let (hp, atk, def) = match self {
            PieceBase::King => (8, 2, vec![DefStat::new(AttackKey::Physical, 1), DefStat::new(AttackKey::Magic, 1)]),
            PieceBase::Advisor => (5, 2, vec![DefStat::new(AttackKey::Physical, 1)]),
            PieceBase::Elephant => (6, 2, vec![DefStat::new(AttackKey::Physical, 2)]),
            PieceBase::Rook => (7, 3, vec![DefStat::new(AttackKey::Physical, 1)]),
            PieceBase::Knight => (6, 3, vec![DefStat::new(AttackKey::Physical, 1)]),
            PieceBase::Cannon => (6, 3, vec![]),
            PieceBase::Soldier => (4, 2, vec![]),
        };
        UnitStats {
            hp,
            atk: AttackStat::new(AttackKey::Physical, atk),
            def,
        }
    }
}

impl fmt::Display for PieceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}
