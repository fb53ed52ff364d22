//! Per-base movement legality.
//!
//! Pure function of board occupancy and one unit's base/side/position.
//! Movement never captures: destinations must be empty.

use crate::board::{self, PieceBase, Pos, Side};
use crate::env::GameEnv;
use crate::rules::effects;
use crate::state::{GameState, UnitId};

/// All legal destinations for one unit. Unknown units yield no moves.
pub fn legal_moves(state: &GameState, env: &GameEnv<'_>, unit_id: &UnitId) -> Vec<Pos> {
    let Some(unit) = state.unit(unit_id) else {
        return Vec::new();
    };
    let ignore_path = effects::ignores_path_blocking(env, unit);

    let mut out = Vec::new();
    match unit.base {
        PieceBase::Rook | PieceBase::Cannon => slide_moves(state, unit.pos, &mut out),
        PieceBase::Knight => knight_moves(state, unit.pos, ignore_path, &mut out),
        PieceBase::Elephant => elephant_moves(state, unit.pos, unit.side, ignore_path, &mut out),
        PieceBase::Advisor => advisor_moves(state, unit.pos, unit.side, &mut out),
        PieceBase::King => king_moves(state, unit.pos, unit.side, &mut out),
        PieceBase::Soldier => {
            let sideways = board::has_crossed_river(unit.side, unit.pos)
                || effects::soldier_sideways_granted(state, env, unit);
            soldier_moves(state, unit.pos, unit.side, sideways, &mut out);
        }
    }
    out
}

pub fn is_legal_move(state: &GameState, env: &GameEnv<'_>, unit_id: &UnitId, to: Pos) -> bool {
    legal_moves(state, env, unit_id).contains(&to)
}

const ORTHO: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn push_if_free(state: &GameState, pos: Pos, out: &mut Vec<Pos>) {
    if pos.on_board() && !state.is_occupied(pos) {
        out.push(pos);
    }
}

/// Rook and cannon movement: orthogonal slides that stop before, never onto,
/// the first occupier.
fn slide_moves(state: &GameState, from: Pos, out: &mut Vec<Pos>) {
    for (dx, dy) in ORTHO {
        let mut cur = Pos::new(from.x + dx, from.y + dy);
        while cur.on_board() && !state.is_occupied(cur) {
            out.push(cur);
            cur = Pos::new(cur.x + dx, cur.y + dy);
        }
    }
}

/// Classic L-shape; the adjacent orthogonal "leg" cell blocks when occupied
/// by either side.
fn knight_moves(state: &GameState, from: Pos, ignore_path: bool, out: &mut Vec<Pos>) {
    const JUMPS: [((i32, i32), (i32, i32)); 8] = [
        ((1, 2), (0, 1)),
        ((-1, 2), (0, 1)),
        ((1, -2), (0, -1)),
        ((-1, -2), (0, -1)),
        ((2, 1), (1, 0)),
        ((2, -1), (1, 0)),
        ((-2, 1), (-1, 0)),
        ((-2, -1), (-1, 0)),
    ];
    for ((dx, dy), (lx, ly)) in JUMPS {
        let leg = Pos::new(from.x + lx, from.y + ly);
        if !ignore_path && state.is_occupied(leg) {
            continue;
        }
        push_if_free(state, Pos::new(from.x + dx, from.y + dy), out);
    }
}

/// Two diagonal steps, blocked by an occupied midpoint "eye"; may not cross
/// the unit's own river boundary.
fn elephant_moves(state: &GameState, from: Pos, side: Side, ignore_path: bool, out: &mut Vec<Pos>) {
    for (dx, dy) in [(2, 2), (2, -2), (-2, 2), (-2, -2)] {
        let eye = Pos::new(from.x + dx / 2, from.y + dy / 2);
        if !ignore_path && state.is_occupied(eye) {
            continue;
        }
        let dest = Pos::new(from.x + dx, from.y + dy);
        if board::has_crossed_river(side, dest) {
            continue;
        }
        push_if_free(state, dest, out);
    }
}

fn advisor_moves(state: &GameState, from: Pos, side: Side, out: &mut Vec<Pos>) {
    for (dx, dy) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let dest = Pos::new(from.x + dx, from.y + dy);
        if board::in_palace(side, dest) {
            push_if_free(state, dest, out);
        }
    }
}

fn king_moves(state: &GameState, from: Pos, side: Side, out: &mut Vec<Pos>) {
    for (dx, dy) in ORTHO {
        let dest = Pos::new(from.x + dx, from.y + dy);
        if board::in_palace(side, dest) {
            push_if_free(state, dest, out);
        }
    }
}

fn soldier_moves(state: &GameState, from: Pos, side: Side, sideways: bool, out: &mut Vec<Pos>) {
    push_if_free(state, Pos::new(from.x, from.y + side.forward_dy()), out);
    if sideways {
        push_if_free(state, Pos::new(from.x - 1, from.y), out);
        push_if_free(state, Pos::new(from.x + 1, from.y), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::state::{RulesConfig, Unit, create_initial_state};

    fn fresh() -> (Catalog, GameState) {
        let catalog = Catalog::default();
        let state = {
            let env = GameEnv::new(&catalog);
            create_initial_state(&env, RulesConfig::default())
        };
        (catalog, state)
    }

    fn place(state: &mut GameState, id: &str, side: Side, base: PieceBase, pos: Pos) -> UnitId {
        let id = UnitId::new(id);
        state
            .units
            .insert(id.clone(), Unit::spawn(id.clone(), side, base, pos));
        id
    }

    #[test]
    fn rook_slides_until_blocked() {
        let (catalog, state) = fresh();
        let env = GameEnv::new(&catalog);
        // Left red rook at (0,9): file blocked by its own soldier at (0,6).
        let moves = legal_moves(&state, &env, &UnitId::new("red:rook:0"));
        assert!(moves.contains(&Pos::new(0, 8)));
        assert!(moves.contains(&Pos::new(0, 7)));
        assert!(!moves.contains(&Pos::new(0, 6)));
        assert!(!moves.contains(&Pos::new(0, 5)));
    }

    #[test]
    fn knight_leg_blocks() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        let knight = place(&mut state, "red:knight:9", Side::Red, PieceBase::Knight, Pos::new(4, 5));
        let before = legal_moves(&state, &env, &knight);
        assert!(before.contains(&Pos::new(5, 3)));
        place(&mut state, "red:soldier:9", Side::Red, PieceBase::Soldier, Pos::new(4, 4));
        let after = legal_moves(&state, &env, &knight);
        assert!(!after.contains(&Pos::new(5, 3)));
        assert!(!after.contains(&Pos::new(3, 3)));
        // Horizontal jumps use a different leg and stay legal.
        assert!(after.contains(&Pos::new(6, 4)));
    }

    #[test]
    fn elephant_cannot_cross_river() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        let elephant =
            place(&mut state, "red:elephant:9", Side::Red, PieceBase::Elephant, Pos::new(4, 5));
        let moves = legal_moves(&state, &env, &elephant);
        // (2,3)/(6,3) would cross the river for red.
        assert!(!moves.contains(&Pos::new(2, 3)));
        assert!(!moves.contains(&Pos::new(6, 3)));
        assert!(moves.contains(&Pos::new(2, 7)));
    }

    #[test]
    fn advisor_and_king_stay_in_palace() {
        let (catalog, state) = fresh();
        let env = GameEnv::new(&catalog);
        let advisor_moves = legal_moves(&state, &env, &UnitId::new("red:advisor:0"));
        assert_eq!(advisor_moves, vec![Pos::new(4, 8)]);
        let king_moves = legal_moves(&state, &env, &UnitId::new("red:king:0"));
        assert_eq!(king_moves, vec![Pos::new(4, 8)]);
    }

    #[test]
    fn soldier_moves_forward_then_sideways_after_crossing() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        let home = place(&mut state, "red:soldier:9", Side::Red, PieceBase::Soldier, Pos::new(4, 5));
        let moves = legal_moves(&state, &env, &home);
        assert_eq!(moves, vec![Pos::new(4, 4)]);
        // (1,4) keeps every destination clear of the initial layout.
        let crossed =
            place(&mut state, "red:soldier:8", Side::Red, PieceBase::Soldier, Pos::new(1, 4));
        let moves = legal_moves(&state, &env, &crossed);
        assert!(moves.contains(&Pos::new(1, 3)));
        assert!(moves.contains(&Pos::new(0, 4)));
        assert!(moves.contains(&Pos::new(2, 4)));
        // Never backward.
        assert!(!moves.contains(&Pos::new(1, 5)));
        // An occupied forward square stays off the list: black's soldier
        // holds (2,3).
        let blocked =
            place(&mut state, "red:soldier:7", Side::Red, PieceBase::Soldier, Pos::new(2, 4));
        let moves = legal_moves(&state, &env, &blocked);
        assert!(!moves.contains(&Pos::new(2, 3)));
        assert!(moves.contains(&Pos::new(3, 4)));
    }
}
