//! Ranged-attack legality.
//!
//! `can_shoot` checks preconditions in a fixed order (phase, ownership,
//! target side, mana, shot availability) and then delegates to per-base
//! range/line-of-sight/blocking geometry. Ability effects participate via
//! the [`ShootRules`] context mutated by the before-shoot hook.

use crate::board::{PieceBase, Pos};
use crate::env::GameEnv;
use crate::error::Reject;
use crate::rules::effects;
use crate::state::{GameState, TurnPhase, Unit, UnitId};

/// Mutable shot-rule context. Before-shoot ability handlers accumulate
/// overrides here prior to the base legality check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShootRules {
    /// Number of intervening blockers the shooter may ignore.
    pub ignore_blocking_count: u32,
    /// Ignore all blockers regardless of count.
    pub ignore_blocking_all: bool,
    /// Mana cost override (free-shot effects set this to zero).
    pub cost_override: Option<i32>,
}

impl ShootRules {
    pub fn allowance(&self) -> u32 {
        if self.ignore_blocking_all {
            u32::MAX
        } else {
            self.ignore_blocking_count
        }
    }
}

/// Effective mana cost of a shot for this attacker under the given context.
pub fn effective_shoot_cost(state: &GameState, rules: &ShootRules, attacker: &UnitId) -> i32 {
    if state.turn_flags.free_shot_granted.contains(attacker) {
        return 0;
    }
    rules.cost_override.unwrap_or(state.rules.shoot_mana_cost)
}

/// Full shot legality check. `shoot_rules` carries any ability overrides
/// already accumulated for this shot.
pub fn can_shoot(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker_id: &UnitId,
    target_id: &UnitId,
    shoot_rules: &ShootRules,
) -> Result<(), Reject> {
    if state.turn.phase != TurnPhase::Combat {
        return Err(Reject::WrongPhase);
    }
    let attacker = state.unit(attacker_id).ok_or(Reject::UnitNotFound)?;
    if attacker.side != state.turn.side {
        return Err(Reject::NotYourUnit);
    }
    let target = state.unit(target_id).ok_or(Reject::UnitNotFound)?;
    if target.side == attacker.side {
        return Err(Reject::NotAnEnemy);
    }
    let cost = effective_shoot_cost(state, shoot_rules, attacker_id);
    if state.resources.get(attacker.side).mana < cost {
        return Err(Reject::NotEnoughMana);
    }
    if state.turn_flags.shot_used.contains(attacker_id)
        && !effects::extra_shot_available(state, env, attacker)
    {
        return Err(Reject::AlreadyShot);
    }
    shoot_geometry(state, attacker, target, shoot_rules)
}

/// Per-base range and blocking rules, independent of turn bookkeeping.
pub fn shoot_geometry(
    state: &GameState,
    attacker: &Unit,
    target: &Unit,
    shoot_rules: &ShootRules,
) -> Result<(), Reject> {
    let from = attacker.pos;
    let to = target.pos;
    match attacker.base {
        PieceBase::Rook => {
            let blockers = blockers_between(state, from, to).ok_or(Reject::OutOfRange)?;
            if blockers > shoot_rules.allowance() {
                return Err(Reject::Blocked);
            }
            Ok(())
        }
        PieceBase::Cannon => {
            let blockers = blockers_between(state, from, to).ok_or(Reject::OutOfRange)?;
            let ignoring = shoot_rules.ignore_blocking_all || shoot_rules.ignore_blocking_count > 0;
            match blockers {
                1 => Ok(()),
                0 if ignoring => Ok(()),
                0 => Err(Reject::NeedScreen),
                _ => Err(Reject::Blocked),
            }
        }
        PieceBase::King => {
            if ortho_distance(from, to) == Some(1) {
                return Ok(());
            }
            // Facing generals: an unblocked shared file between the kings.
            if target.base == PieceBase::King && from.x == to.x {
                let blockers = blockers_between(state, from, to).ok_or(Reject::OutOfRange)?;
                if blockers == 0 {
                    return Ok(());
                }
                return Err(Reject::Blocked);
            }
            Err(Reject::OutOfRange)
        }
        PieceBase::Advisor => {
            let (dx, dy) = ((to.x - from.x).abs(), (to.y - from.y).abs());
            if dx == 1 && dy == 1 {
                Ok(())
            } else {
                Err(Reject::OutOfRange)
            }
        }
        PieceBase::Elephant => {
            let (dx, dy) = (to.x - from.x, to.y - from.y);
            if dx.abs() != 2 || dy.abs() != 2 {
                return Err(Reject::OutOfRange);
            }
            let eye = Pos::new(from.x + dx / 2, from.y + dy / 2);
            if state.is_occupied(eye) {
                return Err(Reject::Blocked);
            }
            Ok(())
        }
        PieceBase::Knight => {
            let (dx, dy) = (to.x - from.x, to.y - from.y);
            let l_shape = (dx.abs() == 1 && dy.abs() == 2) || (dx.abs() == 2 && dy.abs() == 1);
            if !l_shape {
                return Err(Reject::OutOfRange);
            }
            let leg = if dy.abs() == 2 {
                Pos::new(from.x, from.y + dy / 2)
            } else {
                Pos::new(from.x + dx / 2, from.y)
            };
            if state.is_occupied(leg) {
                return Err(Reject::Blocked);
            }
            Ok(())
        }
        PieceBase::Soldier => {
            let forward = to.y - from.y == attacker.side.forward_dy() && to.x == from.x;
            let sideways = to.y == from.y
                && (to.x - from.x).abs() == 1
                && crate::board::has_crossed_river(attacker.side, from);
            if forward || sideways {
                Ok(())
            } else {
                Err(Reject::OutOfRange)
            }
        }
    }
}

/// Geometry-only pattern membership (blocking ignored). Used by
/// enemies-in-range ability conditions.
pub fn in_shoot_pattern(attacker: &Unit, target_pos: Pos) -> bool {
    let from = attacker.pos;
    let to = target_pos;
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    match attacker.base {
        PieceBase::Rook | PieceBase::Cannon => (dx == 0) != (dy == 0),
        PieceBase::King => dx.abs() + dy.abs() == 1 || (dx == 0 && dy != 0),
        PieceBase::Advisor => dx.abs() == 1 && dy.abs() == 1,
        PieceBase::Elephant => dx.abs() == 2 && dy.abs() == 2,
        PieceBase::Knight => (dx.abs() == 1 && dy.abs() == 2) || (dx.abs() == 2 && dy.abs() == 1),
        PieceBase::Soldier => {
            (dx == 0 && dy == attacker.side.forward_dy())
                || (dy == 0
                    && dx.abs() == 1
                    && crate::board::has_crossed_river(attacker.side, from))
        }
    }
}

/// Occupied cells strictly between two aligned positions, or `None` when the
/// positions do not share a rank or file.
pub fn blockers_between(state: &GameState, a: Pos, b: Pos) -> Option<u32> {
    if a == b || (a.x != b.x && a.y != b.y) {
        return None;
    }
    Some(cells_between(a, b).filter(|&p| state.is_occupied(p)).count() as u32)
}

/// Cells strictly between two aligned positions, walking from `a` to `b`.
pub fn cells_between(a: Pos, b: Pos) -> impl Iterator<Item = Pos> {
    let dx = (b.x - a.x).signum();
    let dy = (b.y - a.y).signum();
    let steps = (b.x - a.x).abs().max((b.y - a.y).abs());
    (1..steps).map(move |i| Pos::new(a.x + dx * i, a.y + dy * i))
}

fn ortho_distance(a: Pos, b: Pos) -> Option<i32> {
    if a.x == b.x {
        Some((a.y - b.y).abs())
    } else if a.y == b.y {
        Some((a.x - b.x).abs())
    } else {
        None
    }
}
