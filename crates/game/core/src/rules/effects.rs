//! The single ability evaluator.
//!
//! Every ability family is interpreted here and nowhere else; live shot
//! execution and host-facing previews call the same functions, so the two
//! can never drift apart. Multi-bearer resolutions scan units in ascending
//! id order, which is the deterministic tie-break throughout the engine.

use crate::board::{self, PieceBase};
use crate::catalog::{Ability, AbilityCondition, AbilityKind, AuraGate, PierceMode, SacrificeTarget};
use crate::env::GameEnv;
use crate::error::Reject;
use crate::rules::shooting::{self, ShootRules};
use crate::rules::shot_plan::{InstanceKind, ShotInstance, ShotPlan};
use crate::state::{GameState, Unit, UnitId};

/// Movement-side blocking bypass (knight legs, elephant eyes).
pub fn ignores_path_blocking(env: &GameEnv<'_>, unit: &Unit) -> bool {
    env.abilities_of(unit)
        .iter()
        .any(|a| matches!(a, Ability::IgnorePathBlocking))
}

/// Whether an allied formation-command bearer lets this soldier step
/// sideways before crossing the river.
pub fn soldier_sideways_granted(state: &GameState, env: &GameEnv<'_>, unit: &Unit) -> bool {
    if unit.base != PieceBase::Soldier {
        return false;
    }
    state.units_of_side(unit.side).any(|ally| {
        env.abilities_of(ally).iter().any(|a| match a {
            Ability::FormationCommand { radius } => ally.pos.chebyshev(unit.pos) <= *radius,
            _ => false,
        })
    })
}

/// Evaluates an ability gate condition. `shooter` is the attacking unit for
/// shot-context conditions; conditions that need one fail without it.
pub fn condition_met(
    state: &GameState,
    bearer: &Unit,
    shooter: Option<&Unit>,
    cond: &AbilityCondition,
) -> bool {
    match cond {
        AbilityCondition::CorpsesGte(n) => state.corpse_count(bearer.side) >= *n,
        AbilityCondition::EnemiesInRangeGte(n) => {
            let Some(shooter) = shooter else {
                return false;
            };
            let enemies = state
                .units_of_side(shooter.side.opponent())
                .filter(|e| shooting::in_shoot_pattern(shooter, e.pos))
                .count() as u32;
            enemies >= *n
        }
        AbilityCondition::AlliedSoldiersGte(n) => state.soldier_count(bearer.side) >= *n,
    }
}

/// Evaluates the shared aura gate block against a bearer/beneficiary pair.
pub fn aura_gate_met(
    state: &GameState,
    env: &GameEnv<'_>,
    bearer: &Unit,
    beneficiary: &Unit,
    gate: &AuraGate,
) -> bool {
    if gate.source_in_palace && !board::in_palace(bearer.side, bearer.pos) {
        return false;
    }
    if gate.beneficiary_in_palace && !board::in_palace(beneficiary.side, beneficiary.pos) {
        return false;
    }
    if let Some(clan) = &gate.clan {
        if env.clan_of(beneficiary) != Some(clan.as_str()) {
            return false;
        }
    }
    if let Some(resonance) = gate.resonance {
        let Some(bearer_clan) = env.clan_of(bearer) else {
            return false;
        };
        let same_clan = state
            .units_of_side(bearer.side)
            .filter(|u| env.clan_of(u) == Some(bearer_clan))
            .count() as u32;
        if same_clan < resonance {
            return false;
        }
    }
    if gate.cross_river && !board::has_crossed_river(beneficiary.side, beneficiary.pos) {
        return false;
    }
    true
}

/// Accumulates blocking/cost overrides for a shot before the base legality
/// check runs. Free-shot charges are recorded in `uses` and committed only
/// when the plan executes.
pub fn apply_before_shoot(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker: &Unit,
    rules: &mut ShootRules,
    uses: &mut Vec<(UnitId, AbilityKind)>,
) {
    for ability in env.abilities_of(attacker) {
        match ability {
            Ability::IgnoreBlocking {
                count,
                all,
                cross_river,
                when,
            } => {
                if *cross_river && !board::has_crossed_river(attacker.side, attacker.pos) {
                    continue;
                }
                if let Some(cond) = when {
                    if !condition_met(state, attacker, Some(attacker), cond) {
                        continue;
                    }
                }
                rules.ignore_blocking_count = rules.ignore_blocking_count.max(*count);
                rules.ignore_blocking_all |= *all;
            }
            Ability::FreeShoot { per_turn } => {
                let used = state
                    .turn_flags
                    .ability_use_count(&attacker.id, AbilityKind::FreeShoot);
                if used < *per_turn && rules.cost_override.is_none() {
                    rules.cost_override = Some(0);
                    uses.push((attacker.id.clone(), AbilityKind::FreeShoot));
                }
            }
            _ => {}
        }
    }
    for ally in state.units_of_side(attacker.side) {
        for ability in env.abilities_of(ally) {
            if let Ability::AuraIgnoreBlocking { count, all, when } = ability {
                if let Some(cond) = when {
                    if !condition_met(state, ally, Some(attacker), cond) {
                        continue;
                    }
                }
                rules.ignore_blocking_count = rules.ignore_blocking_count.max(*count);
                rules.ignore_blocking_all |= *all;
            }
        }
    }
}

/// Adds secondary instances (chain, splash, pierce) to a validated plan.
/// `extra_target` is the caller-chosen chain victim and is rejected when the
/// attacker has no chain ability.
pub fn extend_plan(
    state: &GameState,
    env: &GameEnv<'_>,
    plan: &mut ShotPlan,
    extra_target: Option<&UnitId>,
) -> Result<(), Reject> {
    let attacker = state.unit(&plan.attacker).ok_or(Reject::UnitNotFound)?;
    let target = state.unit(&plan.target).ok_or(Reject::UnitNotFound)?;

    let chain = env.abilities_of(attacker).iter().find_map(|a| match a {
        Ability::Chain { radius, corpses_gte } => Some((*radius, *corpses_gte)),
        _ => None,
    });
    match (chain, extra_target) {
        (Some((radius, corpses_gte)), Some(extra_id)) => {
            let gate_open = state.corpse_count(attacker.side) >= corpses_gte
                || state.status.sacrifice_buff_by_unit.contains_key(&attacker.id);
            if !gate_open {
                return Err(Reject::InvalidTarget);
            }
            let extra = state.unit(extra_id).ok_or(Reject::UnitNotFound)?;
            if extra.side == attacker.side {
                return Err(Reject::NotAnEnemy);
            }
            if extra.id == target.id {
                return Err(Reject::InvalidTarget);
            }
            if target.pos.chebyshev(extra.pos) > radius {
                return Err(Reject::OutOfRange);
            }
            plan.instances.push(ShotInstance {
                kind: InstanceKind::Chain,
                source: attacker.id.clone(),
                target: extra.id.clone(),
                fixed_damage: None,
            });
            plan.ability_uses.push((attacker.id.clone(), AbilityKind::Chain));
        }
        (None, Some(_)) => return Err(Reject::InvalidTarget),
        _ => {}
    }

    for ability in env.abilities_of(attacker) {
        match ability {
            Ability::Splash {
                radius,
                per_turn,
                cross_river,
            } => {
                let used = state
                    .turn_flags
                    .ability_use_count(&attacker.id, AbilityKind::Splash);
                if used >= *per_turn {
                    continue;
                }
                if *cross_river && !board::has_crossed_river(attacker.side, attacker.pos) {
                    continue;
                }
                let mut added = false;
                for enemy in state.units_of_side(attacker.side.opponent()) {
                    if enemy.id == target.id {
                        continue;
                    }
                    if target.pos.chebyshev(enemy.pos) <= *radius {
                        plan.instances.push(ShotInstance {
                            kind: InstanceKind::Splash,
                            source: attacker.id.clone(),
                            target: enemy.id.clone(),
                            fixed_damage: None,
                        });
                        added = true;
                    }
                }
                if added {
                    plan.ability_uses
                        .push((attacker.id.clone(), AbilityKind::Splash));
                }
            }
            Ability::Pierce(mode) => {
                extend_pierce(state, plan, attacker, target, *mode);
            }
            _ => {}
        }
    }
    Ok(())
}

fn extend_pierce(
    state: &GameState,
    plan: &mut ShotPlan,
    attacker: &Unit,
    target: &Unit,
    mode: PierceMode,
) {
    match mode {
        PierceMode::Screen => {
            // The cannon's screen, whichever side it belongs to.
            let screen = shooting::cells_between(attacker.pos, target.pos)
                .find_map(|p| state.unit_at(p));
            if let Some(screen) = screen {
                plan.instances.push(ShotInstance {
                    kind: InstanceKind::Pierce,
                    source: attacker.id.clone(),
                    target: screen.id.clone(),
                    fixed_damage: None,
                });
                plan.ability_uses
                    .push((attacker.id.clone(), AbilityKind::Pierce));
            }
        }
        PierceMode::Line { count } => {
            let dx = (target.pos.x - attacker.pos.x).signum();
            let dy = (target.pos.y - attacker.pos.y).signum();
            if dx != 0 && dy != 0 {
                return;
            }
            let mut hit = 0u32;
            let mut cur = target.pos;
            loop {
                cur = crate::board::Pos::new(cur.x + dx, cur.y + dy);
                if !cur.on_board() || hit >= count {
                    break;
                }
                if let Some(victim) = state.unit_at(cur) {
                    if victim.side != attacker.side {
                        plan.instances.push(ShotInstance {
                            kind: InstanceKind::Pierce,
                            source: attacker.id.clone(),
                            target: victim.id.clone(),
                            fixed_damage: None,
                        });
                        hit += 1;
                    }
                }
            }
            if hit > 0 {
                plan.ability_uses
                    .push((attacker.id.clone(), AbilityKind::Pierce));
            }
        }
    }
}

/// Whether a unit that already shot this turn may shoot again
/// (move-then-shoot grants).
pub fn extra_shot_available(state: &GameState, env: &GameEnv<'_>, attacker: &Unit) -> bool {
    env.abilities_of(attacker).iter().any(|a| match a {
        Ability::MoveThenShoot { per_turn, when } => {
            if !state.turn_flags.moved_this_turn.contains(&attacker.id) {
                return false;
            }
            if let Some(cond) = when {
                if !condition_met(state, attacker, Some(attacker), cond) {
                    return false;
                }
            }
            state
                .turn_flags
                .ability_use_count(&attacker.id, AbilityKind::MoveThenShoot)
                < *per_turn
        }
        _ => false,
    })
}

/// Best revive gold discount among the side's living logistics bearers.
/// Discounts do not stack.
pub fn revive_discount(state: &GameState, env: &GameEnv<'_>, side: crate::board::Side) -> i32 {
    state
        .units_of_side(side)
        .flat_map(|u| env.abilities_of(u))
        .filter_map(|a| match a {
            Ability::LogisticsRevive { discount } => Some(*discount),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

/// The unit's sacrifice ability parameters, if it has one.
pub fn sacrifice_spec(env: &GameEnv<'_>, unit: &Unit) -> Option<(SacrificeTarget, i32, u32)> {
    env.abilities_of(unit).iter().find_map(|a| match a {
        Ability::Sacrifice { target, buff, range } => Some((*target, *buff, *range)),
        _ => None,
    })
}
