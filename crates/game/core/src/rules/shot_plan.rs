//! Shot plans: build once, preview or execute.
//!
//! A plan is the full resolved description of one shot: the validated
//! attacker/target pair, accumulated rule overrides, and every damage
//! instance (direct, chain, splash, pierce) it will produce. Hosts preview
//! plans without touching state; the reducer executes them. Both paths go
//! through the same builder, so a previewed shot can never resolve
//! differently when fired.

use serde::{Deserialize, Serialize};

use crate::board::{self, PieceBase, Side};
use crate::catalog::{Ability, AbilityKind};
use crate::env::GameEnv;
use crate::error::Reject;
use crate::event::Event;
use crate::rng::{RngMode, RngState};
use crate::rules::{damage, effects, shooting};
use crate::rules::shooting::ShootRules;
use crate::state::{CorpseEntry, GameState, UnitId};

/// Damage instance categories, in resolution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceKind {
    Direct,
    Chain,
    Splash,
    Pierce,
    /// Defender reflection; produced during execution, never planned.
    Counter,
    /// Death-burst cascade; produced during execution, never planned.
    OnDeath,
}

impl InstanceKind {
    /// Resolution priority. Instances resolve in ascending priority, with
    /// (source, target) id order breaking ties.
    pub fn priority(self) -> u8 {
        match self {
            InstanceKind::Direct => 0,
            InstanceKind::Chain => 1,
            InstanceKind::Splash => 2,
            InstanceKind::Pierce => 3,
            InstanceKind::Counter => 4,
            InstanceKind::OnDeath => 5,
        }
    }
}

/// One planned damage application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotInstance {
    pub kind: InstanceKind,
    pub source: UnitId,
    pub target: UnitId,
    /// Bypasses the damage formula entirely when set.
    #[serde(default)]
    pub fixed_damage: Option<i32>,
}

/// A fully resolved shot, ready to preview or execute.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotPlan {
    pub attacker: UnitId,
    pub target: UnitId,
    pub shoot_rules: ShootRules,
    pub instances: Vec<ShotInstance>,
    /// Per-turn ability charges committed when the plan executes.
    pub ability_uses: Vec<(UnitId, AbilityKind)>,
}

impl ShotPlan {
    /// A plan holding only the direct instance, before extension.
    pub fn direct(attacker: UnitId, target: UnitId) -> Self {
        let instance = ShotInstance {
            kind: InstanceKind::Direct,
            source: attacker.clone(),
            target: target.clone(),
            fixed_damage: None,
        };
        Self {
            attacker,
            target,
            shoot_rules: ShootRules::default(),
            instances: vec![instance],
            ability_uses: Vec::new(),
        }
    }

    /// Instances in resolution order.
    pub fn ordered_instances(&self) -> Vec<ShotInstance> {
        let mut out = self.instances.clone();
        out.sort_by(|a, b| {
            (a.kind.priority(), &a.source, &a.target)
                .cmp(&(b.kind.priority(), &b.source, &b.target))
        });
        out
    }
}

/// Validates a shot and resolves every instance it will produce.
pub fn build_shot_plan(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker_id: &UnitId,
    target_id: &UnitId,
    extra_target: Option<&UnitId>,
) -> Result<ShotPlan, Reject> {
    let attacker = state.unit(attacker_id).ok_or(Reject::UnitNotFound)?;
    let mut plan = ShotPlan::direct(attacker_id.clone(), target_id.clone());
    effects::apply_before_shoot(state, env, attacker, &mut plan.shoot_rules, &mut plan.ability_uses);
    shooting::can_shoot(state, env, attacker_id, target_id, &plan.shoot_rules)?;
    effects::extend_plan(state, env, &mut plan, extra_target)?;
    Ok(plan)
}

/// Result of executing a plan: the successor state plus the event feed.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotOutcome {
    pub state: GameState,
    pub events: Vec<Event>,
}

/// Executes a plan against a snapshot. The input state is never mutated;
/// a rejection returns with no partial effects.
pub fn execute_shot_plan(
    state: &GameState,
    env: &GameEnv<'_>,
    plan: &ShotPlan,
) -> Result<ShotOutcome, Reject> {
    let mut work = state.clone();
    let mut events = Vec::new();

    let attacker = work.unit(&plan.attacker).cloned().ok_or(Reject::UnitNotFound)?;
    let side = attacker.side;

    let is_extra_shot = work.turn_flags.shot_used.contains(&plan.attacker);
    if is_extra_shot && !effects::extra_shot_available(&work, env, &attacker) {
        return Err(Reject::AlreadyShot);
    }
    let cost = shooting::effective_shoot_cost(&work, &plan.shoot_rules, &plan.attacker);
    if work.resources.get(side).mana < cost {
        return Err(Reject::NotEnoughMana);
    }

    work.turn_flags.free_shot_granted.remove(&plan.attacker);
    work.resources.get_mut(side).mana -= cost;
    work.turn_flags.shot_used.insert(plan.attacker.clone());
    if is_extra_shot {
        work.turn_flags
            .bump_ability_use(&plan.attacker, AbilityKind::MoveThenShoot);
        events.push(Event::AbilityTriggered {
            unit: plan.attacker.clone(),
            kind: AbilityKind::MoveThenShoot,
        });
    }
    for (unit, kind) in &plan.ability_uses {
        work.turn_flags.bump_ability_use(unit, *kind);
        events.push(Event::AbilityTriggered {
            unit: unit.clone(),
            kind: *kind,
        });
    }

    events.push(Event::ShotFired {
        attacker: plan.attacker.clone(),
        target: plan.target.clone(),
    });
    let sides = work.rules.dice_sides;
    let dice = roll(&mut work, sides);
    events.push(Event::DiceRolled { value: dice });

    // First delivered hit on a king this shot, for counter resolution.
    let mut king_hit: Option<(Side, UnitId)> = None;
    // Raw damage of the direct hit; splash deals that amount wholesale
    // instead of re-running the formula against each bystander.
    let mut direct_raw: Option<i32> = None;

    for inst in plan.ordered_instances() {
        let Some(source) = work.unit(&inst.source).cloned() else {
            continue;
        };
        let Some(target) = work.unit(&inst.target).cloned() else {
            continue;
        };
        let raw = match (inst.fixed_damage, inst.kind) {
            (Some(fixed), _) => fixed,
            (None, InstanceKind::Splash) => direct_raw
                .unwrap_or_else(|| damage::compute_raw_damage(&work, env, &source, &target, dice)),
            (None, _) => damage::compute_raw_damage(&work, env, &source, &target, dice),
        };
        if inst.kind == InstanceKind::Direct {
            direct_raw = Some(raw);
        }

        // Palace damage sharing redirects part of the hit to a guardian.
        let sharer = find_sharer(&work, env, &target.id);
        let shared = match &sharer {
            Some((_, amount)) => (*amount).min(raw - 1).max(0),
            None => 0,
        };
        let mut delivered = raw - shared;

        if target.base == PieceBase::King {
            delivered = apply_palace_guard(&mut work, env, &target.id, delivered, &mut events);
            if work.status.king_invincible_side == Some(target.side) {
                delivered = 0;
            } else if delivered > 0 && king_hit.is_none() {
                king_hit = Some((target.side, source.id.clone()));
            }
        }

        events.push(Event::DamageDealt {
            kind: inst.kind,
            source: source.id.clone(),
            target: target.id.clone(),
            amount: delivered,
            shared: false,
        });
        apply_hit(&mut work, env, &source.id, &target.id, delivered, &mut events);

        if let Some((sharer_id, _)) = sharer {
            if shared > 0 {
                events.push(Event::DamageDealt {
                    kind: inst.kind,
                    source: source.id.clone(),
                    target: sharer_id.clone(),
                    amount: shared,
                    shared: true,
                });
                apply_hit(&mut work, env, &source.id, &sharer_id, shared, &mut events);
            }
        }
    }

    // A sacrifice buff powers exactly one shot.
    work.status.sacrifice_buff_by_unit.remove(&plan.attacker);

    if let Some((king_side, shooter_id)) = king_hit {
        resolve_counter(&mut work, env, king_side, &shooter_id, &mut events);
    }

    let res = *work.resources.get(side);
    events.push(Event::ResourcesChanged {
        side,
        gold: res.gold,
        mana: res.mana,
        storage_mana: res.storage_mana,
    });

    Ok(ShotOutcome {
        state: work,
        events,
    })
}

fn roll(work: &mut GameState, sides: u32) -> u32 {
    match work.rules.rng_mode {
        RngMode::Seeded => {
            let mut rng = RngState(work.rng_state);
            let value = rng.roll_dice(sides);
            work.rng_state = rng.0;
            value
        }
        RngMode::Fixed => work.rules.dice_fixed,
    }
}

/// First eligible damage-share guardian for a palace-defended target,
/// in ascending id order.
fn find_sharer(work: &GameState, env: &GameEnv<'_>, target_id: &UnitId) -> Option<(UnitId, i32)> {
    let target = work.unit(target_id)?;
    if !board::in_palace(target.side, target.pos) {
        return None;
    }
    let allies_in_palace = work
        .units_of_side(target.side)
        .filter(|u| board::in_palace(u.side, u.pos))
        .count() as u32;
    for ally in work.units_of_side(target.side) {
        if ally.id == *target_id || !board::in_palace(ally.side, ally.pos) {
            continue;
        }
        for ability in env.abilities_of(ally) {
            if let Ability::DamageShare {
                amount,
                allies_in_palace_gte,
            } = ability
            {
                if allies_in_palace >= *allies_in_palace_gte {
                    return Some((ally.id.clone(), *amount));
                }
            }
        }
    }
    None
}

/// Applies the first eligible palace-guard reduction to a hit on the king.
fn apply_palace_guard(
    work: &mut GameState,
    env: &GameEnv<'_>,
    king_id: &UnitId,
    delivered: i32,
    events: &mut Vec<Event>,
) -> i32 {
    let Some(king) = work.unit(king_id).cloned() else {
        return delivered;
    };
    if delivered <= 0 {
        return delivered;
    }
    let guard = work.units_of_side(king.side).find_map(|ally| {
        env.abilities_of(ally).iter().find_map(|a| match a {
            Ability::PalaceGuard { reduction, per_turn } => {
                let used = work
                    .turn_flags
                    .ability_use_count(&ally.id, AbilityKind::PalaceGuard);
                (used < *per_turn).then(|| (ally.id.clone(), *reduction))
            }
            _ => None,
        })
    });
    let Some((guard_id, reduction)) = guard else {
        return delivered;
    };
    work.turn_flags
        .bump_ability_use(&guard_id, AbilityKind::PalaceGuard);
    events.push(Event::AbilityTriggered {
        unit: guard_id,
        kind: AbilityKind::PalaceGuard,
    });
    (delivered - reduction).max(0)
}

/// Applies delivered damage, handling death and on-kill healing.
fn apply_hit(
    work: &mut GameState,
    env: &GameEnv<'_>,
    source_id: &UnitId,
    target_id: &UnitId,
    amount: i32,
    events: &mut Vec<Event>,
) {
    let Some(target) = work.units.get_mut(target_id) else {
        return;
    };
    target.hp_current -= amount;
    if target.hp_current > 0 {
        return;
    }
    let victim_side = target.side;
    kill_unit(work, env, target_id, events);
    if let Some(source) = work.unit(source_id).cloned() {
        if source.side != victim_side {
            heal_king_on_kill(work, env, &source, events);
        }
    }
}

fn heal_king_on_kill(
    work: &mut GameState,
    env: &GameEnv<'_>,
    killer: &crate::state::Unit,
    events: &mut Vec<Event>,
) {
    let heal: i32 = env
        .abilities_of(killer)
        .iter()
        .filter_map(|a| match a {
            Ability::HealKingOnKill { amount } => Some(*amount),
            _ => None,
        })
        .sum();
    if heal <= 0 {
        return;
    }
    let Some(king) = work.king_of(killer.side).map(|k| k.id.clone()) else {
        return;
    };
    let max_hp = work.unit(&king).map(|k| k.max_hp(env)).unwrap_or(0);
    if let Some(unit) = work.units.get_mut(&king) {
        let healed = (unit.hp_current + heal).min(max_hp) - unit.hp_current;
        if healed > 0 {
            unit.hp_current += healed;
            events.push(Event::KingHealed {
                unit: king,
                amount: healed,
            });
        }
    }
}

/// Removes a dead unit: corpse entry, graveyard deposit, death bursts.
/// Bursts can cascade into further deaths.
pub fn kill_unit(work: &mut GameState, env: &GameEnv<'_>, id: &UnitId, events: &mut Vec<Event>) {
    let Some(unit) = work.units.remove(id) else {
        return;
    };
    events.push(Event::UnitKilled {
        unit: id.clone(),
        pos: unit.pos,
    });
    work.corpses_by_pos.entry(unit.pos).or_default().push(CorpseEntry {
        side: unit.side,
        base: unit.base,
    });
    if let Some(enchant) = &unit.enchant {
        work.graveyard
            .get_mut(unit.side)
            .insert(0, enchant.soul_id.clone());
    }

    for ability in env.abilities_of(&unit) {
        let Ability::OnDeathFixedDamage {
            radius,
            damage: burst,
            ignore_def,
        } = ability
        else {
            continue;
        };
        if !ignore_def {
            continue;
        }
        events.push(Event::AbilityTriggered {
            unit: id.clone(),
            kind: AbilityKind::OnDeathFixedDamage,
        });
        let victims: Vec<UnitId> = work
            .units_of_side(unit.side.opponent())
            .filter(|e| unit.pos.chebyshev(e.pos) <= *radius)
            .map(|e| e.id.clone())
            .collect();
        for victim_id in victims {
            let Some(victim) = work.unit(&victim_id).cloned() else {
                continue;
            };
            let delivered = if victim.base == PieceBase::King
                && work.status.king_invincible_side == Some(victim.side)
            {
                0
            } else {
                *burst
            };
            events.push(Event::DamageDealt {
                kind: InstanceKind::OnDeath,
                source: id.clone(),
                target: victim_id.clone(),
                amount: delivered,
                shared: false,
            });
            if let Some(v) = work.units.get_mut(&victim_id) {
                v.hp_current -= delivered;
                if v.hp_current <= 0 {
                    kill_unit(work, env, &victim_id, events);
                }
            }
        }
    }
}

/// Reflects dice damage at the shooter after a delivered hit on the king.
fn resolve_counter(
    work: &mut GameState,
    env: &GameEnv<'_>,
    king_side: Side,
    shooter_id: &UnitId,
    events: &mut Vec<Event>,
) {
    let bearer = work.units_of_side(king_side).find_map(|ally| {
        env.abilities_of(ally).iter().find_map(|a| match a {
            Ability::CounterOnKingDamaged { dice_sides, per_turn } => {
                let used = work
                    .turn_flags
                    .ability_use_count(&ally.id, AbilityKind::CounterOnKingDamaged);
                (used < *per_turn).then(|| (ally.id.clone(), *dice_sides))
            }
            _ => None,
        })
    });
    let Some((bearer_id, sides)) = bearer else {
        return;
    };
    if work.unit(shooter_id).is_none() {
        return;
    }
    work.turn_flags
        .bump_ability_use(&bearer_id, AbilityKind::CounterOnKingDamaged);
    events.push(Event::AbilityTriggered {
        unit: bearer_id.clone(),
        kind: AbilityKind::CounterOnKingDamaged,
    });
    let value = roll(work, sides);
    events.push(Event::DiceRolled { value });
    events.push(Event::DamageDealt {
        kind: InstanceKind::Counter,
        source: bearer_id.clone(),
        target: shooter_id.clone(),
        amount: value as i32,
        shared: false,
    });
    if let Some(shooter) = work.units.get_mut(shooter_id) {
        shooter.hp_current -= value as i32;
        if shooter.hp_current <= 0 {
            kill_unit(work, env, shooter_id, events);
        }
    }
}
