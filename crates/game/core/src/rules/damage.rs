//! Raw damage computation.
//!
//! One formula for every damage instance: die + attack + bonuses - effective
//! defense, floored at 1. Fixed-damage effects (on-death bursts, counters)
//! bypass this module entirely.

use crate::board;
use crate::catalog::Ability;
use crate::env::GameEnv;
use crate::rules::effects;
use crate::stats::{AttackKey, defense_value};
use crate::state::{GameState, Unit};

/// Raw damage of one attack instance before sharing/guard/invincibility.
pub fn compute_raw_damage(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker: &Unit,
    target: &Unit,
    dice: u32,
) -> i32 {
    let bonus = attack_bonus(state, env, attacker, target);
    let defense = effective_defense(state, env, attacker, target);
    (dice as i32 + attacker.atk.value + bonus - defense).max(1)
}

/// Sum of every attack-side bonus that applies to this attacker/target pair.
pub fn attack_bonus(state: &GameState, env: &GameEnv<'_>, attacker: &Unit, target: &Unit) -> i32 {
    let corpses = state.corpse_count(attacker.side);
    let mut bonus = 0;

    // A pending sacrifice buff, capped by the side's corpse count.
    if let Some(buff) = state.status.sacrifice_buff_by_unit.get(&attacker.id) {
        bonus += (*buff).min(corpses as i32);
    }

    for ability in env.abilities_of(attacker) {
        match ability {
            Ability::DamageBonus {
                value,
                per_corpses,
                cross_river,
                when,
            } => {
                if *cross_river && !board::has_crossed_river(attacker.side, attacker.pos) {
                    continue;
                }
                if let Some(cond) = when {
                    if !effects::condition_met(state, attacker, Some(attacker), cond) {
                        continue;
                    }
                }
                bonus += value;
                if let Some(pc) = per_corpses {
                    bonus += (corpses / pc.per) as i32 * pc.amount;
                }
            }
            Ability::Minglei { river_bonus, .. } => {
                if board::has_crossed_river(target.side, target.pos) {
                    bonus += river_bonus;
                }
            }
            _ => {}
        }
    }

    for ally in state.units_of_side(attacker.side) {
        for ability in env.abilities_of(ally) {
            match ability {
                Ability::AuraDamageBonus {
                    value,
                    per_corpses,
                    gate,
                } => {
                    if !effects::aura_gate_met(state, env, ally, attacker, gate) {
                        continue;
                    }
                    bonus += value;
                    if let Some(pc) = per_corpses {
                        bonus += (corpses / pc.per) as i32 * pc.amount;
                    }
                }
                Ability::SoldierCountAura { tiers } => {
                    let soldiers = state.soldier_count(attacker.side);
                    let best = tiers
                        .iter()
                        .filter(|t| soldiers >= t.count_gte)
                        .map(|t| t.bonus)
                        .max();
                    if let Some(best) = best {
                        bonus += best;
                    }
                }
                _ => {}
            }
        }
    }
    bonus
}

/// The target's defense against this attacker after reductions and allied
/// defensive auras.
pub fn effective_defense(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker: &Unit,
    target: &Unit,
) -> i32 {
    let mut defense = defense_value(&target.def, attacker.atk.key);

    for ability in env.abilities_of(attacker) {
        match ability {
            Ability::TargetDefMinus { amount, per, floor } => {
                let reduction = (state.corpse_count(attacker.side) / per) as i32 * amount;
                defense = (defense - reduction).max(*floor);
            }
            Ability::Minglei { def_minus, .. } => {
                if attacker.atk.key == AttackKey::Magic {
                    defense -= def_minus;
                }
            }
            _ => {}
        }
    }

    for ally in state.units_of_side(target.side) {
        for ability in env.abilities_of(ally) {
            if let Ability::AuraDefBonus { value, gate } = ability {
                if effects::aura_gate_met(state, env, ally, target, gate) {
                    defense += value;
                }
            }
        }
    }
    defense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceBase, Pos, Side};
    use crate::catalog::{AuraGate, Catalog, PerCorpses, SoulCard};
    use crate::stats::{AttackStat, DefStat, UnitStats};
    use crate::state::{CorpseEntry, Enchant, RulesConfig, UnitId};
    use std::collections::BTreeMap;

    fn soul_with(id: &str, atk: AttackStat, abilities: Vec<Ability>) -> SoulCard {
        SoulCard {
            id: id.to_string(),
            clan: "dark_moon".to_string(),
            base: PieceBase::Rook,
            name: id.to_string(),
            cost_gold: 2,
            stats: UnitStats {
                hp: 8,
                atk,
                def: vec![],
            },
            abilities,
        }
    }

    fn bare_state() -> GameState {
        let catalog = Catalog::default();
        let env = GameEnv::new(&catalog);
        let mut state = crate::state::create_initial_state(&env, RulesConfig::default());
        state.units = BTreeMap::new();
        state
    }

    fn place(
        state: &mut GameState,
        id: &str,
        side: Side,
        base: PieceBase,
        pos: Pos,
        soul: Option<&str>,
    ) -> UnitId {
        let id = UnitId::new(id);
        let mut unit = crate::state::Unit::spawn(id.clone(), side, base, pos);
        if let Some(soul) = soul {
            unit.enchant = Some(Enchant {
                soul_id: soul.to_string(),
            });
        }
        state.units.insert(id.clone(), unit);
        id
    }

    fn add_corpses(state: &mut GameState, side: Side, n: usize) {
        let stack = state.corpses_by_pos.entry(Pos::new(8, 4)).or_default();
        for _ in 0..n {
            stack.push(CorpseEntry {
                side,
                base: PieceBase::Soldier,
            });
        }
    }

    #[test]
    fn damage_never_falls_below_one() {
        let catalog = Catalog::default();
        let env = GameEnv::new(&catalog);
        let mut state = bare_state();
        // Soldier (atk 2 physical) against a king with physical def 1: the
        // floor only matters once defense outweighs the roll.
        let s = place(&mut state, "red:soldier:0", Side::Red, PieceBase::Soldier, Pos::new(4, 1), None);
        let k = place(&mut state, "black:king:0", Side::Black, PieceBase::King, Pos::new(4, 0), None);
        let soldier = state.unit(&s).cloned().unwrap();
        let mut king = state.unit(&k).cloned().unwrap();
        king.def = vec![DefStat::new(crate::stats::AttackKey::Physical, 10)];
        assert_eq!(compute_raw_damage(&state, &env, &soldier, &king, 1), 1);
    }

    #[test]
    fn corpse_scaled_bonus_counts_own_side_only() {
        let catalog = Catalog::new(
            vec![soul_with(
                "reaper",
                AttackStat::new(crate::stats::AttackKey::Physical, 4),
                vec![Ability::DamageBonus {
                    value: 1,
                    per_corpses: Some(PerCorpses { per: 2, amount: 1 }),
                    cross_river: false,
                    when: None,
                }],
            )],
            vec![],
        );
        let env = GameEnv::new(&catalog);
        let mut state = bare_state();
        let a = place(&mut state, "red:rook:0", Side::Red, PieceBase::Rook, Pos::new(0, 9), Some("reaper"));
        let t = place(&mut state, "black:soldier:0", Side::Black, PieceBase::Soldier, Pos::new(0, 3), None);
        add_corpses(&mut state, Side::Red, 5);
        add_corpses(&mut state, Side::Black, 9);
        let attacker = state.unit(&a).cloned().unwrap();
        let target = state.unit(&t).cloned().unwrap();
        // 5 own corpses at 1 per 2 -> +2, plus the flat +1.
        assert_eq!(attack_bonus(&state, &env, &attacker, &target), 3);
    }

    #[test]
    fn target_def_minus_clamps_at_floor() {
        let catalog = Catalog::new(
            vec![soul_with(
                "rend",
                AttackStat::new(crate::stats::AttackKey::Physical, 4),
                vec![Ability::TargetDefMinus {
                    amount: 2,
                    per: 1,
                    floor: 0,
                }],
            )],
            vec![],
        );
        let env = GameEnv::new(&catalog);
        let mut state = bare_state();
        let a = place(&mut state, "red:rook:0", Side::Red, PieceBase::Rook, Pos::new(0, 9), Some("rend"));
        let t = place(&mut state, "black:advisor:0", Side::Black, PieceBase::Advisor, Pos::new(3, 0), None);
        add_corpses(&mut state, Side::Red, 3);
        let attacker = state.unit(&a).cloned().unwrap();
        let target = state.unit(&t).cloned().unwrap();
        assert_eq!(effective_defense(&state, &env, &attacker, &target), 0);
    }

    #[test]
    fn aura_def_bonus_requires_gate() {
        let catalog = Catalog::new(
            vec![soul_with(
                "ward",
                AttackStat::new(crate::stats::AttackKey::Physical, 3),
                vec![Ability::AuraDefBonus {
                    value: 2,
                    gate: AuraGate {
                        beneficiary_in_palace: true,
                        ..Default::default()
                    },
                }],
            )],
            vec![],
        );
        let env = GameEnv::new(&catalog);
        let mut state = bare_state();
        let a = place(&mut state, "red:rook:0", Side::Red, PieceBase::Rook, Pos::new(4, 5), None);
        place(&mut state, "black:advisor:0", Side::Black, PieceBase::Advisor, Pos::new(3, 0), Some("ward"));
        let in_palace = place(&mut state, "black:king:0", Side::Black, PieceBase::King, Pos::new(4, 0), None);
        let outside = place(&mut state, "black:soldier:0", Side::Black, PieceBase::Soldier, Pos::new(0, 3), None);
        let attacker = state.unit(&a).cloned().unwrap();
        let king = state.unit(&in_palace).cloned().unwrap();
        let soldier = state.unit(&outside).cloned().unwrap();
        // King base physical def 1, +2 aura inside the palace.
        assert_eq!(effective_defense(&state, &env, &attacker, &king), 3);
        // Soldier base physical def 0, no aura outside.
        assert_eq!(effective_defense(&state, &env, &attacker, &soldier), 0);
    }

    #[test]
    fn sacrifice_buff_capped_by_corpse_count() {
        let catalog = Catalog::default();
        let env = GameEnv::new(&catalog);
        let mut state = bare_state();
        let a = place(&mut state, "red:rook:0", Side::Red, PieceBase::Rook, Pos::new(0, 9), None);
        let t = place(&mut state, "black:soldier:0", Side::Black, PieceBase::Soldier, Pos::new(0, 3), None);
        state.status.sacrifice_buff_by_unit.insert(a.clone(), 4);
        add_corpses(&mut state, Side::Red, 2);
        let attacker = state.unit(&a).cloned().unwrap();
        let target = state.unit(&t).cloned().unwrap();
        assert_eq!(attack_bonus(&state, &env, &attacker, &target), 2);
    }
}
