//! The state transition function.
//!
//! `reduce` is the only write path: it validates through the guards (or the
//! shot planner), clones the state, applies the action to the clone, and
//! returns it with the event feed. A rejected action returns an error and
//! the caller's snapshot is untouched.

use crate::action::Action;
use crate::board::Side;
use crate::catalog::{ItemEffect, SacrificeTarget};
use crate::env::GameEnv;
use crate::error::{EngineError, Reject};
use crate::event::Event;
use crate::guards;
use crate::rules::{effects, shot_plan};
use crate::state::{GameState, TurnFlags, TurnPhase, Unit, UnitId};

/// An accepted transition: the successor state plus everything that happened.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<Event>,
}

/// Applies one action to a snapshot.
pub fn reduce(
    state: &GameState,
    env: &GameEnv<'_>,
    action: &Action,
) -> Result<Transition, EngineError> {
    match action {
        Action::NextPhase => next_phase(state),
        Action::Move { unit, to } => {
            guards::guard_move(state, env, unit, *to)?;
            let mut work = state.clone();
            let from = work.units[unit].pos;
            if let Some(u) = work.units.get_mut(unit) {
                u.pos = *to;
            }
            work.turn_flags.moved_this_turn.insert(unit.clone());
            Ok(Transition {
                state: work,
                events: vec![Event::UnitMoved {
                    unit: unit.clone(),
                    from,
                    to: *to,
                }],
            })
        }
        Action::Shoot {
            attacker,
            target,
            extra_target,
        } => {
            let plan = shot_plan::build_shot_plan(state, env, attacker, target, extra_target.as_ref())?;
            let outcome = shot_plan::execute_shot_plan(state, env, &plan)?;
            Ok(Transition {
                state: outcome.state,
                events: outcome.events,
            })
        }
        Action::Enchant { unit, soul_id } => enchant(state, env, unit, soul_id),
        Action::Revive { pos, corpse_index } => revive(state, env, *pos, *corpse_index),
        Action::BloodRitual => blood_ritual(state),
        Action::Sacrifice { unit, target } => sacrifice(state, env, unit, target),
        Action::BuySoulFromDeck { base } => buy_soul_from_deck(state, *base),
        Action::BuySoulFromDisplay { base } => buy_soul_from_display(state, *base),
        Action::BuySoulFromEnemyGraveyard { soul_id } => {
            buy_soul_from_enemy_graveyard(state, soul_id)
        }
        Action::ReturnSoulToDeckBottom { soul_id } => return_soul(state, env, soul_id),
        Action::BuyItemFromDisplay { slot } => buy_item(state, env, *slot),
        Action::DiscardItemFromHand { item_id } => discard_item(state, item_id),
        Action::UseItem { item_id, target } => use_item(state, env, item_id, target.as_ref()),
    }
}

/// Phase cycle. Entering turn end folds unspent mana into storage; leaving
/// it rolls the turn over: side swap, flag reset, income, straight into the
/// next side's buy phase.
fn next_phase(state: &GameState) -> Result<Transition, EngineError> {
    let mut work = state.clone();
    let mut events = Vec::new();
    match work.turn.phase {
        TurnPhase::Buy => {
            work.turn.phase = TurnPhase::Necro;
            events.push(Event::PhaseChanged {
                from: TurnPhase::Buy,
                to: TurnPhase::Necro,
            });
        }
        TurnPhase::Necro => {
            work.turn.phase = TurnPhase::Combat;
            events.push(Event::PhaseChanged {
                from: TurnPhase::Necro,
                to: TurnPhase::Combat,
            });
        }
        TurnPhase::Combat => {
            let side = work.turn.side;
            let res = work.resources.get_mut(side);
            let folded = (res.storage_mana + res.mana).min(work.rules.storage_mana_max);
            res.storage_mana = folded;
            res.mana = 0;
            work.turn.phase = TurnPhase::TurnEnd;
            events.push(Event::PhaseChanged {
                from: TurnPhase::Combat,
                to: TurnPhase::TurnEnd,
            });
            let snapshot = *work.resources.get(side);
            events.push(Event::ResourcesChanged {
                side,
                gold: snapshot.gold,
                mana: snapshot.mana,
                storage_mana: snapshot.storage_mana,
            });
        }
        TurnPhase::TurnEnd => {
            let incoming = work.turn.side.opponent();
            events.push(Event::PhaseChanged {
                from: TurnPhase::TurnEnd,
                to: TurnPhase::TurnStart,
            });
            start_turn(&mut work, incoming, &mut events);
        }
        // Never a resting phase; tolerated for states built by hand.
        TurnPhase::TurnStart => {
            let side = work.turn.side;
            start_turn(&mut work, side, &mut events);
        }
    }
    Ok(Transition {
        state: work,
        events,
    })
}

/// Turn start: reset per-turn flags, clear the incoming side's expiring
/// statuses, pay income, land on the buy phase.
fn start_turn(work: &mut GameState, incoming: Side, events: &mut Vec<Event>) {
    work.turn.side = incoming;
    work.turn.phase = TurnPhase::Buy;
    work.turn_flags = TurnFlags::default();

    if work.status.king_invincible_side == Some(incoming) {
        work.status.king_invincible_side = None;
    }
    let stale: Vec<UnitId> = work
        .status
        .sacrifice_buff_by_unit
        .keys()
        .filter(|id| work.unit(id).map(|u| u.side) == Some(incoming))
        .cloned()
        .collect();
    for id in stale {
        work.status.sacrifice_buff_by_unit.remove(&id);
    }

    let rules = work.rules.clone();
    let res = work.resources.get_mut(incoming);
    let from_storage = res.storage_mana * rules.storage_to_gold_rate;
    res.gold = (res.gold + from_storage + rules.gold_income_per_turn).min(rules.gold_max);
    res.storage_mana = 0;
    res.mana = (res.mana + rules.mana_income_per_turn).min(rules.mana_max);

    events.push(Event::PhaseChanged {
        from: TurnPhase::TurnStart,
        to: TurnPhase::Buy,
    });
    let snapshot = *work.resources.get(incoming);
    events.push(Event::ResourcesChanged {
        side: incoming,
        gold: snapshot.gold,
        mana: snapshot.mana,
        storage_mana: snapshot.storage_mana,
    });
}

fn enchant(
    state: &GameState,
    env: &GameEnv<'_>,
    unit_id: &UnitId,
    soul_id: &str,
) -> Result<Transition, EngineError> {
    guards::guard_enchant(state, env, unit_id, soul_id)?;
    let card = env.soul_card(soul_id)?;
    let mut work = state.clone();
    let side = work.turn.side;
    remove_one(&mut work.hands.get_mut(side).souls, soul_id);
    if let Some(unit) = work.units.get_mut(unit_id) {
        unit.apply_enchant(soul_id, &card.stats);
    }
    work.turn_flags.necro_actions_used += 1;
    Ok(Transition {
        state: work,
        events: vec![Event::Enchanted {
            unit: unit_id.clone(),
            soul: soul_id.to_string(),
        }],
    })
}

fn revive(
    state: &GameState,
    env: &GameEnv<'_>,
    pos: crate::board::Pos,
    corpse_index: Option<usize>,
) -> Result<Transition, EngineError> {
    guards::guard_revive(state, env, pos, corpse_index)?;
    let cost = guards::revive_cost(state, env);
    let mut work = state.clone();
    let side = work.turn.side;

    let corpse = {
        let stack = work
            .corpses_by_pos
            .get_mut(&pos)
            .ok_or(Reject::NoCorpse)?;
        let index = corpse_index.unwrap_or(stack.len().saturating_sub(1));
        let corpse = stack.remove(index);
        if stack.is_empty() {
            work.corpses_by_pos.remove(&pos);
        }
        corpse
    };

    let mut n = 0;
    let id = loop {
        let candidate = UnitId::revive(side, corpse.base, n);
        if !work.units.contains_key(&candidate) {
            break candidate;
        }
        n += 1;
    };
    work.units
        .insert(id.clone(), Unit::spawn(id.clone(), side, corpse.base, pos));
    work.resources.get_mut(side).gold -= cost;
    work.turn_flags.necro_actions_used += 1;

    let snapshot = *work.resources.get(side);
    Ok(Transition {
        state: work,
        events: vec![
            Event::Revived {
                unit: id,
                pos,
                base: corpse.base,
            },
            Event::ResourcesChanged {
                side,
                gold: snapshot.gold,
                mana: snapshot.mana,
                storage_mana: snapshot.storage_mana,
            },
        ],
    })
}

/// Blood ritual: the king pays HP for one extra necro action this turn.
fn blood_ritual(state: &GameState) -> Result<Transition, EngineError> {
    guards::guard_blood_ritual(state)?;
    let mut work = state.clone();
    let side = work.turn.side;
    let cost = work.rules.blood_ritual_hp_cost;
    let king_id = work
        .king_of(side)
        .map(|k| k.id.clone())
        .ok_or(Reject::UnitNotFound)?;
    if let Some(king) = work.units.get_mut(&king_id) {
        king.hp_current -= cost;
    }
    work.turn_flags.blood_ritual_used = true;
    work.turn_flags.necro_bonus_actions += 1;
    Ok(Transition {
        state: work,
        events: vec![Event::BloodRitual { side }],
    })
}

fn sacrifice(
    state: &GameState,
    env: &GameEnv<'_>,
    unit_id: &UnitId,
    target_id: &UnitId,
) -> Result<Transition, EngineError> {
    guards::guard_sacrifice(state, env, unit_id, target_id)?;
    let unit = state.unit(unit_id).ok_or(Reject::UnitNotFound)?;
    let (kind, buff, _) = effects::sacrifice_spec(env, unit).ok_or(Reject::NoSacrificeAbility)?;
    let (dies, beneficiary) = match kind {
        SacrificeTarget::SelfUnit => (unit_id.clone(), target_id.clone()),
        SacrificeTarget::Ally => (target_id.clone(), unit_id.clone()),
    };

    let mut work = state.clone();
    let mut events = Vec::new();
    shot_plan::kill_unit(&mut work, env, &dies, &mut events);
    work.status
        .sacrifice_buff_by_unit
        .insert(beneficiary.clone(), buff);
    work.turn_flags.necro_actions_used += 1;
    events.push(Event::Sacrificed {
        unit: dies,
        beneficiary,
    });
    Ok(Transition {
        state: work,
        events,
    })
}

fn remove_one(items: &mut Vec<String>, id: &str) {
    if let Some(i) = items.iter().position(|s| s == id) {
        items.remove(i);
    }
}

fn resources_event(work: &GameState, side: Side) -> Event {
    let snapshot = *work.resources.get(side);
    Event::ResourcesChanged {
        side,
        gold: snapshot.gold,
        mana: snapshot.mana,
        storage_mana: snapshot.storage_mana,
    }
}

fn buy_soul_from_deck(
    state: &GameState,
    base: crate::board::PieceBase,
) -> Result<Transition, EngineError> {
    guards::guard_buy_soul_from_deck(state, base)?;
    let mut work = state.clone();
    let side = work.turn.side;
    let soul = work
        .soul_deck_by_base
        .get_mut(&base)
        .filter(|deck| !deck.is_empty())
        .map(|deck| deck.remove(0))
        .ok_or(Reject::DeckEmpty)?;
    work.resources.get_mut(side).gold -= work.rules.buy_soul_from_deck_gold_cost;
    work.hands.get_mut(side).souls.push(soul.clone());
    work.turn_flags.soul_bought = true;
    let events = vec![
        Event::SoulBought { side, soul },
        resources_event(&work, side),
    ];
    Ok(Transition {
        state: work,
        events,
    })
}

fn buy_soul_from_display(
    state: &GameState,
    base: crate::board::PieceBase,
) -> Result<Transition, EngineError> {
    guards::guard_buy_soul_from_display(state, base)?;
    let mut work = state.clone();
    let side = work.turn.side;
    let slot = work
        .display_by_base
        .get_mut(&base)
        .ok_or(Reject::NoCardInDisplay)?;
    let soul = slot.take().ok_or(Reject::NoCardInDisplay)?;
    // Refill the slot from the top of the matching deck.
    *slot = work
        .soul_deck_by_base
        .get_mut(&base)
        .filter(|deck| !deck.is_empty())
        .map(|deck| deck.remove(0));
    work.resources.get_mut(side).gold -= work.rules.buy_soul_from_display_gold_cost;
    work.hands.get_mut(side).souls.push(soul.clone());
    work.turn_flags.soul_bought = true;
    let events = vec![
        Event::SoulBought { side, soul },
        resources_event(&work, side),
    ];
    Ok(Transition {
        state: work,
        events,
    })
}

fn buy_soul_from_enemy_graveyard(
    state: &GameState,
    soul_id: &str,
) -> Result<Transition, EngineError> {
    guards::guard_buy_soul_from_enemy_graveyard(state, soul_id)?;
    let mut work = state.clone();
    let side = work.turn.side;
    remove_one(work.graveyard.get_mut(side.opponent()), soul_id);
    work.resources.get_mut(side).gold -= work.rules.buy_soul_from_graveyard_gold_cost;
    work.hands.get_mut(side).souls.push(soul_id.to_string());
    work.turn_flags.soul_bought = true;
    let events = vec![
        Event::SoulBought {
            side,
            soul: soul_id.to_string(),
        },
        resources_event(&work, side),
    ];
    Ok(Transition {
        state: work,
        events,
    })
}

fn return_soul(
    state: &GameState,
    env: &GameEnv<'_>,
    soul_id: &str,
) -> Result<Transition, EngineError> {
    guards::guard_return_soul(state, soul_id)?;
    let card = env.soul_card(soul_id)?;
    let mut work = state.clone();
    let side = work.turn.side;
    remove_one(&mut work.hands.get_mut(side).souls, soul_id);
    work.soul_deck_by_base
        .entry(card.base)
        .or_default()
        .push(soul_id.to_string());
    let res = work.resources.get_mut(side);
    res.gold = (res.gold + work.rules.return_soul_refund_gold).min(work.rules.gold_max);
    let events = vec![
        Event::SoulReturned {
            side,
            soul: soul_id.to_string(),
        },
        resources_event(&work, side),
    ];
    Ok(Transition {
        state: work,
        events,
    })
}

fn buy_item(
    state: &GameState,
    env: &GameEnv<'_>,
    slot: usize,
) -> Result<Transition, EngineError> {
    guards::guard_buy_item(state, env, slot)?;
    let mut work = state.clone();
    let side = work.turn.side;
    let item = work
        .item_display
        .get_mut(slot)
        .and_then(Option::take)
        .ok_or(Reject::NoItemInDisplay)?;
    let card = env.item_card(&item)?;
    // Refill the slot from the top of the item deck.
    if let Some(slot_ref) = work.item_display.get_mut(slot) {
        *slot_ref = if work.item_deck.is_empty() {
            None
        } else {
            Some(work.item_deck.remove(0))
        };
    }
    work.resources.get_mut(side).gold -= card.cost_gold;
    work.hands.get_mut(side).items.push(item.clone());
    let events = vec![
        Event::ItemBought { side, item },
        resources_event(&work, side),
    ];
    Ok(Transition {
        state: work,
        events,
    })
}

fn discard_item(state: &GameState, item_id: &str) -> Result<Transition, EngineError> {
    guards::guard_discard_item(state, item_id)?;
    let mut work = state.clone();
    let side = work.turn.side;
    remove_one(&mut work.hands.get_mut(side).items, item_id);
    work.item_discard.push(item_id.to_string());
    Ok(Transition {
        state: work,
        events: vec![Event::ItemDiscarded {
            side,
            item: item_id.to_string(),
        }],
    })
}

fn use_item(
    state: &GameState,
    env: &GameEnv<'_>,
    item_id: &str,
    target: Option<&UnitId>,
) -> Result<Transition, EngineError> {
    guards::guard_use_item(state, env, item_id, target)?;
    let card = env.item_card(item_id)?.clone();
    let mut work = state.clone();
    let side = work.turn.side;
    remove_one(&mut work.hands.get_mut(side).items, item_id);
    work.item_discard.push(item_id.to_string());

    let mut events = vec![Event::ItemUsed {
        side,
        item: item_id.to_string(),
    }];
    match card.effect {
        Some(ItemEffect::GainGold(amount)) => {
            let res = work.resources.get_mut(side);
            res.gold = (res.gold + amount).min(work.rules.gold_max);
            events.push(resources_event(&work, side));
        }
        Some(ItemEffect::GainMana(amount)) => {
            let res = work.resources.get_mut(side);
            res.mana = (res.mana + amount).min(work.rules.mana_max);
            events.push(resources_event(&work, side));
        }
        Some(ItemEffect::HealUnit(amount)) => {
            let target_id = target.ok_or(Reject::InvalidTarget)?;
            let max_hp = work
                .unit(target_id)
                .map(|u| u.max_hp(env))
                .ok_or(Reject::UnitNotFound)?;
            if let Some(unit) = work.units.get_mut(target_id) {
                unit.hp_current = (unit.hp_current + amount).min(max_hp);
            }
        }
        Some(ItemEffect::KingInvincible) => {
            work.status.king_invincible_side = Some(side);
        }
        Some(ItemEffect::BonusNecroAction) => {
            work.turn_flags.necro_bonus_actions += 1;
        }
        Some(ItemEffect::FreeShoot) => {
            let target_id = target.ok_or(Reject::InvalidTarget)?;
            work.turn_flags.free_shot_granted.insert(target_id.clone());
        }
        None => {}
    }
    Ok(Transition {
        state: work,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceBase, Pos};
    use crate::catalog::Catalog;
    use crate::state::{RulesConfig, create_initial_state};

    fn fresh() -> (Catalog, GameState) {
        let catalog = Catalog::default();
        let state = {
            let env = GameEnv::new(&catalog);
            create_initial_state(&env, RulesConfig::default())
        };
        (catalog, state)
    }

    fn advance(state: &GameState, env: &GameEnv<'_>) -> GameState {
        reduce(state, env, &Action::NextPhase).unwrap().state
    }

    #[test]
    fn phase_cycle_lands_on_next_side_buy() {
        let (catalog, state) = fresh();
        let env = GameEnv::new(&catalog);
        assert_eq!(state.turn.phase, TurnPhase::Buy);
        assert_eq!(state.turn.side, Side::Red);
        let state = advance(&state, &env);
        assert_eq!(state.turn.phase, TurnPhase::Necro);
        let state = advance(&state, &env);
        assert_eq!(state.turn.phase, TurnPhase::Combat);
        let state = advance(&state, &env);
        assert_eq!(state.turn.phase, TurnPhase::TurnEnd);
        let t = reduce(&state, &env, &Action::NextPhase).unwrap();
        assert_eq!(t.state.turn.phase, TurnPhase::Buy);
        assert_eq!(t.state.turn.side, Side::Black);
        // Rollover emits both phase hops.
        let hops: Vec<(TurnPhase, TurnPhase)> = t
            .events
            .iter()
            .filter_map(|e| match e {
                Event::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            hops,
            [
                (TurnPhase::TurnEnd, TurnPhase::TurnStart),
                (TurnPhase::TurnStart, TurnPhase::Buy)
            ]
        );
    }

    #[test]
    fn turn_end_folds_mana_then_income_converts_storage() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        state.turn.phase = TurnPhase::Combat;
        state.resources.get_mut(Side::Red).mana = 3;
        state.resources.get_mut(Side::Red).storage_mana = 1;

        let state = advance(&state, &env);
        let red = state.resources.get(Side::Red);
        assert_eq!(red.mana, 0);
        assert_eq!(red.storage_mana, 4);

        // Roll through black's whole turn back to red.
        let mut state = state;
        for _ in 0..5 {
            state = advance(&state, &env);
        }
        assert_eq!(state.turn.side, Side::Red);
        assert_eq!(state.turn.phase, TurnPhase::Buy);
        let red = state.resources.get(Side::Red);
        // 2 start gold + 4 storage-converted + 2 income.
        assert_eq!(red.gold, 8);
        assert_eq!(red.storage_mana, 0);
        assert_eq!(red.mana, 2);
    }

    #[test]
    fn move_marks_unit_and_is_once_per_turn() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        state.turn.phase = TurnPhase::Combat;
        let unit = UnitId::new("red:soldier:2");
        let action = Action::Move {
            unit: unit.clone(),
            to: Pos::new(4, 5),
        };
        let t = reduce(&state, &env, &action).unwrap();
        assert_eq!(t.state.unit(&unit).unwrap().pos, Pos::new(4, 5));
        assert!(t.state.turn_flags.moved_this_turn.contains(&unit));

        let again = Action::Move {
            unit: unit.clone(),
            to: Pos::new(4, 4),
        };
        assert_eq!(
            reduce(&t.state, &env, &again).unwrap_err(),
            EngineError::Reject(Reject::AlreadyMoved)
        );
    }

    #[test]
    fn blood_ritual_trades_king_hp_for_a_necro_action() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        state.turn.phase = TurnPhase::Necro;
        let before = state.king_of(Side::Red).unwrap().hp_current;
        let t = reduce(&state, &env, &Action::BloodRitual).unwrap();
        assert_eq!(t.state.king_of(Side::Red).unwrap().hp_current, before - 3);
        assert_eq!(t.state.necro_actions_left(), 2);
        assert_eq!(
            reduce(&t.state, &env, &Action::BloodRitual).unwrap_err(),
            EngineError::Reject(Reject::BloodRitualUsed)
        );
    }

    #[test]
    fn display_purchase_refills_from_deck() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        state.turn.phase = TurnPhase::Buy;
        state.resources.get_mut(Side::Red).gold = 10;
        state
            .display_by_base
            .insert(PieceBase::Rook, Some("rook_a".to_string()));
        state
            .soul_deck_by_base
            .insert(PieceBase::Rook, vec!["rook_b".to_string()]);

        let t = reduce(
            &state,
            &env,
            &Action::BuySoulFromDisplay {
                base: PieceBase::Rook,
            },
        )
        .unwrap();
        assert_eq!(
            t.state.hands.get(Side::Red).souls,
            vec!["rook_a".to_string()]
        );
        assert_eq!(
            t.state.display_by_base.get(&PieceBase::Rook),
            Some(&Some("rook_b".to_string()))
        );
        assert!(t.state.soul_deck_by_base.get(&PieceBase::Rook).unwrap().is_empty());
        assert_eq!(t.state.resources.get(Side::Red).gold, 8);
        assert!(t.state.turn_flags.soul_bought);
    }

    #[test]
    fn revive_spawns_at_the_corpse_square() {
        let (catalog, mut state) = fresh();
        let env = GameEnv::new(&catalog);
        state.turn.phase = TurnPhase::Necro;
        state.resources.get_mut(Side::Red).gold = 5;
        let pos = Pos::new(4, 5);
        state.corpses_by_pos.insert(
            pos,
            vec![crate::state::CorpseEntry {
                side: Side::Red,
                base: PieceBase::Soldier,
            }],
        );
        let t = reduce(
            &state,
            &env,
            &Action::Revive {
                pos,
                corpse_index: None,
            },
        )
        .unwrap();
        let revived = UnitId::new("red:soldier:revive:0");
        assert_eq!(t.state.unit(&revived).unwrap().pos, pos);
        assert!(!t.state.corpses_by_pos.contains_key(&pos));
        assert_eq!(t.state.resources.get(Side::Red).gold, 3);
        assert_eq!(t.state.necro_actions_left(), 0);
    }

    #[test]
    fn rejected_actions_leave_the_snapshot_untouched() {
        let (catalog, state) = fresh();
        let env = GameEnv::new(&catalog);
        let before = state.clone();
        let result = reduce(
            &state,
            &env,
            &Action::Move {
                unit: UnitId::new("red:rook:0"),
                to: Pos::new(0, 8),
            },
        );
        // Buy phase: movement is combat-only.
        assert_eq!(result.unwrap_err(), EngineError::Reject(Reject::WrongPhase));
        assert_eq!(state, before);
    }
}
