//! Action guards.
//!
//! One predicate per non-shot action, each a pure `Result<(), Reject>`.
//! The reducer calls these before applying anything, so every rejection
//! reason a host can observe originates here (or in the shooting rules).
//! Checks run in a fixed order: phase, turn caps, hand capacity,
//! availability, then gold.

use crate::board::Pos;
use crate::catalog::{ItemEffect, ItemTiming};
use crate::env::GameEnv;
use crate::error::Reject;
use crate::rules::{effects, movement};
use crate::state::{GameState, TurnPhase, UnitId};

fn require_phase(state: &GameState, phase: TurnPhase) -> Result<(), Reject> {
    if state.turn.phase == phase {
        Ok(())
    } else {
        Err(Reject::WrongPhase)
    }
}

fn require_necro_action(state: &GameState) -> Result<(), Reject> {
    if state.necro_actions_left() == 0 {
        Err(Reject::NoNecroActions)
    } else {
        Ok(())
    }
}

fn require_soul_hand_space(state: &GameState) -> Result<(), Reject> {
    let max = state.rules.soul_hand_max;
    if state.hands.get(state.turn.side).souls.len() as u32 >= max {
        Err(Reject::SoulHandFull(max))
    } else {
        Ok(())
    }
}

fn require_gold(state: &GameState, cost: i32) -> Result<(), Reject> {
    if state.resources.get(state.turn.side).gold < cost {
        Err(Reject::NotEnoughGold)
    } else {
        Ok(())
    }
}

fn require_one_soul_purchase(state: &GameState) -> Result<(), Reject> {
    if state.turn_flags.soul_bought {
        Err(Reject::SoulAlreadyBought)
    } else {
        Ok(())
    }
}

pub fn guard_move(
    state: &GameState,
    env: &GameEnv<'_>,
    unit_id: &UnitId,
    to: Pos,
) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Combat)?;
    let unit = state.unit(unit_id).ok_or(Reject::UnitNotFound)?;
    if unit.side != state.turn.side {
        return Err(Reject::NotYourUnit);
    }
    if state.turn_flags.moved_this_turn.contains(unit_id) {
        return Err(Reject::AlreadyMoved);
    }
    if !movement::is_legal_move(state, env, unit_id, to) {
        return Err(Reject::IllegalMove);
    }
    Ok(())
}

pub fn guard_enchant(
    state: &GameState,
    env: &GameEnv<'_>,
    unit_id: &UnitId,
    soul_id: &str,
) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Necro)?;
    require_necro_action(state)?;
    let unit = state.unit(unit_id).ok_or(Reject::UnitNotFound)?;
    if unit.side != state.turn.side {
        return Err(Reject::NotYourUnit);
    }
    let hand = &state.hands.get(state.turn.side).souls;
    if !hand.iter().any(|s| s == soul_id) {
        return Err(Reject::SoulNotInHand);
    }
    let card = env.catalog.soul_opt(soul_id).ok_or(Reject::UnknownCard)?;
    if card.base != unit.base {
        return Err(Reject::BaseMismatch);
    }
    Ok(())
}

/// Revive cost after the best logistics discount, never below zero.
pub fn revive_cost(state: &GameState, env: &GameEnv<'_>) -> i32 {
    let discount = effects::revive_discount(state, env, state.turn.side);
    (state.rules.revive_gold_cost - discount).max(0)
}

pub fn guard_revive(
    state: &GameState,
    env: &GameEnv<'_>,
    pos: Pos,
    corpse_index: Option<usize>,
) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Necro)?;
    require_necro_action(state)?;
    let stack = state.corpses_by_pos.get(&pos).ok_or(Reject::NoCorpse)?;
    let index = corpse_index.unwrap_or(stack.len().saturating_sub(1));
    let corpse = stack.get(index).ok_or(Reject::NoCorpse)?;
    if corpse.side != state.turn.side {
        return Err(Reject::InvalidTarget);
    }
    if state.is_occupied(pos) {
        return Err(Reject::PositionOccupied);
    }
    require_gold(state, revive_cost(state, env))
}

pub fn guard_blood_ritual(state: &GameState) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Necro)?;
    if state.turn_flags.blood_ritual_used {
        return Err(Reject::BloodRitualUsed);
    }
    let king = state.king_of(state.turn.side).ok_or(Reject::UnitNotFound)?;
    // The king must survive the ritual.
    if king.hp_current <= state.rules.blood_ritual_hp_cost {
        return Err(Reject::KingHpTooLow);
    }
    Ok(())
}

pub fn guard_sacrifice(
    state: &GameState,
    env: &GameEnv<'_>,
    unit_id: &UnitId,
    target_id: &UnitId,
) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Necro)?;
    require_necro_action(state)?;
    let unit = state.unit(unit_id).ok_or(Reject::UnitNotFound)?;
    if unit.side != state.turn.side {
        return Err(Reject::NotYourUnit);
    }
    let (_, _, range) = effects::sacrifice_spec(env, unit).ok_or(Reject::NoSacrificeAbility)?;
    // Both modes pick an ally: it either dies or receives the buff.
    let target = state.unit(target_id).ok_or(Reject::UnitNotFound)?;
    if target.side != unit.side || target.id == unit.id {
        return Err(Reject::InvalidTarget);
    }
    if unit.pos.chebyshev(target.pos) > range {
        return Err(Reject::OutOfRange);
    }
    Ok(())
}

pub fn guard_buy_soul_from_deck(state: &GameState, base: crate::board::PieceBase) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Buy)?;
    require_one_soul_purchase(state)?;
    require_soul_hand_space(state)?;
    let deck = state.soul_deck_by_base.get(&base).map(Vec::as_slice).unwrap_or(&[]);
    if deck.is_empty() {
        return Err(Reject::DeckEmpty);
    }
    require_gold(state, state.rules.buy_soul_from_deck_gold_cost)
}

pub fn guard_buy_soul_from_display(
    state: &GameState,
    base: crate::board::PieceBase,
) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Buy)?;
    require_one_soul_purchase(state)?;
    require_soul_hand_space(state)?;
    let slot = state.display_by_base.get(&base).and_then(|s| s.as_ref());
    if slot.is_none() {
        return Err(Reject::NoCardInDisplay);
    }
    require_gold(state, state.rules.buy_soul_from_display_gold_cost)
}

pub fn guard_buy_soul_from_enemy_graveyard(
    state: &GameState,
    soul_id: &str,
) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Buy)?;
    require_one_soul_purchase(state)?;
    require_soul_hand_space(state)?;
    let enemy = state.turn.side.opponent();
    if !state.graveyard.get(enemy).iter().any(|s| s == soul_id) {
        return Err(Reject::NotInEnemyGraveyard);
    }
    require_gold(state, state.rules.buy_soul_from_graveyard_gold_cost)
}

pub fn guard_return_soul(state: &GameState, soul_id: &str) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Buy)?;
    let hand = &state.hands.get(state.turn.side).souls;
    if !hand.iter().any(|s| s == soul_id) {
        return Err(Reject::SoulNotInHand);
    }
    Ok(())
}

pub fn guard_buy_item(state: &GameState, env: &GameEnv<'_>, slot: usize) -> Result<(), Reject> {
    require_phase(state, TurnPhase::Buy)?;
    let max = state.rules.item_hand_max;
    if state.hands.get(state.turn.side).items.len() as u32 >= max {
        return Err(Reject::ItemHandFull(max));
    }
    let item_id = state
        .item_display
        .get(slot)
        .and_then(|s| s.as_ref())
        .ok_or(Reject::NoItemInDisplay)?;
    let card = env.catalog.item(item_id).map_err(|_| Reject::UnknownCard)?;
    require_gold(state, card.cost_gold)
}

/// Discarding is allowed in any phase.
pub fn guard_discard_item(state: &GameState, item_id: &str) -> Result<(), Reject> {
    let hand = &state.hands.get(state.turn.side).items;
    if !hand.iter().any(|i| i == item_id) {
        return Err(Reject::ItemNotInHand);
    }
    Ok(())
}

/// Pre-flight dispatch check: routes an action to its guard without applying
/// anything. A shot action is validated by building its full plan.
pub fn can_dispatch(
    state: &GameState,
    env: &GameEnv<'_>,
    action: &crate::action::Action,
) -> Result<(), Reject> {
    use crate::action::Action;
    match action {
        Action::NextPhase => Ok(()),
        Action::Move { unit, to } => guard_move(state, env, unit, *to),
        Action::Shoot {
            attacker,
            target,
            extra_target,
        } => crate::rules::shot_plan::build_shot_plan(
            state,
            env,
            attacker,
            target,
            extra_target.as_ref(),
        )
        .map(|_| ()),
        Action::Enchant { unit, soul_id } => guard_enchant(state, env, unit, soul_id),
        Action::Revive { pos, corpse_index } => guard_revive(state, env, *pos, *corpse_index),
        Action::BloodRitual => guard_blood_ritual(state),
        Action::Sacrifice { unit, target } => guard_sacrifice(state, env, unit, target),
        Action::BuySoulFromDeck { base } => guard_buy_soul_from_deck(state, *base),
        Action::BuySoulFromDisplay { base } => guard_buy_soul_from_display(state, *base),
        Action::BuySoulFromEnemyGraveyard { soul_id } => {
            guard_buy_soul_from_enemy_graveyard(state, soul_id)
        }
        Action::ReturnSoulToDeckBottom { soul_id } => guard_return_soul(state, soul_id),
        Action::BuyItemFromDisplay { slot } => guard_buy_item(state, env, *slot),
        Action::DiscardItemFromHand { item_id } => guard_discard_item(state, item_id),
        Action::UseItem { item_id, target } => {
            guard_use_item(state, env, item_id, target.as_ref())
        }
    }
}

pub fn guard_use_item(
    state: &GameState,
    env: &GameEnv<'_>,
    item_id: &str,
    target: Option<&UnitId>,
) -> Result<(), Reject> {
    let hand = &state.hands.get(state.turn.side).items;
    if !hand.iter().any(|i| i == item_id) {
        return Err(Reject::ItemNotInHand);
    }
    let card = env.catalog.item(item_id).map_err(|_| Reject::UnknownCard)?;
    let phase_ok = matches!(
        (card.timing, state.turn.phase),
        (ItemTiming::Buy, TurnPhase::Buy)
            | (ItemTiming::Necro, TurnPhase::Necro)
            | (ItemTiming::Combat, TurnPhase::Combat)
    );
    if !phase_ok {
        return Err(Reject::WrongTiming);
    }
    match &card.effect {
        Some(ItemEffect::HealUnit(_)) | Some(ItemEffect::FreeShoot) => {
            let target_id = target.ok_or(Reject::InvalidTarget)?;
            let unit = state.unit(target_id).ok_or(Reject::UnitNotFound)?;
            if unit.side != state.turn.side {
                return Err(Reject::NotYourUnit);
            }
        }
        _ => {}
    }
    Ok(())
}
