//! Initial state construction.

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::board::{PieceBase, Pos, Side};
use crate::env::GameEnv;
use crate::rng::{RngMode, create_rng_state};

use super::{
    GameState, Hand, ITEM_DISPLAY_SLOTS, PerSide, Resources, RulesConfig, StatusState, TurnFlags,
    TurnPhase, TurnState, Unit, UnitId,
};

/// Builds the starting state for a match.
///
/// The first-moving side starts with `start_gold_first`/`start_mana`; the
/// second side starts with `start_gold_second` and zero mana. The zero is
/// deliberate: the second side's first turn passes through the automatic
/// turn-start income step, which would otherwise double-grant mana.
pub fn create_initial_state(env: &GameEnv<'_>, rules: RulesConfig) -> GameState {
    let mut units = BTreeMap::new();
    for side in [Side::Red, Side::Black] {
        for (base, pos, index) in starting_layout(side) {
            let id = UnitId::initial(side, base, index);
            units.insert(id.clone(), Unit::spawn(id, side, base, pos));
        }
    }

    let mut rng = create_rng_state(rules.match_seed);
    let seeded = rules.rng_mode == RngMode::Seeded;

    // Per-base soul decks: filter to enabled clans, sort by id for
    // determinism, shuffle only in seeded mode.
    let mut soul_deck_by_base = BTreeMap::new();
    let mut display_by_base = BTreeMap::new();
    for base in PieceBase::iter() {
        let mut deck: Vec<String> = env
            .catalog
            .list_souls()
            .filter(|card| card.base == base && rules.enabled_clans.contains(&card.clan))
            .map(|card| card.id.clone())
            .collect();
        deck.sort();
        if seeded {
            rng.shuffle(&mut deck);
        }
        let display = if deck.is_empty() {
            None
        } else {
            Some(deck.remove(0))
        };
        soul_deck_by_base.insert(base, deck);
        display_by_base.insert(base, display);
    }

    let mut item_deck: Vec<String> = env.catalog.list_items().map(|c| c.id.clone()).collect();
    item_deck.sort();
    if seeded {
        rng.shuffle(&mut item_deck);
    }
    let mut item_display = Vec::with_capacity(ITEM_DISPLAY_SLOTS);
    for _ in 0..ITEM_DISPLAY_SLOTS {
        item_display.push(if item_deck.is_empty() {
            None
        } else {
            Some(item_deck.remove(0))
        });
    }

    let first = rules.first_side;
    let mut resources = PerSide::<Resources>::default();
    resources.get_mut(first).gold = rules.start_gold_first;
    resources.get_mut(first).mana = rules.start_mana;
    resources.get_mut(first.opponent()).gold = rules.start_gold_second;
    resources.get_mut(first.opponent()).mana = 0;

    GameState {
        units,
        corpses_by_pos: BTreeMap::new(),
        graveyard: PerSide::default(),
        soul_deck_by_base,
        display_by_base,
        item_deck,
        item_display,
        item_discard: Vec::new(),
        turn: TurnState {
            side: first,
            phase: TurnPhase::Buy,
        },
        turn_flags: TurnFlags::default(),
        status: StatusState::default(),
        hands: PerSide::<Hand>::default(),
        resources,
        rules,
        rng_state: rng.0,
    }
}

/// Classical Xiangqi opening layout for one side, with a per-base index
/// counting left to right.
fn starting_layout(side: Side) -> Vec<(PieceBase, Pos, u32)> {
    let (back, cannon_row, soldier_row) = match side {
        Side::Red => (9, 7, 6),
        Side::Black => (0, 2, 3),
    };
    let mut out = Vec::with_capacity(16);
    let back_rank = [
        PieceBase::Rook,
        PieceBase::Knight,
        PieceBase::Elephant,
        PieceBase::Advisor,
        PieceBase::King,
        PieceBase::Advisor,
        PieceBase::Elephant,
        PieceBase::Knight,
        PieceBase::Rook,
    ];
    let mut counts: BTreeMap<PieceBase, u32> = BTreeMap::new();
    for (x, base) in back_rank.into_iter().enumerate() {
        let index = counts.entry(base).or_insert(0);
        out.push((base, Pos::new(x as i32, back), *index));
        *index += 1;
    }
    for (i, x) in [1, 7].into_iter().enumerate() {
        out.push((PieceBase::Cannon, Pos::new(x, cannon_row), i as u32));
    }
    for (i, x) in [0, 2, 4, 6, 8].into_iter().enumerate() {
        out.push((PieceBase::Soldier, Pos::new(x, soldier_row), i as u32));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn empty_env() -> Catalog {
        Catalog::default()
    }

    #[test]
    fn sixteen_units_per_side() {
        let catalog = empty_env();
        let env = GameEnv::new(&catalog);
        let state = create_initial_state(&env, RulesConfig::default());
        assert_eq!(state.units.len(), 32);
        assert_eq!(state.units_of_side(Side::Red).count(), 16);
        assert_eq!(state.units_of_side(Side::Black).count(), 16);
        let red_king = state.king_of(Side::Red).unwrap();
        assert_eq!(red_king.pos, Pos::new(4, 9));
        let black_king = state.king_of(Side::Black).unwrap();
        assert_eq!(black_king.pos, Pos::new(4, 0));
    }

    #[test]
    fn second_mover_starts_with_zero_mana() {
        let catalog = empty_env();
        let env = GameEnv::new(&catalog);
        let rules = RulesConfig::default();
        let state = create_initial_state(&env, rules.clone());
        assert_eq!(state.resources.get(Side::Red).mana, rules.start_mana);
        assert_eq!(state.resources.get(Side::Black).mana, 0);
        assert_eq!(
            state.resources.get(Side::Black).gold,
            rules.start_gold_second
        );
    }

    #[test]
    fn starts_in_buy_phase_for_first_side() {
        let catalog = empty_env();
        let env = GameEnv::new(&catalog);
        let state = create_initial_state(&env, RulesConfig::default());
        assert_eq!(state.turn.side, Side::Red);
        assert_eq!(state.turn.phase, TurnPhase::Buy);
    }
}
