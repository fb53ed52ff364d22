//! End-to-end scenarios against the built-in card set.

use soulchess_content::{builtin_catalog, builtin_rules};
use soulchess_core::{
    Action, Catalog, EngineError, GameEnv, GameState, PieceBase, Pos, Reject, RngMode, RulesConfig,
    Side, TurnPhase, Unit, UnitId, build_shot_plan, create_initial_state, guards, reduce,
};

fn setup() -> (Catalog, RulesConfig) {
    (
        builtin_catalog().expect("built-in catalog parses"),
        builtin_rules().expect("built-in rules parse"),
    )
}

fn enchanted(catalog: &Catalog, id: &str, side: Side, pos: Pos, soul_id: &str) -> Unit {
    let card = catalog.soul(soul_id).expect("soul exists");
    let mut unit = Unit::spawn(UnitId::new(id), side, card.base, pos);
    unit.apply_enchant(soul_id, &card.stats);
    unit
}

#[test]
fn same_seed_and_actions_produce_identical_states() {
    let (catalog, mut rules) = setup();
    rules.match_seed = 42;
    let env = GameEnv::new(&catalog);
    let script = [
        Action::NextPhase,
        Action::NextPhase,
        Action::Move {
            unit: UnitId::new("red:soldier:2"),
            to: Pos::new(4, 5),
        },
        Action::NextPhase,
        Action::NextPhase,
    ];
    let run = || {
        let mut state = create_initial_state(&env, rules.clone());
        for action in &script {
            state = reduce(&state, &env, action).expect("scripted action accepted").state;
        }
        state
    };
    let a = run();
    let b = run();
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );
}

#[test]
fn hand_limits_surface_stable_reason_strings() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = create_initial_state(&env, rules);
    state.resources.get_mut(Side::Red).gold = 10;
    state.hands.get_mut(Side::Red).souls =
        (0..5).map(|n| format!("soul_{n}")).collect();
    let err = guards::guard_buy_soul_from_deck(&state, PieceBase::Rook).unwrap_err();
    assert_eq!(err.to_string(), "Soul hand full (5)");

    state.hands.get_mut(Side::Red).items =
        (0..3).map(|n| format!("item_{n}")).collect();
    let err = guards::guard_buy_item(&state, &env, 0).unwrap_err();
    assert_eq!(err.to_string(), "Item hand full (3)");

    state.hands.get_mut(Side::Red).items.clear();
    state.item_display = vec![None, None, None];
    let err = guards::guard_buy_item(&state, &env, 1).unwrap_err();
    assert_eq!(err.to_string(), "No item in display");
}

#[test]
fn enchanting_overwrites_the_statline_wholesale() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = create_initial_state(&env, rules);
    state.turn.phase = TurnPhase::Necro;
    state
        .hands
        .get_mut(Side::Red)
        .souls
        .push("styx_ferryman".to_string());

    let rook = UnitId::new("red:rook:0");
    let t = reduce(
        &state,
        &env,
        &Action::Enchant {
            unit: rook.clone(),
            soul_id: "styx_ferryman".to_string(),
        },
    )
    .unwrap();
    let unit = t.state.unit(&rook).unwrap();
    let card = catalog.soul("styx_ferryman").unwrap();
    assert_eq!(unit.hp_current, card.stats.hp);
    assert_eq!(unit.atk, card.stats.atk);
    assert_eq!(unit.def, card.stats.def);
    assert_eq!(unit.enchant.as_ref().unwrap().soul_id, "styx_ferryman");
    assert!(t.state.hands.get(Side::Red).souls.is_empty());
    assert_eq!(t.state.necro_actions_left(), 0);
}

#[test]
fn enchant_rejects_a_base_mismatch() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = create_initial_state(&env, rules);
    state.turn.phase = TurnPhase::Necro;
    state
        .hands
        .get_mut(Side::Red)
        .souls
        .push("styx_ferryman".to_string());
    let err = reduce(
        &state,
        &env,
        &Action::Enchant {
            unit: UnitId::new("red:cannon:0"),
            soul_id: "styx_ferryman".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err, EngineError::Reject(Reject::BaseMismatch));
}

fn bare_combat_state(env: &GameEnv<'_>, rules: RulesConfig) -> GameState {
    let mut state = create_initial_state(env, rules);
    state.units.clear();
    state.turn.phase = TurnPhase::Combat;
    state.resources.get_mut(Side::Red).mana = 8;
    state
}

#[test]
fn river_crossed_revenant_shoots_through_one_blocker() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = bare_combat_state(&env, rules);

    let revenant = enchanted(&catalog, "red:rook:0", Side::Red, Pos::new(4, 4), "styx_revenant");
    state.units.insert(revenant.id.clone(), revenant);
    let plain = Unit::spawn(UnitId::new("red:rook:1"), Side::Red, PieceBase::Rook, Pos::new(5, 4));
    state.units.insert(plain.id.clone(), plain);
    for (id, pos) in [
        ("black:soldier:0", Pos::new(4, 2)),
        ("black:soldier:1", Pos::new(5, 2)),
        ("black:knight:0", Pos::new(4, 0)),
        ("black:knight:1", Pos::new(5, 0)),
    ] {
        let base = if id.contains("soldier") {
            PieceBase::Soldier
        } else {
            PieceBase::Knight
        };
        let unit = Unit::spawn(UnitId::new(id), Side::Black, base, pos);
        state.units.insert(unit.id.clone(), unit);
    }

    // The enchanted rook ignores the screen once it has crossed the river.
    assert!(build_shot_plan(
        &state,
        &env,
        &UnitId::new("red:rook:0"),
        &UnitId::new("black:knight:0"),
        None
    )
    .is_ok());
    // The unenchanted rook on the next file is blocked as usual.
    assert_eq!(
        build_shot_plan(
            &state,
            &env,
            &UnitId::new("red:rook:1"),
            &UnitId::new("black:knight:1"),
            None
        )
        .unwrap_err(),
        Reject::Blocked
    );
}

#[test]
fn seeded_shots_replay_bit_identically() {
    let (catalog, mut rules) = setup();
    rules.match_seed = 2026;
    rules.rng_mode = RngMode::Seeded;
    let env = GameEnv::new(&catalog);
    let mut state = bare_combat_state(&env, rules);
    let rook = Unit::spawn(UnitId::new("red:rook:0"), Side::Red, PieceBase::Rook, Pos::new(0, 9));
    state.units.insert(rook.id.clone(), rook);
    let target =
        Unit::spawn(UnitId::new("black:knight:0"), Side::Black, PieceBase::Knight, Pos::new(0, 2));
    state.units.insert(target.id.clone(), target);

    let action = Action::Shoot {
        attacker: UnitId::new("red:rook:0"),
        target: UnitId::new("black:knight:0"),
        extra_target: None,
    };
    let a = reduce(&state, &env, &action).unwrap();
    let b = reduce(&state, &env, &action).unwrap();
    assert_eq!(a.events, b.events);
    assert_eq!(a.state.rng_state, b.state.rng_state);
    assert_ne!(a.state.rng_state, state.rng_state);
}

#[test]
fn soul_purchases_cost_gold_and_are_limited() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = create_initial_state(&env, rules);
    state.resources.get_mut(Side::Red).gold = 6;

    let t = reduce(
        &state,
        &env,
        &Action::BuySoulFromDeck {
            base: PieceBase::Rook,
        },
    )
    .unwrap();
    assert_eq!(t.state.resources.get(Side::Red).gold, 4);
    assert_eq!(t.state.hands.get(Side::Red).souls.len(), 1);
    // The drawn card really is a rook soul from the built-in set.
    let drawn = &t.state.hands.get(Side::Red).souls[0];
    assert_eq!(catalog.soul(drawn).unwrap().base, PieceBase::Rook);

    let err = reduce(
        &t.state,
        &env,
        &Action::BuySoulFromDeck {
            base: PieceBase::Cannon,
        },
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Already bought a soul this turn");
}

#[test]
fn free_shoot_item_makes_the_next_shot_cost_nothing() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = bare_combat_state(&env, rules);
    state.resources.get_mut(Side::Red).mana = 2;
    let rook = Unit::spawn(UnitId::new("red:rook:0"), Side::Red, PieceBase::Rook, Pos::new(0, 9));
    state.units.insert(rook.id.clone(), rook);
    let target =
        Unit::spawn(UnitId::new("black:knight:0"), Side::Black, PieceBase::Knight, Pos::new(0, 2));
    state.units.insert(target.id.clone(), target);
    state
        .hands
        .get_mut(Side::Red)
        .items
        .push("powder_charge".to_string());

    let t = reduce(
        &state,
        &env,
        &Action::UseItem {
            item_id: "powder_charge".to_string(),
            target: Some(UnitId::new("red:rook:0")),
        },
    )
    .unwrap();
    assert!(t.state.turn_flags.free_shot_granted.contains(&UnitId::new("red:rook:0")));
    assert_eq!(t.state.item_discard, vec!["powder_charge".to_string()]);

    let t = reduce(
        &t.state,
        &env,
        &Action::Shoot {
            attacker: UnitId::new("red:rook:0"),
            target: UnitId::new("black:knight:0"),
            extra_target: None,
        },
    )
    .unwrap();
    // Mana untouched, grant consumed.
    assert_eq!(t.state.resources.get(Side::Red).mana, 2);
    assert!(t.state.turn_flags.free_shot_granted.is_empty());
}

#[test]
fn blood_ritual_funds_a_revive_and_an_enchant_in_one_turn() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = create_initial_state(&env, rules);
    state.turn.phase = TurnPhase::Necro;
    state.resources.get_mut(Side::Red).gold = 5;
    state.corpses_by_pos.insert(
        Pos::new(4, 5),
        vec![soulchess_core::CorpseEntry {
            side: Side::Red,
            base: PieceBase::Soldier,
        }],
    );
    state
        .hands
        .get_mut(Side::Red)
        .souls
        .push("styx_gravedigger".to_string());

    let t = reduce(&state, &env, &Action::BloodRitual).unwrap();
    assert_eq!(t.state.necro_actions_left(), 2);

    let t = reduce(
        &t.state,
        &env,
        &Action::Revive {
            pos: Pos::new(4, 5),
            corpse_index: None,
        },
    )
    .unwrap();
    let revived = UnitId::new("red:soldier:revive:0");
    assert_eq!(t.state.unit(&revived).unwrap().base, PieceBase::Soldier);
    assert_eq!(t.state.necro_actions_left(), 1);

    let t = reduce(
        &t.state,
        &env,
        &Action::Enchant {
            unit: revived.clone(),
            soul_id: "styx_gravedigger".to_string(),
        },
    )
    .unwrap();
    assert_eq!(
        t.state.unit(&revived).unwrap().enchant.as_ref().unwrap().soul_id,
        "styx_gravedigger"
    );
    assert_eq!(t.state.necro_actions_left(), 0);

    // Both actions are spent; a third necro action is rejected.
    let err = reduce(
        &t.state,
        &env,
        &Action::Revive {
            pos: Pos::new(4, 5),
            corpse_index: None,
        },
    )
    .unwrap_err();
    assert_eq!(err, EngineError::Reject(Reject::NoNecroActions));
}

#[test]
fn killed_enchanted_units_feed_the_graveyard_market() {
    let (catalog, rules) = setup();
    let env = GameEnv::new(&catalog);
    let mut state = bare_combat_state(&env, rules);
    let rook = Unit::spawn(UnitId::new("red:rook:0"), Side::Red, PieceBase::Rook, Pos::new(0, 9));
    state.units.insert(rook.id.clone(), rook);
    let mut victim =
        enchanted(&catalog, "black:soldier:0", Side::Black, Pos::new(0, 3), "dark_moon_shade");
    victim.hp_current = 1;
    state.units.insert(victim.id.clone(), victim);

    let t = reduce(
        &state,
        &env,
        &Action::Shoot {
            attacker: UnitId::new("red:rook:0"),
            target: UnitId::new("black:soldier:0"),
            extra_target: None,
        },
    )
    .unwrap();
    assert_eq!(
        t.state.graveyard.get(Side::Black),
        &vec!["dark_moon_shade".to_string()]
    );

    // Red can now buy that soul out of the enemy graveyard next buy phase.
    let mut buy_state = t.state.clone();
    buy_state.turn.phase = TurnPhase::Buy;
    buy_state.resources.get_mut(Side::Red).gold = 5;
    let t = reduce(
        &buy_state,
        &env,
        &Action::BuySoulFromEnemyGraveyard {
            soul_id: "dark_moon_shade".to_string(),
        },
    )
    .unwrap();
    assert!(t.state.graveyard.get(Side::Black).is_empty());
    assert_eq!(
        t.state.hands.get(Side::Red).souls,
        vec!["dark_moon_shade".to_string()]
    );
    assert_eq!(t.state.resources.get(Side::Red).gold, 2);
}
