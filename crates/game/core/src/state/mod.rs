//! Authoritative game state representation.
//!
//! [`GameState`] is a single immutable value: the reducer clones it, mutates
//! the clone exclusively, and returns it. Rejected actions leave the input
//! untouched. The whole tree serializes to a plain nested structure — it is
//! the wire format exchanged with the hosting layer.

mod factory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{PieceBase, Pos, Side};
use crate::catalog::AbilityKind;
use crate::rng::RngMode;
use crate::stats::{AttackStat, DefStat, UnitStats};

pub use factory::create_initial_state;

/// Stable unit identifier. Ordering is lexical byte order and is the
/// deterministic tie-break for every multi-bearer ability resolution.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a unit placed at match start.
    pub fn initial(side: Side, base: PieceBase, index: u32) -> Self {
        Self(format!("{side}:{base}:{index}"))
    }

    /// Deterministic revive id; `n` is the smallest free non-negative integer.
    pub fn revive(side: Side, base: PieceBase, n: u32) -> Self {
        Self(format!("{side}:{base}:revive:{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An enchantment applied to a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enchant {
    pub soul_id: String,
}

/// A living piece on the board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub side: Side,
    pub base: PieceBase,
    pub pos: Pos,
    pub hp_current: i32,
    pub atk: AttackStat,
    pub def: Vec<DefStat>,
    #[serde(default)]
    pub enchant: Option<Enchant>,
}

impl Unit {
    /// Fresh unenchanted unit with base stats.
    pub fn spawn(id: UnitId, side: Side, base: PieceBase, pos: Pos) -> Self {
        let stats = base.base_stats();
        Self {
            id,
            side,
            base,
            pos,
            hp_current: stats.hp,
            atk: stats.atk,
            def: stats.def,
            enchant: None,
        }
    }

    /// Max HP implied by the current enchant (or base stats when none).
    /// `hp_current` never exceeds this.
    pub fn max_hp(&self, env: &crate::env::GameEnv<'_>) -> i32 {
        self.enchant
            .as_ref()
            .and_then(|e| env.catalog.soul_opt(&e.soul_id))
            .map(|card| card.stats.hp)
            .unwrap_or_else(|| self.base.base_stats().hp)
    }

    /// Overwrites the statline wholesale with the card's stats.
    pub fn apply_enchant(&mut self, soul_id: &str, stats: &UnitStats) {
        self.enchant = Some(Enchant {
            soul_id: soul_id.to_string(),
        });
        self.hp_current = stats.hp;
        self.atk = stats.atk;
        self.def = stats.def.clone();
    }
}

/// Record left at a board position when a unit dies there. Stacks are
/// append-only except for revive/refine removal; the last entry is the most
/// recently deceased and the default revival candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpseEntry {
    pub side: Side,
    pub base: PieceBase,
}

/// Turn phases. `TurnStart` is transient: the reducer collapses it into
/// `Buy` within the same transition, so stored state never rests on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    TurnStart,
    Buy,
    Necro,
    Combat,
    TurnEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub side: Side,
    pub phase: TurnPhase,
}

/// Per-turn usage counters and flags, reset wholesale at turn start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFlags {
    /// Units that have fired their regular shot this turn.
    pub shot_used: BTreeSet<UnitId>,
    /// Units that have moved this turn.
    pub moved_this_turn: BTreeSet<UnitId>,
    /// Per-ability usage counters, keyed (unit, ability family).
    pub ability_uses: BTreeMap<UnitId, BTreeMap<AbilityKind, u32>>,
    /// One combined soul purchase per turn (deck, display, or graveyard).
    pub soul_bought: bool,
    pub blood_ritual_used: bool,
    pub necro_actions_used: u32,
    /// Extra necro actions granted this turn (blood ritual, items).
    pub necro_bonus_actions: u32,
    /// Units whose next shot this turn is mana-free (item buff).
    pub free_shot_granted: BTreeSet<UnitId>,
}

impl TurnFlags {
    pub fn ability_use_count(&self, unit: &UnitId, kind: AbilityKind) -> u32 {
        self.ability_uses
            .get(unit)
            .and_then(|m| m.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn bump_ability_use(&mut self, unit: &UnitId, kind: AbilityKind) {
        *self
            .ability_uses
            .entry(unit.clone())
            .or_default()
            .entry(kind)
            .or_insert(0) += 1;
    }
}

/// Cross-turn flags that outlive the phase cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusState {
    /// This side's king takes zero delivered damage. Cleared at the owning
    /// side's next turn start.
    pub king_invincible_side: Option<Side>,
    /// Pending combat buffs from sacrifice actions, keyed by beneficiary.
    /// Consumed by the next qualifying shot; stale entries are cleared at
    /// the owner's next turn start.
    pub sacrifice_buff_by_unit: BTreeMap<UnitId, i32>,
}

/// Two-slot container indexed by side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub red: T,
    pub black: T,
}

impl<T> PerSide<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Red => &self.red,
            Side::Black => &self.black,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Red => &mut self.red,
            Side::Black => &mut self.black,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub souls: Vec<String>,
    pub items: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub gold: i32,
    pub mana: i32,
    pub storage_mana: i32,
}

/// Match configuration: cost tables, caps, dice mode, enabled card pools.
/// Immutable for the life of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub first_side: Side,
    pub rng_mode: RngMode,
    pub match_seed: u32,
    pub dice_sides: u32,
    /// Die value used whenever no seeded roll context exists.
    pub dice_fixed: u32,
    pub enabled_clans: Vec<String>,
    pub shoot_mana_cost: i32,
    pub buy_soul_from_deck_gold_cost: i32,
    pub buy_soul_from_display_gold_cost: i32,
    pub buy_soul_from_graveyard_gold_cost: i32,
    pub return_soul_refund_gold: i32,
    pub revive_gold_cost: i32,
    pub blood_ritual_hp_cost: i32,
    pub gold_income_per_turn: i32,
    pub mana_income_per_turn: i32,
    pub storage_to_gold_rate: i32,
    pub gold_max: i32,
    pub mana_max: i32,
    pub storage_mana_max: i32,
    pub start_gold_first: i32,
    pub start_gold_second: i32,
    pub start_mana: i32,
    pub soul_hand_max: u32,
    pub item_hand_max: u32,
    pub necro_actions_per_turn: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            first_side: Side::Red,
            rng_mode: RngMode::Seeded,
            match_seed: 1,
            dice_sides: 6,
            dice_fixed: 3,
            enabled_clans: vec![
                "dark_moon".to_string(),
                "styx".to_string(),
                "eternal_night".to_string(),
            ],
            shoot_mana_cost: 2,
            buy_soul_from_deck_gold_cost: 2,
            buy_soul_from_display_gold_cost: 2,
            buy_soul_from_graveyard_gold_cost: 3,
            return_soul_refund_gold: 1,
            revive_gold_cost: 2,
            blood_ritual_hp_cost: 3,
            gold_income_per_turn: 2,
            mana_income_per_turn: 2,
            storage_to_gold_rate: 1,
            gold_max: 12,
            mana_max: 8,
            storage_mana_max: 6,
            start_gold_first: 2,
            start_gold_second: 3,
            start_mana: 2,
            soul_hand_max: 5,
            item_hand_max: 3,
            necro_actions_per_turn: 1,
        }
    }
}

/// Number of face-up item display slots.
pub const ITEM_DISPLAY_SLOTS: usize = 3;

/// Canonical snapshot of the deterministic game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub units: BTreeMap<UnitId, Unit>,
    pub corpses_by_pos: BTreeMap<Pos, Vec<CorpseEntry>>,
    /// Per-side enchantment-card graveyards, most recent first.
    pub graveyard: PerSide<Vec<String>>,
    /// Per-base draw piles; index 0 is the top.
    pub soul_deck_by_base: BTreeMap<PieceBase, Vec<String>>,
    /// One face-up slot per base, refilled from the deck when emptied.
    pub display_by_base: BTreeMap<PieceBase, Option<String>>,
    pub item_deck: Vec<String>,
    pub item_display: Vec<Option<String>>,
    pub item_discard: Vec<String>,
    pub turn: TurnState,
    pub turn_flags: TurnFlags,
    pub status: StatusState,
    pub hands: PerSide<Hand>,
    pub resources: PerSide<Resources>,
    pub rules: RulesConfig,
    /// xorshift32 word, written back after every roll and shuffle.
    pub rng_state: u32,
}

impl GameState {
    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_at(&self, pos: Pos) -> Option<&Unit> {
        self.units.values().find(|u| u.pos == pos)
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.unit_at(pos).is_some()
    }

    /// Units of one side in ascending id order.
    pub fn units_of_side(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.side == side)
    }

    /// The side's king, if still alive. Unique by construction.
    pub fn king_of(&self, side: Side) -> Option<&Unit> {
        self.units_of_side(side).find(|u| u.base == PieceBase::King)
    }

    /// Total corpses belonging to `side` across all stacks.
    pub fn corpse_count(&self, side: Side) -> u32 {
        self.corpses_by_pos
            .values()
            .flat_map(|stack| stack.iter())
            .filter(|c| c.side == side)
            .count() as u32
    }

    /// Living soldiers fielded by `side`.
    pub fn soldier_count(&self, side: Side) -> u32 {
        self.units_of_side(side)
            .filter(|u| u.base == PieceBase::Soldier)
            .count() as u32
    }

    /// Necro actions still available this turn.
    pub fn necro_actions_left(&self) -> u32 {
        let cap = self.rules.necro_actions_per_turn + self.turn_flags.necro_bonus_actions;
        cap.saturating_sub(self.turn_flags.necro_actions_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_ordering_is_lexical() {
        let a = UnitId::new("black:rook:0");
        let b = UnitId::new("red:cannon:1");
        assert!(a < b);
        let r0 = UnitId::revive(Side::Red, PieceBase::Soldier, 0);
        assert_eq!(r0.as_str(), "red:soldier:revive:0");
    }

    #[test]
    fn ability_use_counters_use_composite_keys() {
        let mut flags = TurnFlags::default();
        let unit = UnitId::new("red:cannon:0");
        assert_eq!(flags.ability_use_count(&unit, AbilityKind::Splash), 0);
        flags.bump_ability_use(&unit, AbilityKind::Splash);
        flags.bump_ability_use(&unit, AbilityKind::Splash);
        flags.bump_ability_use(&unit, AbilityKind::Chain);
        assert_eq!(flags.ability_use_count(&unit, AbilityKind::Splash), 2);
        assert_eq!(flags.ability_use_count(&unit, AbilityKind::Chain), 1);
    }
}
