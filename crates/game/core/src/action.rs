//! Player action vocabulary.
//!
//! A closed tagged union: the reducer matches exhaustively, so a protocol
//! mismatch (an action kind the engine does not know) is unrepresentable
//! rather than a runtime hazard.

use serde::{Deserialize, Serialize};

use crate::board::{PieceBase, Pos};
use crate::state::UnitId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Advance the phase cycle. Entering turn end folds mana into storage;
    /// the subsequent turn start (side swap, flag reset, income) runs
    /// synchronously and lands on the next side's buy phase.
    NextPhase,
    Move {
        unit: UnitId,
        to: Pos,
    },
    Shoot {
        attacker: UnitId,
        target: UnitId,
        /// Caller-chosen secondary target for a chain-capable attacker.
        #[serde(default)]
        extra_target: Option<UnitId>,
    },
    Enchant {
        unit: UnitId,
        soul_id: String,
    },
    Revive {
        pos: Pos,
        /// Index into the corpse stack; defaults to the top (most recent).
        #[serde(default)]
        corpse_index: Option<usize>,
    },
    BloodRitual,
    Sacrifice {
        unit: UnitId,
        target: UnitId,
    },
    BuySoulFromDeck {
        base: PieceBase,
    },
    BuySoulFromDisplay {
        base: PieceBase,
    },
    BuySoulFromEnemyGraveyard {
        soul_id: String,
    },
    ReturnSoulToDeckBottom {
        soul_id: String,
    },
    BuyItemFromDisplay {
        slot: usize,
    },
    DiscardItemFromHand {
        item_id: String,
    },
    UseItem {
        item_id: String,
        /// Required by unit-targeted item effects.
        #[serde(default)]
        target: Option<UnitId>,
    },
}

impl Action {
    /// snake_case name, used for logging keys.
    pub fn as_snake_case(&self) -> &'static str {
        match self {
            Action::NextPhase => "next_phase",
            Action::Move { .. } => "move",
            Action::Shoot { .. } => "shoot",
            Action::Enchant { .. } => "enchant",
            Action::Revive { .. } => "revive",
            Action::BloodRitual => "blood_ritual",
            Action::Sacrifice { .. } => "sacrifice",
            Action::BuySoulFromDeck { .. } => "buy_soul_from_deck",
            Action::BuySoulFromDisplay { .. } => "buy_soul_from_display",
            Action::BuySoulFromEnemyGraveyard { .. } => "buy_soul_from_enemy_graveyard",
            Action::ReturnSoulToDeckBottom { .. } => "return_soul_to_deck_bottom",
            Action::BuyItemFromDisplay { .. } => "buy_item_from_display",
            Action::DiscardItemFromHand { .. } => "discard_item_from_hand",
            Action::UseItem { .. } => "use_item",
        }
    }
}
