//! Append-only transition log.
//!
//! Events describe what happened during an accepted transition. They are
//! derived, never authoritative: state transitions are the source of truth
//! and events exist as an observability/animation feed for hosts.

use serde::{Deserialize, Serialize};

use crate::board::{PieceBase, Pos, Side};
use crate::catalog::AbilityKind;
use crate::rules::shot_plan::InstanceKind;
use crate::state::{TurnPhase, UnitId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseChanged {
        from: TurnPhase,
        to: TurnPhase,
    },
    UnitMoved {
        unit: UnitId,
        from: Pos,
        to: Pos,
    },
    ResourcesChanged {
        side: Side,
        gold: i32,
        mana: i32,
        storage_mana: i32,
    },
    ShotFired {
        attacker: UnitId,
        target: UnitId,
    },
    DiceRolled {
        value: u32,
    },
    DamageDealt {
        kind: InstanceKind,
        source: UnitId,
        target: UnitId,
        amount: i32,
        /// True for the redirected portion of a damage-shared hit.
        shared: bool,
    },
    UnitKilled {
        unit: UnitId,
        pos: Pos,
    },
    Enchanted {
        unit: UnitId,
        soul: String,
    },
    Revived {
        unit: UnitId,
        pos: Pos,
        base: PieceBase,
    },
    AbilityTriggered {
        unit: UnitId,
        kind: AbilityKind,
    },
    ItemUsed {
        side: Side,
        item: String,
    },
    SoulBought {
        side: Side,
        soul: String,
    },
    ItemBought {
        side: Side,
        item: String,
    },
    SoulReturned {
        side: Side,
        soul: String,
    },
    ItemDiscarded {
        side: Side,
        item: String,
    },
    BloodRitual {
        side: Side,
    },
    Sacrificed {
        unit: UnitId,
        beneficiary: UnitId,
    },
    KingHealed {
        unit: UnitId,
        amount: i32,
    },
}
