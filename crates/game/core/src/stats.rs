//! Combat stat primitives shared by units and soul cards.

use serde::{Deserialize, Serialize};

/// Attack channel. Defense entries are matched against the attacker's key;
/// a missing entry counts as zero defense on that channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttackKey {
    Physical,
    Magic,
}

/// A unit's single attack stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStat {
    pub key: AttackKey,
    pub value: i32,
}

impl AttackStat {
    pub fn new(key: AttackKey, value: i32) -> Self {
        Self { key, value }
    }
}

/// One defense entry. Units carry a list of these, at most one per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefStat {
    pub key: AttackKey,
    pub value: i32,
}

impl DefStat {
    pub fn new(key: AttackKey, value: i32) -> Self {
        Self { key, value }
    }
}

/// Full combat statline. Enchanting a unit overwrites its stats with the
/// card's `UnitStats` wholesale; it is never an additive buff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub hp: i32,
    pub atk: AttackStat,
    pub def: Vec<DefStat>,
}

impl UnitStats {
    /// Defense value against the given attack key (zero when absent).
    pub fn defense_against(&self, key: AttackKey) -> i32 {
        self.def
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value)
            .unwrap_or(0)
    }
}

/// Looks up a defense value in a def list (zero when absent).
pub fn defense_value(def: &[DefStat], key: AttackKey) -> i32 {
    def.iter()
        .find(|d| d.key == key)
        .map(|d| d.value)
        .unwrap_or(0)
}
