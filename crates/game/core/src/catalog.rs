//! Immutable card reference data.
//!
//! Soul cards are enchantments: applying one to a unit overwrites the unit's
//! statline and grants the card's abilities. Item cards are one-shot effects
//! bound to a turn phase. The catalog is loaded once (by the content layer)
//! and looked up by id; game state stores ids only.
//!
//! Abilities form a closed tagged-variant type interpreted by
//! [`crate::rules::effects`]. The catalog format itself is data-driven:
//! loaders drop ability entries they do not recognize instead of failing, so
//! externally authored content with newer ability types degrades to no-ops.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::PieceBase;
use crate::error::DataError;
use crate::stats::UnitStats;

/// Gate condition attached to an ability. Evaluated against the bearer and
/// the shot context before the ability applies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityCondition {
    /// Bearer's side has at least this many corpses on the board.
    CorpsesGte(u32),
    /// The shooter has at least this many enemies inside its firing pattern
    /// (geometry only, blocking ignored).
    EnemiesInRangeGte(u32),
    /// Bearer's side fields at least this many soldiers.
    AlliedSoldiersGte(u32),
}

/// Shared gate block for aura abilities.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraGate {
    /// Bearer must stand inside its own palace.
    #[serde(default)]
    pub source_in_palace: bool,
    /// The unit receiving the aura must stand inside its own palace.
    #[serde(default)]
    pub beneficiary_in_palace: bool,
    /// The unit receiving the aura must be enchanted with a soul of this clan.
    #[serde(default)]
    pub clan: Option<String>,
    /// Resonance: at least this many allied units share the bearer's clan.
    #[serde(default)]
    pub resonance: Option<u32>,
    /// The unit receiving the aura must have crossed the river.
    #[serde(default)]
    pub cross_river: bool,
}

/// Corpse-count scaling: `amount` per every `per` corpses of the relevant side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCorpses {
    pub per: u32,
    pub amount: i32,
}

/// How a pierce shot selects its secondary victims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PierceMode {
    /// Hit the cannon's screen unit in addition to the target.
    Screen,
    /// Hit the first `count` enemies along the firing line past the target.
    Line { count: u32 },
}

/// Which unit dies and which receives the buff in a sacrifice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SacrificeTarget {
    /// The bearer dies; a chosen ally in range receives the buff.
    SelfUnit,
    /// A chosen ally in range dies; the bearer receives the buff.
    Ally,
}

/// One tier of a soldier-count aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldierTier {
    pub count_gte: u32,
    pub bonus: i32,
}

/// Closed set of ability families. Every variant is interpreted by the single
/// evaluator in `rules::effects`; there is no per-ability code anywhere else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    /// Shooter ignores up to `count` blockers (or all of them).
    IgnoreBlocking {
        count: u32,
        #[serde(default)]
        all: bool,
        #[serde(default)]
        cross_river: bool,
        #[serde(default)]
        when: Option<AbilityCondition>,
    },
    /// Allied shooters ignore blockers while the bearer is on the board.
    AuraIgnoreBlocking {
        count: u32,
        #[serde(default)]
        all: bool,
        #[serde(default)]
        when: Option<AbilityCondition>,
    },
    /// Secondary damage to every enemy within `radius` of the main target,
    /// at the main shot's raw damage.
    Splash {
        radius: u32,
        per_turn: u32,
        #[serde(default)]
        cross_river: bool,
    },
    /// Flat and/or corpse-scaled damage bonus on the bearer's own shots.
    DamageBonus {
        value: i32,
        #[serde(default)]
        per_corpses: Option<PerCorpses>,
        #[serde(default)]
        cross_river: bool,
        #[serde(default)]
        when: Option<AbilityCondition>,
    },
    /// Damage bonus granted to allied shooters.
    AuraDamageBonus {
        value: i32,
        #[serde(default)]
        per_corpses: Option<PerCorpses>,
        #[serde(default)]
        gate: AuraGate,
    },
    /// Defense bonus granted to allied defenders.
    AuraDefBonus {
        value: i32,
        #[serde(default)]
        gate: AuraGate,
    },
    /// Reduces the target's defense, scaled by the bearer's own corpse count
    /// and clamped at `floor`.
    TargetDefMinus {
        amount: i32,
        per: u32,
        floor: i32,
    },
    /// Magic-defense reduction plus a bonus against targets that have
    /// crossed their own river.
    Minglei {
        def_minus: i32,
        river_bonus: i32,
    },
    Pierce(PierceMode),
    /// One caller-chosen secondary target within `radius` of the main target.
    /// Gated by a corpse threshold unless a sacrifice buff overrides it.
    Chain {
        radius: u32,
        corpses_gte: u32,
    },
    /// Redirect up to `amount` damage from a palace-defended target to the
    /// bearer. The target always keeps at least 1 of the raw damage.
    DamageShare {
        amount: i32,
        allies_in_palace_gte: u32,
    },
    /// Flat damage reduction applied to the allied king, capped per turn.
    PalaceGuard {
        reduction: i32,
        per_turn: u32,
    },
    /// Reflects dice damage at the shooter when the allied king is damaged.
    CounterOnKingDamaged {
        dice_sides: u32,
        per_turn: u32,
    },
    /// Heals the allied king when the bearer kills an enemy.
    HealKingOnKill {
        amount: i32,
    },
    /// Defense-ignoring AoE around the bearer's corpse when it dies.
    /// The `ignore_def` flag is honored faithfully: when false the effect is
    /// skipped entirely.
    OnDeathFixedDamage {
        radius: u32,
        damage: i32,
        ignore_def: bool,
    },
    /// One additional shot per turn after the bearer has moved.
    MoveThenShoot {
        per_turn: u32,
        #[serde(default)]
        when: Option<AbilityCondition>,
    },
    /// Movement-side blocking bypass (knight legs, elephant eyes).
    IgnorePathBlocking,
    /// The bearer's next shot this turn costs no mana.
    FreeShoot {
        per_turn: u32,
    },
    /// Flat discount on revive gold cost while the bearer is on the board.
    LogisticsRevive {
        discount: i32,
    },
    /// Allied soldiers within `radius` may step sideways before crossing.
    FormationCommand {
        radius: u32,
    },
    /// Tiered damage bonus to allied shooters based on allied soldier count.
    SoldierCountAura {
        tiers: Vec<SoldierTier>,
    },
    /// Enables the sacrifice action for the bearer's clan.
    Sacrifice {
        target: SacrificeTarget,
        buff: i32,
        range: u32,
    },
}

/// Discriminant-only mirror of [`Ability`], used as the per-turn usage key
/// and in events.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AbilityKind {
    IgnoreBlocking,
    AuraIgnoreBlocking,
    Splash,
    DamageBonus,
    AuraDamageBonus,
    AuraDefBonus,
    TargetDefMinus,
    Minglei,
    Pierce,
    Chain,
    DamageShare,
    PalaceGuard,
    CounterOnKingDamaged,
    HealKingOnKill,
    OnDeathFixedDamage,
    MoveThenShoot,
    IgnorePathBlocking,
    FreeShoot,
    LogisticsRevive,
    FormationCommand,
    SoldierCountAura,
    Sacrifice,
}

impl Ability {
    pub fn kind(&self) -> AbilityKind {
        match self {
            Ability::IgnoreBlocking { .. } => AbilityKind::IgnoreBlocking,
            Ability::AuraIgnoreBlocking { .. } => AbilityKind::AuraIgnoreBlocking,
            Ability::Splash { .. } => AbilityKind::Splash,
            Ability::DamageBonus { .. } => AbilityKind::DamageBonus,
            Ability::AuraDamageBonus { .. } => AbilityKind::AuraDamageBonus,
            Ability::AuraDefBonus { .. } => AbilityKind::AuraDefBonus,
            Ability::TargetDefMinus { .. } => AbilityKind::TargetDefMinus,
            Ability::Minglei { .. } => AbilityKind::Minglei,
            Ability::Pierce(_) => AbilityKind::Pierce,
            Ability::Chain { .. } => AbilityKind::Chain,
            Ability::DamageShare { .. } => AbilityKind::DamageShare,
            Ability::PalaceGuard { .. } => AbilityKind::PalaceGuard,
            Ability::CounterOnKingDamaged { .. } => AbilityKind::CounterOnKingDamaged,
            Ability::HealKingOnKill { .. } => AbilityKind::HealKingOnKill,
            Ability::OnDeathFixedDamage { .. } => AbilityKind::OnDeathFixedDamage,
            Ability::MoveThenShoot { .. } => AbilityKind::MoveThenShoot,
            Ability::IgnorePathBlocking => AbilityKind::IgnorePathBlocking,
            Ability::FreeShoot { .. } => AbilityKind::FreeShoot,
            Ability::LogisticsRevive { .. } => AbilityKind::LogisticsRevive,
            Ability::FormationCommand { .. } => AbilityKind::FormationCommand,
            Ability::SoldierCountAura { .. } => AbilityKind::SoldierCountAura,
            Ability::Sacrifice { .. } => AbilityKind::Sacrifice,
        }
    }
}

/// When an item may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemTiming {
    Buy,
    Necro,
    Combat,
}

/// One-shot item effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    GainGold(i32),
    GainMana(i32),
    /// Heal a chosen owned unit, capped at its max HP.
    HealUnit(i32),
    /// The owner's king takes no damage until the owner's next turn start.
    KingInvincible,
    BonusNecroAction,
    /// A chosen owned unit's next shot this turn costs no mana.
    FreeShoot,
}

/// Immutable soul card entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoulCard {
    pub id: String,
    pub clan: String,
    pub base: PieceBase,
    pub name: String,
    pub cost_gold: i32,
    pub stats: UnitStats,
    pub abilities: Vec<Ability>,
}

/// Immutable item card entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemCard {
    pub id: String,
    pub name: String,
    pub cost_gold: i32,
    pub timing: ItemTiming,
    #[serde(default)]
    pub effect: Option<ItemEffect>,
}

/// Id-indexed card reference data, built once per process.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    souls: BTreeMap<String, SoulCard>,
    items: BTreeMap<String, ItemCard>,
}

impl Catalog {
    pub fn new(souls: Vec<SoulCard>, items: Vec<ItemCard>) -> Self {
        Self {
            souls: souls.into_iter().map(|c| (c.id.clone(), c)).collect(),
            items: items.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    pub fn soul(&self, id: &str) -> Result<&SoulCard, DataError> {
        self.souls
            .get(id)
            .ok_or_else(|| DataError::UnknownSoulCard(id.to_string()))
    }

    pub fn item(&self, id: &str) -> Result<&ItemCard, DataError> {
        self.items
            .get(id)
            .ok_or_else(|| DataError::UnknownItemCard(id.to_string()))
    }

    /// Soul lookup that treats a missing entry as "no card". The ability
    /// interpreter uses this: dangling enchant references degrade to
    /// ability-less units instead of faulting mid-scan.
    pub fn soul_opt(&self, id: &str) -> Option<&SoulCard> {
        self.souls.get(id)
    }

    /// All soul cards in ascending id order.
    pub fn list_souls(&self) -> impl Iterator<Item = &SoulCard> {
        self.souls.values()
    }

    /// All item cards in ascending id order.
    pub fn list_items(&self) -> impl Iterator<Item = &ItemCard> {
        self.items.values()
    }
}
