//! Soul card catalog loader.
//!
//! The on-disk ability format is deliberately permissive: every ability entry
//! is a flat record with a `kind` string plus whatever fields that kind
//! needs. Entries whose kind (or shape) the engine does not recognize are
//! dropped at load time, so externally authored card sets with newer ability
//! families degrade to ability-less cards instead of failing the whole load.
//!
//! Catalog files start with `#![enable(implicit_some)]` so optional fields
//! are written bare (`radius: 2`) rather than wrapped in `Some`.

use std::path::Path;

use serde::Deserialize;
use soulchess_core::{
    Ability, AbilityCondition, AuraGate, PerCorpses, PieceBase, PierceMode, SacrificeTarget,
    SoldierTier, SoulCard, UnitStats,
};

use crate::loaders::{LoadResult, read_file};

/// Soul catalog structure for RON files.
#[derive(Debug, Clone, Deserialize)]
pub struct SoulCatalog {
    pub souls: Vec<RawSoulSpec>,
}

/// One soul card as authored, before ability validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSoulSpec {
    pub id: String,
    pub clan: String,
    pub base: PieceBase,
    pub name: String,
    pub cost_gold: i32,
    pub stats: UnitStats,
    #[serde(default)]
    pub abilities: Vec<RawAbilitySpec>,
}

impl RawSoulSpec {
    /// Converts to a catalog card, silently dropping unrecognized abilities.
    pub fn into_card(self) -> SoulCard {
        SoulCard {
            id: self.id,
            clan: self.clan,
            base: self.base,
            name: self.name,
            cost_gold: self.cost_gold,
            stats: self.stats,
            abilities: self
                .abilities
                .into_iter()
                .filter_map(RawAbilitySpec::into_ability)
                .collect(),
        }
    }
}

/// Flat ability record: a `kind` discriminator plus optional fields.
/// Only the fields the named kind uses are read; the rest are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAbilitySpec {
    pub kind: String,
    pub count: Option<u32>,
    pub all: bool,
    pub cross_river: bool,
    pub when: Option<AbilityCondition>,
    pub radius: Option<u32>,
    pub per_turn: Option<u32>,
    pub value: Option<i32>,
    pub per_corpses: Option<PerCorpses>,
    pub gate: Option<AuraGate>,
    pub amount: Option<i32>,
    pub per: Option<u32>,
    pub floor: Option<i32>,
    pub def_minus: Option<i32>,
    pub river_bonus: Option<i32>,
    pub mode: Option<String>,
    pub corpses_gte: Option<u32>,
    pub allies_in_palace_gte: Option<u32>,
    pub reduction: Option<i32>,
    pub dice_sides: Option<u32>,
    pub damage: Option<i32>,
    pub ignore_def: bool,
    pub discount: Option<i32>,
    pub tiers: Option<Vec<SoldierTier>>,
    pub target: Option<String>,
    pub buff: Option<i32>,
    pub range: Option<u32>,
}

impl RawAbilitySpec {
    /// Maps the authored record onto the closed ability set. Unknown kinds
    /// and malformed records yield `None`.
    pub fn into_ability(self) -> Option<Ability> {
        match self.kind.as_str() {
            "IGNORE_BLOCKING" => Some(Ability::IgnoreBlocking {
                count: self.count.unwrap_or(0),
                all: self.all,
                cross_river: self.cross_river,
                when: self.when,
            }),
            "AURA_IGNORE_BLOCKING" => Some(Ability::AuraIgnoreBlocking {
                count: self.count.unwrap_or(0),
                all: self.all,
                when: self.when,
            }),
            "SPLASH" => Some(Ability::Splash {
                radius: self.radius?,
                per_turn: self.per_turn.unwrap_or(1),
                cross_river: self.cross_river,
            }),
            "DAMAGE_BONUS" => Some(Ability::DamageBonus {
                value: self.value.unwrap_or(0),
                per_corpses: self.per_corpses,
                cross_river: self.cross_river,
                when: self.when,
            }),
            "AURA_DAMAGE_BONUS" => Some(Ability::AuraDamageBonus {
                value: self.value.unwrap_or(0),
                per_corpses: self.per_corpses,
                gate: self.gate.unwrap_or_default(),
            }),
            "AURA_DEF_BONUS" => Some(Ability::AuraDefBonus {
                value: self.value?,
                gate: self.gate.unwrap_or_default(),
            }),
            "TARGET_DEF_MINUS" => Some(Ability::TargetDefMinus {
                amount: self.amount?,
                per: self.per.unwrap_or(1),
                floor: self.floor.unwrap_or(0),
            }),
            "MINGLEI" => Some(Ability::Minglei {
                def_minus: self.def_minus.unwrap_or(0),
                river_bonus: self.river_bonus.unwrap_or(0),
            }),
            "PIERCE" => {
                let mode = match self.mode.as_deref()? {
                    "SCREEN" => PierceMode::Screen,
                    "LINE" => PierceMode::Line {
                        count: self.count.unwrap_or(1),
                    },
                    _ => return None,
                };
                Some(Ability::Pierce(mode))
            }
            "CHAIN" => Some(Ability::Chain {
                radius: self.radius?,
                corpses_gte: self.corpses_gte.unwrap_or(0),
            }),
            "DAMAGE_SHARE" => Some(Ability::DamageShare {
                amount: self.amount?,
                allies_in_palace_gte: self.allies_in_palace_gte.unwrap_or(0),
            }),
            "PALACE_GUARD" => Some(Ability::PalaceGuard {
                reduction: self.reduction?,
                per_turn: self.per_turn.unwrap_or(1),
            }),
            "COUNTER_ON_KING_DAMAGED" => Some(Ability::CounterOnKingDamaged {
                dice_sides: self.dice_sides?,
                per_turn: self.per_turn.unwrap_or(1),
            }),
            "HEAL_KING_ON_KILL" => Some(Ability::HealKingOnKill {
                amount: self.amount?,
            }),
            "ON_DEATH_FIXED_DAMAGE" => Some(Ability::OnDeathFixedDamage {
                radius: self.radius?,
                damage: self.damage?,
                ignore_def: self.ignore_def,
            }),
            "MOVE_THEN_SHOOT" => Some(Ability::MoveThenShoot {
                per_turn: self.per_turn.unwrap_or(1),
                when: self.when,
            }),
            "IGNORE_PATH_BLOCKING" => Some(Ability::IgnorePathBlocking),
            "FREE_SHOOT" => Some(Ability::FreeShoot {
                per_turn: self.per_turn.unwrap_or(1),
            }),
            "LOGISTICS_REVIVE" => Some(Ability::LogisticsRevive {
                discount: self.discount?,
            }),
            "FORMATION_COMMAND" => Some(Ability::FormationCommand {
                radius: self.radius?,
            }),
            "SOLDIER_COUNT_AURA" => Some(Ability::SoldierCountAura { tiers: self.tiers? }),
            "SACRIFICE" => {
                let target = match self.target.as_deref()? {
                    "SELF" => SacrificeTarget::SelfUnit,
                    "ALLY" => SacrificeTarget::Ally,
                    _ => return None,
                };
                Some(Ability::Sacrifice {
                    target,
                    buff: self.buff.unwrap_or(0),
                    range: self.range.unwrap_or(1),
                })
            }
            _ => None,
        }
    }
}

/// Loader for soul catalogs from RON files.
pub struct SoulLoader;

impl SoulLoader {
    /// Load soul cards from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<SoulCard>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse soul cards from RON text.
    pub fn parse(content: &str) -> LoadResult<Vec<SoulCard>> {
        let catalog: SoulCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse soul catalog RON: {}", e))?;
        Ok(catalog.souls.into_iter().map(RawSoulSpec::into_card).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ability_kinds_are_dropped() {
        let text = r#"#![enable(implicit_some)]
        (
            souls: [
                (
                    id: "test_rook",
                    clan: "styx",
                    base: Rook,
                    name: "Test Rook",
                    cost_gold: 2,
                    stats: (hp: 9, atk: (key: Physical, value: 4), def: []),
                    abilities: [
                        (kind: "CHAIN", radius: 2, corpses_gte: 3),
                        (kind: "SOUL_STORM", radius: 4),
                    ],
                ),
            ],
        )"#;
        let cards = SoulLoader::parse(text).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].abilities.len(), 1);
        assert!(matches!(
            cards[0].abilities[0],
            Ability::Chain {
                radius: 2,
                corpses_gte: 3
            }
        ));
    }

    #[test]
    fn malformed_known_kind_is_dropped_too() {
        // SPLASH without a radius cannot be interpreted.
        let spec = RawAbilitySpec {
            kind: "SPLASH".to_string(),
            ..Default::default()
        };
        assert!(spec.into_ability().is_none());
    }

    #[test]
    fn conditions_and_gates_parse_inline() {
        let text = r#"#![enable(implicit_some)]
        (
            souls: [
                (
                    id: "test_cannon",
                    clan: "dark_moon",
                    base: Cannon,
                    name: "Test Cannon",
                    cost_gold: 3,
                    stats: (hp: 8, atk: (key: Magic, value: 4), def: []),
                    abilities: [
                        (kind: "IGNORE_BLOCKING", count: 1, when: Some(EnemiesInRangeGte(2))),
                        (kind: "AURA_DEF_BONUS", value: 1, gate: (beneficiary_in_palace: true)),
                    ],
                ),
            ],
        )"#;
        let cards = SoulLoader::parse(text).unwrap();
        assert_eq!(cards[0].abilities.len(), 2);
        assert!(matches!(
            &cards[0].abilities[0],
            Ability::IgnoreBlocking {
                count: 1,
                when: Some(AbilityCondition::EnemiesInRangeGte(2)),
                ..
            }
        ));
        assert!(matches!(
            &cards[0].abilities[1],
            Ability::AuraDefBonus { value: 1, gate } if gate.beneficiary_in_palace
        ));
    }
}
