//! Read-only environment threaded through every rules call.
//!
//! State stores card ids only; the catalog itself travels alongside as an
//! oracle reference so that the engine stays a pure function of
//! `(state, env, action)`.

use crate::catalog::{Ability, Catalog, ItemCard, SoulCard};
use crate::error::DataError;
use crate::state::Unit;

#[derive(Clone, Copy, Debug)]
pub struct GameEnv<'a> {
    pub catalog: &'a Catalog,
}

impl<'a> GameEnv<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn soul_card(&self, id: &str) -> Result<&'a SoulCard, DataError> {
        self.catalog.soul(id)
    }

    pub fn item_card(&self, id: &str) -> Result<&'a ItemCard, DataError> {
        self.catalog.item(id)
    }

    /// Abilities granted by the unit's enchantment. Unenchanted units and
    /// dangling card references yield an empty slice; the interpreter treats
    /// both as "no abilities".
    pub fn abilities_of(&self, unit: &Unit) -> &'a [Ability] {
        unit.enchant
            .as_ref()
            .and_then(|e| self.catalog.soul_opt(&e.soul_id))
            .map(|card| card.abilities.as_slice())
            .unwrap_or(&[])
    }

    /// Clan of the unit's enchantment, if any.
    pub fn clan_of(&self, unit: &Unit) -> Option<&'a str> {
        unit.enchant
            .as_ref()
            .and_then(|e| self.catalog.soul_opt(&e.soul_id))
            .map(|card| card.clan.as_str())
    }
}
