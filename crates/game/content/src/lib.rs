//! Data-driven card content and loaders.
//!
//! This crate houses the built-in card set and provides loaders for
//! RON/TOML data files:
//! - Soul card catalogs (data-driven via RON, tolerant ability format)
//! - Item card catalogs (data-driven via RON)
//! - Match rules tables (data-driven via TOML, merged over defaults)
//!
//! Content is consumed through [`soulchess_core::Catalog`] and never appears
//! in game state; state stores card ids only.

pub mod loaders;

pub use loaders::{ItemLoader, LoadResult, RawAbilitySpec, RawSoulSpec, RulesLoader, SoulLoader};

use soulchess_core::{Catalog, RulesConfig};

const SOULS_RON: &str = include_str!("../data/souls.ron");
const ITEMS_RON: &str = include_str!("../data/items.ron");
const RULES_TOML: &str = include_str!("../data/rules.toml");

/// The card set compiled into the binary.
pub fn builtin_catalog() -> LoadResult<Catalog> {
    let souls = SoulLoader::parse(SOULS_RON)?;
    let items = ItemLoader::parse(ITEMS_RON)?;
    Ok(Catalog::new(souls, items))
}

/// The default match rules compiled into the binary.
pub fn builtin_rules() -> LoadResult<RulesConfig> {
    RulesLoader::parse(RULES_TOML)
}
