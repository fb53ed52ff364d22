//! Item card catalog loader.

use std::path::Path;

use serde::Deserialize;
use soulchess_core::ItemCard;

use crate::loaders::{LoadResult, read_file};

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemCard>,
}

/// Loader for item catalogs from RON files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load item cards from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<ItemCard>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse item cards from RON text.
    pub fn parse(content: &str) -> LoadResult<Vec<ItemCard>> {
        let catalog: ItemCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;
        Ok(catalog.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulchess_core::{ItemEffect, ItemTiming};

    #[test]
    fn items_parse_with_timing_and_effect() {
        let text = r#"(
            items: [
                (
                    id: "gold_cache",
                    name: "Gold Cache",
                    cost_gold: 1,
                    timing: Buy,
                    effect: Some(GainGold(3)),
                ),
                (
                    id: "lucky_coin",
                    name: "Lucky Coin",
                    cost_gold: 1,
                    timing: Buy,
                ),
            ],
        )"#;
        let items = ItemLoader::parse(text).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].timing, ItemTiming::Buy);
        assert_eq!(items[0].effect, Some(ItemEffect::GainGold(3)));
        assert_eq!(items[1].effect, None);
    }
}
