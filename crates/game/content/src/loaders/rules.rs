//! Match rules table loader.
//!
//! The TOML table is merged over the engine defaults: any key left out keeps
//! its default value, so a table holding only the knobs a match wants to
//! change is valid.

use std::path::Path;

use soulchess_core::RulesConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for match rules from TOML files.
pub struct RulesLoader;

impl RulesLoader {
    /// Load a rules table from a TOML file.
    pub fn load(path: &Path) -> LoadResult<RulesConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a rules table from TOML text.
    pub fn parse(content: &str) -> LoadResult<RulesConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse rules TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_fall_back_to_defaults() {
        let rules = RulesLoader::parse("gold_max = 20\nshoot_mana_cost = 1\n").unwrap();
        assert_eq!(rules.gold_max, 20);
        assert_eq!(rules.shoot_mana_cost, 1);
        // Untouched knobs keep engine defaults.
        assert_eq!(rules.soul_hand_max, 5);
        assert_eq!(rules.dice_sides, 6);
    }

    #[test]
    fn sides_and_modes_parse_from_strings() {
        let rules = RulesLoader::parse("first_side = \"Black\"\nrng_mode = \"Fixed\"\n").unwrap();
        assert_eq!(rules.first_side, soulchess_core::Side::Black);
        assert_eq!(rules.rng_mode, soulchess_core::RngMode::Fixed);
    }
}
