//! Content loaders for reading card data from files.
//!
//! Loaders convert RON card files and the TOML rules table into core catalog
//! values. Each loader also exposes a `parse` entry point over raw text,
//! which the built-in compiled-in data set goes through.

pub mod items;
pub mod rules;
pub mod souls;

pub use items::ItemLoader;
pub use rules::RulesLoader;
pub use souls::{RawAbilitySpec, RawSoulSpec, SoulLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
