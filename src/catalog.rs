//! Item catalog: which item kinds may appear on the board and how far each
//! one can be upgraded.
//!
//! The catalog is handed to the engine once and survives resets. It is usually
//! built by the presentation side from an asset directory, where images are
//! named `item<ID>_<LEVEL>.png` and the highest level found for an id becomes
//! that item's cap.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::CatalogError;

/// Identifies an item kind. Always positive.
pub type ItemId = u32;
/// Upgrade tier of an item. Always at least 1.
pub type Level = u32;

/// Cap applied to items without an explicit max level.
pub const DEFAULT_MAX_LEVEL: Level = 6;

/// Items used when the catalog lists none.
pub const DEFAULT_ITEMS: [ItemId; 3] = [1, 2, 3];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemCatalog {
    available: Vec<ItemId>,
    max_levels: HashMap<ItemId, Level>,
    default_max_level: Level,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl ItemCatalog {
    /// A catalog with no listed items; it behaves as `DEFAULT_ITEMS`.
    pub fn empty() -> Self {
        ItemCatalog {
            available: Vec::new(),
            max_levels: HashMap::new(),
            default_max_level: DEFAULT_MAX_LEVEL,
        }
    }

    /// Creates a catalog from the item list and per-item caps.
    ///
    /// Duplicate and zero ids in `available` are dropped; caps of zero are
    /// ignored since every tile has at least level 1.
    pub fn new(available: &[ItemId], max_levels: &[(ItemId, Level)]) -> Self {
        let mut catalog = Self::empty();
        for &item in available {
            catalog.add_item(item);
        }
        for &(item, level) in max_levels {
            catalog.set_max_level(item, level);
        }
        catalog
    }

    /// Scans `dir` for `item<ID>_<LEVEL>.png` files (case-insensitive).
    ///
    /// A directory that does not exist yields an empty catalog rather than an
    /// error, so a game without art still runs on the default items.
    pub fn from_asset_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Self::empty();
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "asset directory missing, using default items");
            return Ok(catalog);
        }

        let entries = fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut found: Vec<(ItemId, Level)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| parse_asset_name(&entry.file_name().to_string_lossy()))
            .collect();
        found.sort_unstable();

        for (item, level) in found {
            catalog.add_item(item);
            let cap = catalog.max_levels.entry(item).or_insert(level);
            *cap = (*cap).max(level);
        }
        debug!(dir = %dir.display(), items = ?catalog.available, "discovered item assets");
        Ok(catalog)
    }

    /// Item ids a spawn may draw from, in catalog order.
    pub fn available_items(&self) -> &[ItemId] {
        if self.available.is_empty() {
            &DEFAULT_ITEMS[..]
        } else {
            self.available.as_slice()
        }
    }

    /// Highest level `item` may reach.
    pub fn max_level(&self, item: ItemId) -> Level {
        self.max_levels
            .get(&item)
            .copied()
            .unwrap_or(self.default_max_level)
    }

    pub fn add_item(&mut self, item: ItemId) {
        if item != 0 && !self.available.contains(&item) {
            self.available.push(item);
        }
    }

    pub fn set_max_level(&mut self, item: ItemId, level: Level) {
        if level >= 1 {
            self.max_levels.insert(item, level);
        }
    }

    pub fn set_default_max_level(&mut self, level: Level) {
        if level >= 1 {
            self.default_max_level = level;
        }
    }
}

/// Parses `item<ID>_<LEVEL>.png`, returning `None` for anything else.
fn parse_asset_name(name: &str) -> Option<(ItemId, Level)> {
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_prefix("item")?.strip_suffix(".png")?;
    let (id, level) = stem.split_once('_')?;
    if id.is_empty() || level.is_empty() {
        return None;
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) || !level.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id: ItemId = id.parse().ok()?;
    let level: Level = level.parse().ok()?;
    if id == 0 || level == 0 {
        return None;
    }
    Some((id, level))
}
