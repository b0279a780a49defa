//! Engine tuning and the on-disk game configuration.
//!
//! `EngineConfig` carries every knob of the merge/spawn rules so sessions and
//! test fixtures can vary board size without global state. `GameConfig` is the
//! TOML file read by the binaries:
//!
//! ```toml
//! [engine]
//! rows = 5
//! cols = 5
//! seed = 42
//!
//! [items]
//! available = [1, 2, 3]
//! asset_dir = "assets"
//!
//! [[items.caps]]
//! item = 2
//! max_level = 4
//! ```
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::{ItemCatalog, ItemId, Level};
use crate::error::{CatalogError, ConfigError};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "defaults::rows")]
    pub rows: usize,
    #[serde(default = "defaults::cols")]
    pub cols: usize,

    /// A reset seeds `rows * cols / fill_divisor` level-1 tiles.
    #[serde(default = "defaults::fill_divisor")]
    pub fill_divisor: usize,

    /// Spawning is in danger mode when fewer empty cells than this remain.
    #[serde(default = "defaults::danger_empty_threshold")]
    pub danger_empty_threshold: usize,

    /// Relative weight of rolling level 1, 2, 3, ... for a random spawn.
    #[serde(default = "defaults::level_weights")]
    pub level_weights: Vec<u32>,

    /// A merge producing level `n` scores `n * points_per_level`.
    #[serde(default = "defaults::points_per_level")]
    pub points_per_level: u32,

    /// Fixed RNG seed. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: defaults::rows(),
            cols: defaults::cols(),
            fill_divisor: defaults::fill_divisor(),
            danger_empty_threshold: defaults::danger_empty_threshold(),
            level_weights: defaults::level_weights(),
            points_per_level: defaults::points_per_level(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Default rules on a `rows` x `cols` board.
    pub fn with_size(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Number of tiles placed by a reset.
    pub fn initial_tile_count(&self) -> usize {
        (self.rows * self.cols) / self.fill_divisor
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::ZeroDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.rows.checked_mul(self.cols).is_none() {
            return Err(ConfigError::BoardTooLarge {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.fill_divisor == 0 {
            return Err(ConfigError::ZeroFillDivisor);
        }
        if self.level_weights.iter().all(|&w| w == 0) {
            return Err(ConfigError::InvalidLevelWeights);
        }
        Ok(())
    }
}

/// Explicit per-item level cap from the config file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LevelCap {
    pub item: ItemId,
    pub max_level: Level,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ItemsConfig {
    /// Item ids offered to the engine. Merged with whatever `asset_dir` yields.
    #[serde(default)]
    pub available: Vec<ItemId>,

    /// Directory scanned for `item<ID>_<LEVEL>.png` files.
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,

    #[serde(default = "defaults::default_max_level")]
    pub default_max_level: Level,

    /// Overrides for discovered caps.
    #[serde(default)]
    pub caps: Vec<LevelCap>,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            available: Vec::new(),
            asset_dir: None,
            default_max_level: defaults::default_max_level(),
            caps: Vec::new(),
        }
    }
}

impl ItemsConfig {
    /// Builds the catalog: discovered assets first, then listed items, then caps.
    pub fn build_catalog(&self) -> Result<ItemCatalog, CatalogError> {
        let mut catalog = match &self.asset_dir {
            Some(dir) => ItemCatalog::from_asset_dir(dir)?,
            None => ItemCatalog::empty(),
        };
        catalog.set_default_max_level(self.default_max_level);
        for &item in &self.available {
            catalog.add_item(item);
        }
        for cap in &self.caps {
            catalog.set_max_level(cap.item, cap.max_level);
        }
        Ok(catalog)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub items: ItemsConfig,
}

impl GameConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_toml(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        cfg.engine.validate()?;
        if cfg.items.default_max_level == 0 {
            return Err(ConfigError::ZeroMaxLevel { item: 0 });
        }
        if let Some(cap) = cfg.items.caps.iter().find(|c| c.max_level == 0) {
            return Err(ConfigError::ZeroMaxLevel { item: cap.item });
        }
        if cfg.items.available.contains(&0) || cfg.items.caps.iter().any(|c| c.item == 0) {
            return Err(ConfigError::ZeroItemId);
        }
        Ok(cfg)
    }
}

mod defaults {
    use crate::catalog::{Level, DEFAULT_MAX_LEVEL};

    pub fn rows() -> usize { 6 }
    pub fn cols() -> usize { 6 }
    pub fn fill_divisor() -> usize { 3 }
    pub fn danger_empty_threshold() -> usize { 5 }
    pub fn level_weights() -> Vec<u32> { vec![60, 30, 10] }
    pub fn points_per_level() -> u32 { 10 }
    pub fn default_max_level() -> Level { DEFAULT_MAX_LEVEL }
}
