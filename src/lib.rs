//! # Merge Grid Library
//!
//! This library provides the game state engine for a single-player tile-merge
//! puzzle: a fixed grid holds items at numbered levels, the player picks two
//! identical tiles to merge them into the next level, a replacement tile spawns,
//! and the game ends once no two tiles on the board match.
//!
//! It is used by two binaries:
//! - `merge_player`: interactive terminal play.
//! - `merge_autoplay`: plays many seeded sessions with each hint strategy and
//!   reports average scores.
//!
//! ## Modules
//! - `engine`: `Tile`, `Board` and the `GridEngine` state machine (selection,
//!   merge, smart spawn, game-over detection).
//! - `catalog`: `ItemCatalog`, the available items and their level caps,
//!   optionally discovered from an asset directory.
//! - `config`: `EngineConfig` tuning and the TOML `GameConfig` file.
//! - `hints`: legal-pair discovery and pair-choosing strategies.
//! - `utils`: parsing boards from text, mainly for fixtures.
//! - `error`: setup error types.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod hints;
pub mod utils;
