//! Error types shared across the crate.
//!
//! Gameplay itself never fails with an error: rejected merges are reported
//! through [`crate::engine::MergeRejection`]. The types here cover setup work
//! (configuration, asset discovery, board fixtures).
use std::path::PathBuf;
use thiserror::Error;

/// Invalid engine or game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board must have at least one row and one column (got {rows}x{cols})")]
    ZeroDimension { rows: usize, cols: usize },

    #[error("board of {rows}x{cols} cells is too large")]
    BoardTooLarge { rows: usize, cols: usize },

    #[error("fill divisor must be at least 1")]
    ZeroFillDivisor,

    #[error("level weights must contain at least one non-zero weight")]
    InvalidLevelWeights,

    #[error("max level for item {item} must be at least 1")]
    ZeroMaxLevel { item: u32 },

    #[error("item ids must be positive")]
    ZeroItemId,

    #[error("board is {actual_rows}x{actual_cols} but config expects {rows}x{cols}")]
    BoardSizeMismatch {
        rows: usize,
        cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure while scanning an asset directory for item images.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read asset directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while parsing a textual board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoardError {
    #[error("board text has no rows")]
    NoRows,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized token '{token}' in row {row} col {col}")]
    BadToken {
        token: String,
        row: usize,
        col: usize,
    },
}
