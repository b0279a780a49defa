//! Core game engine for the merge puzzle.
//!
//! This module defines the game's fundamental components:
//! - `Tile`: the occupant of a single cell, either empty or an item at some level.
//! - `Board`: a fixed-size, row-major grid of tiles with the read-only queries the
//!   rules need (empty cells, neighbours, duplicate tally).
//! - `GridEngine`: the session state machine. It owns the board, score, selection
//!   and game-over flag, applies merges, spawns replacement tiles and detects the
//!   terminal state.
use std::collections::HashMap;
use std::fmt;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::catalog::{ItemCatalog, ItemId, Level, DEFAULT_ITEMS};
use crate::config::EngineConfig;
use crate::error::ConfigError;

/// A `(row, column)` board coordinate, 0-based.
pub type Cell = (usize, usize);

/// The occupant of a board cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Nothing in this cell.
    #[default]
    Empty,
    /// An item of kind `item` at upgrade tier `level` (>= 1).
    Occupied { item: ItemId, level: Level },
}

impl Tile {
    pub fn occupied(item: ItemId, level: Level) -> Self {
        Tile::Occupied { item, level }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Tile::Empty)
    }

    /// Returns `(item, level)` for an occupied tile.
    pub fn item_level(&self) -> Option<(ItemId, Level)> {
        match *self {
            Tile::Empty => None,
            Tile::Occupied { item, level } => Some((item, level)),
        }
    }

    /// Text form used by board dumps and fixtures: `.` or `item:level`.
    ///
    /// # Examples
    ///
    /// ```
    /// use merge_grid::engine::Tile;
    /// assert_eq!(Tile::Empty.label(), ".");
    /// assert_eq!(Tile::occupied(2, 3).label(), "2:3");
    /// ```
    pub fn label(&self) -> String {
        match self {
            Tile::Empty => ".".to_string(),
            Tile::Occupied { item, level } => format!("{}:{}", item, level),
        }
    }

    /// ANSI background colour; tiers share a colour across items.
    fn to_ansi_color_code(&self) -> &'static str {
        match self {
            Tile::Empty => "100",
            Tile::Occupied { level, .. } => match level {
                1 => "47",
                2 => "43",
                3 => "42",
                4 => "46",
                5 => "44",
                6 => "45",
                _ => "41",
            },
        }
    }
}

/// A `rows` x `cols` grid of [`Tile`]s, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// Creates a board where every cell is `Tile::Empty`.
    pub fn new_empty(rows: usize, cols: usize) -> Self {
        Board {
            rows,
            cols,
            cells: vec![Tile::Empty; rows * cols],
        }
    }

    /// Creates a board from row-major cells.
    ///
    /// # Panics
    /// Panics if `cells.len() != rows * cols`.
    pub(crate) fn from_cells(rows: usize, cols: usize, cells: Vec<Tile>) -> Self {
        assert_eq!(
            cells.len(),
            rows * cols,
            "cell count does not match a {}x{} board",
            rows,
            cols
        );
        Board { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, (r, c): Cell) -> bool {
        r < self.rows && c < self.cols
    }

    /// Returns the tile at row `r`, column `c`.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the board.
    pub fn get_tile(&self, r: usize, c: usize) -> Tile {
        assert!(self.in_bounds((r, c)), "cell ({}, {}) out of bounds", r, c);
        self.cells[r * self.cols + c]
    }

    /// Checked lookup; `None` outside the board.
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        if self.in_bounds(cell) {
            Some(self.cells[cell.0 * self.cols + cell.1])
        } else {
            None
        }
    }

    /// Sets the tile at row `r`, column `c`.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the board.
    pub fn set_tile(&mut self, r: usize, c: usize, tile: Tile) {
        assert!(self.in_bounds((r, c)), "cell ({}, {}) out of bounds", r, c);
        self.cells[r * self.cols + c] = tile;
    }

    /// Iterates `(cell, tile)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, Tile)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &tile)| ((i / cols, i % cols), tile))
    }

    /// Row-major list of empty cells.
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.iter()
            .filter(|(_, tile)| tile.is_empty())
            .map(|(cell, _)| cell)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|t| !t.is_empty()).count()
    }

    /// Counts how many cells hold each `(item, level)` pair.
    pub fn tally(&self) -> HashMap<(ItemId, Level), usize> {
        let mut counts = HashMap::new();
        for key in self.cells.iter().filter_map(Tile::item_level) {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    /// Whether any `(item, level)` pair appears at least twice anywhere.
    ///
    /// This is a global check: the matching tiles need not be adjacent.
    pub fn can_merge(&self) -> bool {
        self.tally().values().any(|&count| count >= 2)
    }

    /// In-bounds orthogonal neighbours of `cell`, ordered up, down, left, right.
    pub fn neighbors(&self, (r, c): Cell) -> Vec<Cell> {
        const DELTAS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        DELTAS
            .iter()
            .filter_map(|&(dr, dc)| {
                let nr = r.checked_add_signed(dr)?;
                let nc = c.checked_add_signed(dc)?;
                self.in_bounds((nr, nc)).then_some((nr, nc))
            })
            .collect()
    }

    /// Non-empty tiles orthogonally adjacent to `cell`.
    pub fn occupied_neighbors(&self, cell: Cell) -> Vec<Tile> {
        self.neighbors(cell)
            .into_iter()
            .filter_map(|n| self.tile(n))
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Plain text dump, one row per line, readable by
    /// [`crate::utils::board_from_str_array`].
    pub fn to_plain_string(&self) -> String {
        (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| self.get_tile(r, c).label())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders the board for a terminal with row/column headers and ANSI colours.
    /// Cells listed in `selected` are bracketed.
    pub fn to_string_with_highlight(&self, selected: &[Cell]) -> String {
        let mut output = String::new();

        output.push_str("   ");
        for c in 0..self.cols {
            output.push_str(&format!("{:^7}", c));
        }
        output.push('\n');

        for r in 0..self.rows {
            output.push_str(&format!("{:<3}", r));
            for c in 0..self.cols {
                let tile = self.get_tile(r, c);
                let label = match tile {
                    Tile::Empty => String::new(),
                    _ => tile.label(),
                };
                let content = if selected.contains(&(r, c)) {
                    format!("[{:^5}]", label)
                } else {
                    format!(" {:^5} ", label)
                };
                output.push_str(&format!(
                    "\x1b[1;30;{}m{}\x1b[m",
                    tile.to_ansi_color_code(),
                    content
                ));
            }
            if r + 1 < self.rows {
                output.push('\n');
            }
        }

        output
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(&[]))
    }
}

/// A successful merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Merge {
    /// The cell that was emptied.
    pub source: Cell,
    /// The cell that now holds the upgraded tile.
    pub target: Cell,
    pub item: ItemId,
    /// Level of the upgraded tile.
    pub level: Level,
    pub points: u32,
    /// Where the replacement tile landed; `None` if the board had no room.
    pub spawned: Option<Cell>,
}

/// Why a merge did not happen. Every variant leaves the board untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MergeRejection {
    #[error("cell {0:?} is outside the board")]
    OutOfBounds(Cell),

    #[error("cannot merge cell {0:?} with itself")]
    SameCell(Cell),

    #[error("cell {0:?} is empty")]
    EmptyCell(Cell),

    #[error("items differ ({first} vs {second})")]
    ItemMismatch { first: ItemId, second: ItemId },

    #[error("levels differ ({first} vs {second})")]
    LevelMismatch { first: Level, second: Level },

    #[error("item {item} is already at its max level {max_level}")]
    LevelCap { item: ItemId, max_level: Level },
}

impl MergeRejection {
    /// True when the tiles matched but the item cannot be upgraded further.
    pub fn is_level_cap(&self) -> bool {
        matches!(self, MergeRejection::LevelCap { .. })
    }
}

/// Validates merging `a` into `b` without touching anything.
///
/// Returns the shared `(item, level)` of the two tiles when the merge is legal.
pub fn check_merge(
    board: &Board,
    catalog: &ItemCatalog,
    a: Cell,
    b: Cell,
) -> Result<(ItemId, Level), MergeRejection> {
    let first = board.tile(a).ok_or(MergeRejection::OutOfBounds(a))?;
    let second = board.tile(b).ok_or(MergeRejection::OutOfBounds(b))?;
    if a == b {
        return Err(MergeRejection::SameCell(a));
    }
    let (item_a, level_a) = first.item_level().ok_or(MergeRejection::EmptyCell(a))?;
    let (item_b, level_b) = second.item_level().ok_or(MergeRejection::EmptyCell(b))?;

    if item_a != item_b {
        return Err(MergeRejection::ItemMismatch {
            first: item_a,
            second: item_b,
        });
    }
    if level_a != level_b {
        return Err(MergeRejection::LevelMismatch {
            first: level_a,
            second: level_b,
        });
    }
    let max_level = catalog.max_level(item_b);
    if level_b >= max_level {
        return Err(MergeRejection::LevelCap {
            item: item_b,
            max_level,
        });
    }
    Ok((item_b, level_b))
}

/// Manages one merge-puzzle session.
///
/// The engine is generic over its random source so tests can drive it with a
/// seeded generator; [`GridEngine::new`] uses `SmallRng`.
///
/// # Examples
/// ```
/// use merge_grid::catalog::ItemCatalog;
/// use merge_grid::config::EngineConfig;
/// use merge_grid::engine::GridEngine;
///
/// let mut config = EngineConfig::with_size(5, 5);
/// config.seed = Some(7);
/// let mut engine = GridEngine::new(config, ItemCatalog::empty()).unwrap();
/// assert_eq!(engine.board().occupied_count(), 8);
/// assert_eq!(engine.score(), 0);
///
/// // Clicking an empty cell does nothing.
/// let empty = engine.board().empty_cells()[0];
/// assert!(!engine.toggle_select(empty.0, empty.1));
/// assert!(engine.selection().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct GridEngine<R = SmallRng> {
    config: EngineConfig,
    catalog: ItemCatalog,
    level_roll: WeightedIndex<u32>,
    board: Board,
    score: u32,
    moves: u32,
    selection: Vec<Cell>,
    game_over: bool,
    rng: R,
}

impl GridEngine<SmallRng> {
    /// Starts a session seeded from `config.seed`, or from entropy when unset.
    pub fn new(config: EngineConfig, catalog: ItemCatalog) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, catalog, rng)
    }
}

impl<R: Rng> GridEngine<R> {
    /// Starts a session driven by `rng`. `config.seed` is ignored.
    pub fn with_rng(
        config: EngineConfig,
        catalog: ItemCatalog,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rows = config.rows;
        let cols = config.cols;
        let mut engine = Self::assemble(config, catalog, Board::new_empty(rows, cols), rng)?;
        engine.reset();
        Ok(engine)
    }

    /// Starts a session on a prepared board instead of a random seeding.
    ///
    /// The board must match `config.rows` x `config.cols`. A later
    /// [`reset`](Self::reset) seeds randomly as usual.
    pub fn with_board(
        config: EngineConfig,
        catalog: ItemCatalog,
        board: Board,
        rng: R,
    ) -> Result<Self, ConfigError> {
        if board.rows() != config.rows || board.cols() != config.cols {
            return Err(ConfigError::BoardSizeMismatch {
                rows: config.rows,
                cols: config.cols,
                actual_rows: board.rows(),
                actual_cols: board.cols(),
            });
        }
        let mut engine = Self::assemble(config, catalog, board, rng)?;
        engine.game_over = !engine.board.can_merge();
        Ok(engine)
    }

    fn assemble(
        config: EngineConfig,
        catalog: ItemCatalog,
        board: Board,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let level_roll = WeightedIndex::new(&config.level_weights)
            .map_err(|_| ConfigError::InvalidLevelWeights)?;
        Ok(GridEngine {
            config,
            catalog,
            level_roll,
            board,
            score: 0,
            moves: 0,
            selection: Vec::with_capacity(2),
            game_over: false,
            rng,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Points accumulated since the last reset. Never decreases between resets.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Successful merges since the last reset.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Currently selected cells, oldest first. Holds at most one cell between calls.
    pub fn selection(&self) -> &[Cell] {
        &self.selection
    }

    /// Set when a merge, spawn or prepared board leaves no matching pair.
    /// A reset always clears it.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Whether two tiles anywhere on the board share item and level.
    pub fn can_merge(&self) -> bool {
        self.board.can_merge()
    }

    /// Clears the session and seeds a fresh board.
    ///
    /// Score, move count and selection go back to zero, then
    /// `rows * cols / fill_divisor` distinct cells receive a level-1 tile of a
    /// uniformly chosen item. The game-over flag is cleared. The catalog is
    /// kept.
    pub fn reset(&mut self) {
        self.board = Board::new_empty(self.config.rows, self.config.cols);
        self.score = 0;
        self.moves = 0;
        self.selection.clear();

        let total = self.config.rows * self.config.cols;
        let count = self.config.initial_tile_count().min(total);
        for i in index::sample(&mut self.rng, total, count) {
            let item = self.random_item();
            self.board
                .set_tile(i / self.config.cols, i % self.config.cols, Tile::occupied(item, 1));
        }

        self.game_over = false;
        debug!(
            rows = self.config.rows,
            cols = self.config.cols,
            tiles = count,
            "board reset"
        );
    }

    /// Handles a click on `(row, col)`. Returns `true` when a merge happened.
    ///
    /// - Empty or out-of-board cells are ignored.
    /// - Clicking the selected cell again deselects it.
    /// - Clicking a second tile attempts to merge the first into it. On success
    ///   the selection clears; on failure only the newly clicked cell stays
    ///   selected.
    pub fn toggle_select(&mut self, row: usize, col: usize) -> bool {
        let cell = (row, col);
        match self.board.tile(cell) {
            None | Some(Tile::Empty) => return false,
            Some(_) => {}
        }

        if let Some(pos) = self.selection.iter().position(|&c| c == cell) {
            self.selection.remove(pos);
            trace!(?cell, "deselected");
            return false;
        }

        self.selection.push(cell);
        if self.selection.len() > 2 {
            let excess = self.selection.len() - 2;
            self.selection.drain(..excess);
        }
        trace!(?cell, selection = ?self.selection, "selected");

        if let [a, b] = self.selection[..] {
            match self.merge(a, b) {
                Ok(_) => return true,
                Err(reason) => {
                    debug!(?a, ?b, %reason, "merge rejected");
                    self.selection.clear();
                    self.selection.push(cell);
                }
            }
        }
        false
    }

    /// Merges the tile at `a` into the tile at `b`.
    ///
    /// Both must hold the same item at the same level, and the item must be below
    /// its cap. On success `b` is upgraded by one level, `a` is emptied, the score
    /// grows by `new_level * points_per_level`, one replacement tile is spawned,
    /// the selection is cleared and the game-over flag is recomputed.
    ///
    /// On rejection nothing changes; the caller owns any selection update.
    pub fn merge(&mut self, a: Cell, b: Cell) -> Result<Merge, MergeRejection> {
        let (item, level) = check_merge(&self.board, &self.catalog, a, b)?;
        let next = level + 1;

        self.board.set_tile(b.0, b.1, Tile::occupied(item, next));
        self.board.set_tile(a.0, a.1, Tile::Empty);
        let points = next.saturating_mul(self.config.points_per_level);
        self.score = self.score.saturating_add(points);
        self.moves += 1;

        let spawned = self.spawn_tiles(1).first().copied();
        self.selection.clear();
        self.game_over = !self.board.can_merge();

        debug!(?a, ?b, item, level = next, points, ?spawned, score = self.score, "merged");
        if self.game_over {
            info!(score = self.score, moves = self.moves, "no merges left, game over");
        }

        Ok(Merge {
            source: a,
            target: b,
            item,
            level: next,
            points,
            spawned,
        })
    }

    /// Places up to `count` new tiles with the smart-spawn rules and returns
    /// where they landed. Stops early once the board is full.
    pub fn spawn(&mut self, count: usize) -> Vec<Cell> {
        let placed = self.spawn_tiles(count);
        self.game_over = !self.board.can_merge();
        placed
    }

    /// Smart spawn.
    ///
    /// The board is in danger when fewer than `danger_empty_threshold` cells are
    /// empty or no pair is mergeable. In danger, the new tile copies a random
    /// occupied neighbour of its cell so at least one merge becomes available.
    /// Otherwise, or with no occupied neighbour, a random item is rolled with
    /// `level_weights`, clamped to the item's cap.
    fn spawn_tiles(&mut self, count: usize) -> Vec<Cell> {
        let mut placed = Vec::with_capacity(count);
        for _ in 0..count {
            let empties = self.board.empty_cells();
            if empties.is_empty() {
                break;
            }

            let danger =
                empties.len() < self.config.danger_empty_threshold || !self.board.can_merge();
            let target = empties[self.rng.gen_range(0..empties.len())];

            let copied = if danger {
                self.board
                    .occupied_neighbors(target)
                    .choose(&mut self.rng)
                    .copied()
            } else {
                None
            };
            let tile = match copied {
                Some(tile) => tile,
                None => self.random_tile(),
            };

            self.board.set_tile(target.0, target.1, tile);
            debug!(
                cell = ?target,
                tile = %tile.label(),
                danger,
                copied = copied.is_some(),
                "spawned"
            );
            placed.push(target);
        }
        placed
    }

    fn random_item(&mut self) -> ItemId {
        self.catalog
            .available_items()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(DEFAULT_ITEMS[0])
    }

    fn random_tile(&mut self) -> Tile {
        let item = self.random_item();
        let rolled = self.level_roll.sample(&mut self.rng) as Level + 1;
        Tile::occupied(item, rolled.min(self.catalog.max_level(item)))
    }
}
