use crate::catalog::{ItemCatalog, Level};
use crate::engine::{check_merge, Board, Cell};

/// A pair-choosing strategy: given the board, returns the `(first, second)`
/// clicks of a legal merge, or `None` when no merge can succeed.
pub type StrategyFn = fn(&Board, &ItemCatalog) -> Option<(Cell, Cell)>;

/// Lists every legal merge on the board as `(first, second)` clicks.
///
/// Pairs are ordered row-major by their first cell, then by their second cell,
/// and each unordered pair appears once with the earlier cell first. Pairs whose
/// item is already at its cap are excluded, so this can be empty even while
/// [`Board::can_merge`] reports true.
pub fn find_merge_pairs(board: &Board, catalog: &ItemCatalog) -> Vec<(Cell, Cell)> {
    let occupied: Vec<Cell> = board
        .iter()
        .filter(|(_, tile)| !tile.is_empty())
        .map(|(cell, _)| cell)
        .collect();

    let mut pairs = Vec::new();
    for (i, &a) in occupied.iter().enumerate() {
        for &b in &occupied[i + 1..] {
            if check_merge(board, catalog, a, b).is_ok() {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Counts `(item, level)` kinds present at least twice, regardless of caps.
pub fn count_duplicate_kinds(board: &Board) -> usize {
    board.tally().values().filter(|&&count| count >= 2).count()
}

fn pair_level(board: &Board, pair: &(Cell, Cell)) -> Level {
    let (a, _) = *pair;
    board
        .get_tile(a.0, a.1)
        .item_level()
        .map(|(_, level)| level)
        .unwrap_or(0)
}

fn is_adjacent(a: Cell, b: Cell) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}

/// Takes the first legal pair in row-major order.
pub fn choose_pair_first(board: &Board, catalog: &ItemCatalog) -> Option<(Cell, Cell)> {
    find_merge_pairs(board, catalog).into_iter().next()
}

/// Merges the lowest-level pair, keeping high tiers on the board for later.
/// Ties go to the earliest pair.
pub fn choose_pair_lowest_level(board: &Board, catalog: &ItemCatalog) -> Option<(Cell, Cell)> {
    find_merge_pairs(board, catalog)
        .into_iter()
        .min_by_key(|pair| pair_level(board, pair))
}

/// Merges the highest-level pair, which scores the most right now.
/// Ties go to the earliest pair.
pub fn choose_pair_highest_level(board: &Board, catalog: &ItemCatalog) -> Option<(Cell, Cell)> {
    let pairs = find_merge_pairs(board, catalog);
    let best = pairs.iter().map(|pair| pair_level(board, pair)).max()?;
    pairs.into_iter().find(|pair| pair_level(board, pair) == best)
}

/// Prefers a pair of neighbouring tiles, falling back to the first legal pair.
pub fn choose_pair_adjacent(board: &Board, catalog: &ItemCatalog) -> Option<(Cell, Cell)> {
    let pairs = find_merge_pairs(board, catalog);
    pairs
        .iter()
        .copied()
        .find(|&(a, b)| is_adjacent(a, b))
        .or_else(|| pairs.first().copied())
}
