use crate::engine::{Board, Tile};
use crate::error::ParseBoardError;

/// Parses an array of string slices into a `Board`.
///
/// Each string slice is one row, starting from row 0. Cells are separated by
/// whitespace and written as either `.` (empty) or `item:level`, both numbers
/// positive. Blank lines are skipped; every remaining row must have the same
/// number of cells, which fixes the board width.
///
/// # Returns
/// * `Ok(Board)` sized by the input.
/// * `Err(ParseBoardError)` if there are no rows, rows differ in length, or a
///   cell is not `.` / `item:level`.
///
/// # Examples
/// ```
/// use merge_grid::utils::board_from_str_array;
/// use merge_grid::engine::Tile;
///
/// let board = board_from_str_array(&["1:1 .", "2:3 1:1"]).unwrap();
/// assert_eq!((board.rows(), board.cols()), (2, 2));
/// assert_eq!(board.get_tile(0, 0), Tile::occupied(1, 1));
/// assert_eq!(board.get_tile(0, 1), Tile::Empty);
/// assert_eq!(board.get_tile(1, 0), Tile::occupied(2, 3));
///
/// assert!(board_from_str_array(&["1:1 x"]).is_err());
/// assert!(board_from_str_array(&["1:1 .", "."]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, ParseBoardError> {
    let mut cols = None;
    let mut rows = 0;
    let mut cells = Vec::new();

    for row_str in s.iter().filter(|line| !line.trim().is_empty()) {
        let tokens: Vec<&str> = row_str.split_whitespace().collect();
        let expected = *cols.get_or_insert(tokens.len());
        if tokens.len() != expected {
            return Err(ParseBoardError::RaggedRow {
                row: rows,
                expected,
                found: tokens.len(),
            });
        }

        for (c, token) in tokens.iter().enumerate() {
            let tile = parse_tile(token).ok_or_else(|| ParseBoardError::BadToken {
                token: token.to_string(),
                row: rows,
                col: c,
            })?;
            cells.push(tile);
        }
        rows += 1;
    }

    match cols {
        Some(cols) => Ok(Board::from_cells(rows, cols, cells)),
        None => Err(ParseBoardError::NoRows),
    }
}

fn parse_tile(token: &str) -> Option<Tile> {
    if token == "." {
        return Some(Tile::Empty);
    }
    let (item, level) = token.split_once(':')?;
    let item: u32 = item.parse().ok()?;
    let level: u32 = level.parse().ok()?;
    if item == 0 || level == 0 {
        return None;
    }
    Some(Tile::occupied(item, level))
}
