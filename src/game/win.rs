//! Win Detection
//!
//! Pure scan for five equal stones in a row. The scan order is fixed so
//! boards with several completed lines always resolve to the same color:
//! start cells in row-major order, then directions in [`Direction::ALL`]
//! order.

use crate::WIN_LENGTH;
use crate::game::board::{Cell, Color};

/// Line direction from a start cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Left to right along a row
    Horizontal,
    /// Top to bottom along a column
    Vertical,
    /// Down and to the right
    DiagonalDownRight,
    /// Down and to the left
    DiagonalDownLeft,
}

impl Direction {
    /// Scan order. Do not reorder.
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::DiagonalDownRight,
        Direction::DiagonalDownLeft,
    ];

    /// (row step, column step)
    #[inline]
    fn delta(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::DiagonalDownRight => (1, 1),
            Direction::DiagonalDownLeft => (1, -1),
        }
    }
}

/// A completed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinningLine {
    /// Color of the line
    pub color: Color,
    /// Flat index of the first cell
    pub start: usize,
    /// Direction the line runs from `start`
    pub direction: Direction,
}

impl WinningLine {
    /// Flat indices of the cells making up the line.
    pub fn cells(&self, width: usize) -> [usize; WIN_LENGTH] {
        let (dr, dc) = self.direction.delta();
        let row = (self.start / width) as isize;
        let col = (self.start % width) as isize;
        let mut out = [0usize; WIN_LENGTH];
        for (k, slot) in out.iter_mut().enumerate() {
            let k = k as isize;
            *slot = ((row + dr * k) as usize) * width + (col + dc * k) as usize;
        }
        out
    }
}

/// Detect the winning color on a `width × width` board, if any.
pub fn detect(board: &[Cell], width: usize) -> Option<Color> {
    find_line(board, width).map(|line| line.color)
}

/// Find the first completed line in scan order.
pub fn find_line(board: &[Cell], width: usize) -> Option<WinningLine> {
    if width == 0 || board.len() < width * width {
        return None;
    }

    for row in 0..width {
        for col in 0..width {
            let start = row * width + col;
            let color = match board[start] {
                Some(color) => color,
                None => continue,
            };

            for direction in Direction::ALL {
                if line_completes(board, width, row, col, direction, color) {
                    return Some(WinningLine { color, start, direction });
                }
            }
        }
    }

    None
}

/// Check the `WIN_LENGTH - 1` cells after (row, col) along `direction`.
fn line_completes(
    board: &[Cell],
    width: usize,
    row: usize,
    col: usize,
    direction: Direction,
    color: Color,
) -> bool {
    let (dr, dc) = direction.delta();
    let span = (WIN_LENGTH - 1) as isize;

    // Bounds check the far end; the near end is the start cell itself.
    let end_row = row as isize + dr * span;
    let end_col = col as isize + dc * span;
    if end_row < 0 || end_row >= width as isize || end_col < 0 || end_col >= width as isize {
        return false;
    }

    (1..WIN_LENGTH as isize).all(|k| {
        let r = (row as isize + dr * k) as usize;
        let c = (col as isize + dc * k) as usize;
        board[r * width + c] == Some(color)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Board;

    fn board_with(width: usize, stones: &[(usize, usize, Color)]) -> Board {
        let mut board = Board::new(width);
        for &(row, col, color) in stones {
            let pos = board.index(row, col);
            board.place(pos, color);
        }
        board
    }

    #[test]
    fn test_empty_board() {
        let board = Board::new(19);
        assert_eq!(detect(board.cells(), 19), None);
    }

    #[test]
    fn test_horizontal() {
        let stones: Vec<_> = (3..8).map(|c| (2, c, Color::Black)).collect();
        let board = board_with(19, &stones);
        assert_eq!(detect(board.cells(), 19), Some(Color::Black));
    }

    #[test]
    fn test_vertical_at_bottom_edge() {
        let stones: Vec<_> = (14..19).map(|r| (r, 18, Color::White)).collect();
        let board = board_with(19, &stones);
        let line = find_line(board.cells(), 19).unwrap();
        assert_eq!(line.color, Color::White);
        assert_eq!(line.direction, Direction::Vertical);
        assert_eq!(line.start, 14 * 19 + 18);
    }

    #[test]
    fn test_diagonal_down_right() {
        let stones: Vec<_> = (0..5).map(|k| (10 + k, 2 + k, Color::Black)).collect();
        let board = board_with(19, &stones);
        let line = find_line(board.cells(), 19).unwrap();
        assert_eq!(line.direction, Direction::DiagonalDownRight);
    }

    #[test]
    fn test_diagonal_down_left() {
        let stones: Vec<_> = (0..5).map(|k| (k, 4 - k, Color::White)).collect();
        let board = board_with(19, &stones);
        let line = find_line(board.cells(), 19).unwrap();
        assert_eq!(line.direction, Direction::DiagonalDownLeft);
        assert_eq!(line.start, 4);
        assert_eq!(line.cells(19), [4, 22, 40, 58, 76]);
    }

    #[test]
    fn test_four_is_not_enough() {
        let stones: Vec<_> = (0..4).map(|c| (0, c, Color::Black)).collect();
        let board = board_with(19, &stones);
        assert_eq!(detect(board.cells(), 19), None);
    }

    #[test]
    fn test_no_wraparound_across_rows() {
        // Columns 16,17,18 of row 0 then columns 0,1 of row 1 are contiguous
        // in the flat array but not on the board.
        let stones = [
            (0, 16, Color::Black),
            (0, 17, Color::Black),
            (0, 18, Color::Black),
            (1, 0, Color::Black),
            (1, 1, Color::Black),
        ];
        let board = board_with(19, &stones);
        assert_eq!(detect(board.cells(), 19), None);
    }

    #[test]
    fn test_broken_line() {
        let stones = [
            (5, 5, Color::Black),
            (5, 6, Color::Black),
            (5, 7, Color::White),
            (5, 8, Color::Black),
            (5, 9, Color::Black),
            (5, 10, Color::Black),
        ];
        let board = board_with(19, &stones);
        assert_eq!(detect(board.cells(), 19), None);
    }

    #[test]
    fn test_simultaneous_lines_resolve_in_scan_order() {
        // White line starts on row 1, black line on row 3: white wins.
        let mut stones: Vec<_> = (0..5).map(|c| (3, c, Color::Black)).collect();
        stones.extend((10..15).map(|c| (1, c, Color::White)));
        let board = board_with(19, &stones);
        assert_eq!(detect(board.cells(), 19), Some(Color::White));
    }

    #[test]
    fn test_same_start_prefers_horizontal() {
        // Both a horizontal and a vertical line start at (0, 0).
        let mut stones: Vec<_> = (0..5).map(|c| (0, c, Color::Black)).collect();
        stones.extend((1..5).map(|r| (r, 0, Color::Black)));
        let board = board_with(19, &stones);
        let line = find_line(board.cells(), 19).unwrap();
        assert_eq!(line.start, 0);
        assert_eq!(line.direction, Direction::Horizontal);
    }

    #[test]
    fn test_small_board_generalizes() {
        let stones: Vec<_> = (0..5).map(|k| (k, k, Color::White)).collect();
        let board = board_with(5, &stones);
        assert_eq!(detect(board.cells(), 5), Some(Color::White));

        let tiny = Board::new(4);
        assert_eq!(detect(tiny.cells(), 4), None);
    }

    #[test]
    fn test_short_slice_is_rejected() {
        let cells = vec![Some(Color::Black); 10];
        assert_eq!(detect(&cells, 19), None);
    }
}
