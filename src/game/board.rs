//! Board and Stone Colors
//!
//! Flat row-major board of `width × width` cells. Serialized as the
//! `squares` array clients render: `null` for empty, `"BLACK"`/`"WHITE"`.

use serde::{Serialize, Deserialize};

/// Stone color. Black always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Color {
    /// First joiner, first mover
    Black = 1,
    /// Second joiner
    White = 2,
}

impl Color {
    /// The other color.
    #[inline]
    pub fn opposite(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Color for the n-th attachment to a room (0-based).
    pub fn for_seat(seat: usize) -> Option<Color> {
        match seat {
            0 => Some(Color::Black),
            1 => Some(Color::White),
            _ => None,
        }
    }
}

/// A single board cell.
pub type Cell = Option<Color>;

/// Square game board.
///
/// Serializes as its bare cell array; the width travels in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Cell>,
    #[serde(skip)]
    width: usize,
}

impl Board {
    /// Create an empty board `width` cells on each side.
    pub fn new(width: usize) -> Self {
        Self {
            cells: vec![None; width * width],
            width,
        }
    }

    /// Cells per side.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the board has no cells at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check that a flat index lies on the board.
    #[inline]
    pub fn in_bounds(&self, position: usize) -> bool {
        position < self.cells.len()
    }

    /// Read a cell. Out-of-bounds positions read as empty.
    #[inline]
    pub fn get(&self, position: usize) -> Cell {
        self.cells.get(position).copied().flatten()
    }

    /// Write a color into a cell.
    ///
    /// Returns false (and writes nothing) when the position is off the board.
    pub fn place(&mut self, position: usize, color: Color) -> bool {
        match self.cells.get_mut(position) {
            Some(cell) => {
                *cell = Some(color);
                true
            }
            None => false,
        }
    }

    /// Flat index for a (row, col) pair.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Borrow the raw cells.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(19);
        assert_eq!(board.len(), 361);
        assert_eq!(board.stone_count(), 0);
        assert!(board.cells().iter().all(|c| c.is_none()));
    }

    #[test]
    fn test_place_and_get() {
        let mut board = Board::new(19);
        let pos = board.index(3, 4);
        assert_eq!(pos, 61);
        assert!(board.place(pos, Color::Black));
        assert_eq!(board.get(pos), Some(Color::Black));
        assert_eq!(board.stone_count(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut board = Board::new(5);
        assert!(!board.in_bounds(25));
        assert!(!board.place(25, Color::White));
        assert_eq!(board.get(25), None);
        assert_eq!(board.stone_count(), 0);
    }

    #[test]
    fn test_color_opposite() {
        assert_eq!(Color::Black.opposite(), Color::White);
        assert_eq!(Color::White.opposite(), Color::Black);
    }

    #[test]
    fn test_seat_colors() {
        assert_eq!(Color::for_seat(0), Some(Color::Black));
        assert_eq!(Color::for_seat(1), Some(Color::White));
        assert_eq!(Color::for_seat(2), None);
    }

    #[test]
    fn test_squares_json() {
        let mut board = Board::new(2);
        board.place(1, Color::White);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"[null,"WHITE",null,null]"#);
    }
}
