//! One side's playfield: its fixed bounds plus the settled chunk, and the
//! movement and line-clear rules that check against them.
//!
//! Every movement operation is a pure function of the board and the piece it
//! is given; the caller decides whether to keep the result.

use crate::geometry::{Bounds, Cell, MAX_RADIUS};
use crate::piece::{Chunk, Move, Piece};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    pub bounds: Bounds,
    pub chunk: Chunk,
}

impl Board {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            chunk: Chunk::new(),
        }
    }

    pub fn with_cells(bounds: Bounds, cells: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            bounds,
            chunk: cells.into_iter().collect(),
        }
    }

    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    // ========================================================================
    // Movement
    // ========================================================================

    pub fn valid_cell(&self, cell: Cell) -> bool {
        self.bounds.contains(cell) && !self.chunk.contains(cell)
    }

    pub fn valid_piece(&self, piece: &Piece) -> bool {
        piece.cells().iter().all(|&c| self.valid_cell(c))
    }

    /// All four cells move or none do.
    pub fn shift(&self, piece: &Piece, dx: i32, dy: i32) -> Move {
        let moved = piece.shifted(dx, dy);
        if self.valid_piece(&moved) {
            Move::Accepted(moved)
        } else {
            Move::Rejected
        }
    }

    /// Origin-anchored turn: cell 0 stays put and every other cell maps to
    /// `(y + ox - oy, ox + oy - x)`. This is not a geometric quarter turn.
    /// When any mapped cell is blocked the input piece comes back unchanged.
    pub fn rotate(&self, piece: &Piece) -> Piece {
        let origin = piece.origin();
        let mut cells = *piece.cells();
        for cell in cells.iter_mut().skip(1) {
            let turned = Cell::new(
                cell.y + origin.x - origin.y,
                origin.x + origin.y - cell.x,
            );
            if !self.valid_cell(turned) {
                return *piece;
            }
            *cell = turned;
        }
        Piece::new(cells)
    }

    /// Lowest position reachable by repeated single-row drops.
    pub fn hard_drop(&self, piece: &Piece) -> Piece {
        let mut last = *piece;
        while let Move::Accepted(next) = self.shift(&last, 0, -1) {
            last = next;
        }
        last
    }

    pub fn lock_in(&mut self, piece: &Piece) {
        self.chunk = self.chunk.with_piece(piece);
    }

    // ========================================================================
    // Line Clear
    // ========================================================================

    pub fn find_clearable_row(&self) -> Option<i32> {
        find_clearable_row(&self.chunk, self.width())
    }

    pub fn collapse_row(&mut self, row: i32) {
        self.chunk = collapse_row(&self.chunk, row);
    }
}

/// Lowest row in `[-MAX_RADIUS, MAX_RADIUS]` holding exactly `width` cells.
pub fn find_clearable_row(chunk: &Chunk, width: i32) -> Option<i32> {
    if chunk.is_empty() {
        return None;
    }
    (-MAX_RADIUS..=MAX_RADIUS).find(|&y| chunk.count_in_row(y) == width as usize)
}

/// Removes `row` and drops every cell above it by one.
pub fn collapse_row(chunk: &Chunk, row: i32) -> Chunk {
    chunk
        .iter()
        .filter(|c| c.y != row)
        .map(|c| if c.y > row { c.offset(0, -1) } else { *c })
        .collect()
}
