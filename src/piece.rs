use std::collections::HashSet;

use crate::geometry::{Bounds, Cell};
use crate::shapes::Shape;

// ============================================================================
// Piece
// ============================================================================

/// Four absolute cells. Pieces are never edited in place: every move
/// produces a new one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    cells: [Cell; 4],
}

impl Piece {
    pub fn new(cells: [Cell; 4]) -> Self {
        Self { cells }
    }

    /// Instantiates `shape` with its template offset by `(mid_x, top_y)`.
    pub fn spawn(shape: Shape, mid_x: i32, top_y: i32) -> Self {
        Self {
            cells: shape.cells().map(|c| c.offset(mid_x, top_y)),
        }
    }

    /// Spawn position for a board: horizontal midpoint, top row.
    pub fn spawn_in(shape: Shape, bounds: &Bounds) -> Self {
        Self::spawn(shape, bounds.mid_x(), bounds.max_y)
    }

    pub fn cells(&self) -> &[Cell; 4] {
        &self.cells
    }

    pub fn origin(&self) -> Cell {
        self.cells[0]
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            cells: self.cells.map(|c| c.offset(dx, dy)),
        }
    }
}

// ============================================================================
// Move Outcome
// ============================================================================

/// Result of a shift: either the moved piece or a rejection that leaves the
/// caller's piece as it was.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Move {
    Accepted(Piece),
    Rejected,
}

impl Move {
    pub fn accepted(self) -> Option<Piece> {
        match self {
            Move::Accepted(piece) => Some(piece),
            Move::Rejected => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Move::Accepted(_))
    }
}

/// Whether a side currently has a piece in the air.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Active {
    Falling(Piece),
    Locked,
}

impl Active {
    pub fn piece(&self) -> Option<&Piece> {
        match self {
            Active::Falling(piece) => Some(piece),
            Active::Locked => None,
        }
    }
}

// ============================================================================
// Chunk
// ============================================================================

/// Settled cells of one board, keyed by coordinate.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Chunk {
    cells: HashSet<Cell>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Returns false when the cell was already present.
    pub fn insert(&mut self, cell: Cell) -> bool {
        self.cells.insert(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Union with a piece's cells.
    pub fn with_piece(&self, piece: &Piece) -> Self {
        let mut merged = self.clone();
        merged.cells.extend(piece.cells().iter().copied());
        merged
    }

    pub fn count_in_row(&self, y: i32) -> usize {
        self.cells.iter().filter(|c| c.y == y).count()
    }
}

impl FromIterator<Cell> for Chunk {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}
