use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{find_clearable_row, Board};
use crate::geometry::MAX_RADIUS;
use crate::piece::{Active, Move, Piece};
use crate::shapes::ShapeProvider;

// ============================================================================
// Configuration
// ============================================================================

/// Score for a placement that completes a row; its negation marks a
/// rejected candidate.
pub const GOOD_SCORE: i32 = 10_000;

// ============================================================================
// Types
// ============================================================================

/// What one opponent step did to its side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Spawned,
    /// The fresh piece overlapped the stack; the side stays without a piece.
    Blocked,
    Moved,
    Locked,
}

// ============================================================================
// Scoring
// ============================================================================

/// Rates `candidate` against `board`, landing it first when `drop` is set.
///
/// A completed row wins outright. Otherwise lower stacks score higher:
/// `100 * (MAX_RADIUS - mean_y)` with the mean truncated toward zero.
pub fn score(board: &Board, candidate: &Move, drop: bool) -> i32 {
    let Move::Accepted(piece) = candidate else {
        return -GOOD_SCORE;
    };
    let landed = if drop { board.hard_drop(piece) } else { *piece };
    let combined = board.chunk.with_piece(&landed);

    if find_clearable_row(&combined, board.width()).is_some() {
        return GOOD_SCORE;
    }

    let count = combined.len() as i32;
    let sum: i32 = combined.iter().map(|c| c.y).sum();
    100 * (MAX_RADIUS - sum / count)
}

// ============================================================================
// Search
// ============================================================================

/// One-ply search from `fallen`, which must already be valid on `board`.
///
/// Candidates are left, right, rotate and stay. Ties at the best score are
/// broken uniformly at random.
pub fn choose_move<R: Rng + ?Sized>(board: &Board, fallen: &Piece, rng: &mut R) -> Piece {
    let candidates = [
        board.shift(fallen, -1, 0),
        board.shift(fallen, 1, 0),
        Move::Accepted(board.rotate(fallen)),
        Move::Accepted(*fallen),
    ];

    let scored: Vec<(Piece, i32)> = candidates
        .iter()
        .filter_map(|m| match m {
            Move::Accepted(p) if board.valid_piece(p) => Some((*p, score(board, m, true))),
            _ => None,
        })
        .collect();

    let Some(best) = scored.iter().map(|&(_, s)| s).max() else {
        return *fallen;
    };
    let top: Vec<Piece> = scored
        .into_iter()
        .filter(|&(_, s)| s == best)
        .map(|(p, _)| p)
        .collect();

    top.choose(rng).copied().unwrap_or(*fallen)
}

/// Advances the opponent's side by one tick.
pub fn step<R: Rng + ?Sized>(
    board: &mut Board,
    active: &mut Active,
    shapes: &mut dyn ShapeProvider,
    rng: &mut R,
) -> Step {
    match *active {
        Active::Locked => {
            let piece = Piece::spawn_in(shapes.next_shape(), &board.bounds);
            if board.valid_piece(&piece) {
                *active = Active::Falling(piece);
                Step::Spawned
            } else {
                Step::Blocked
            }
        }
        Active::Falling(piece) => match board.shift(&piece, 0, -1) {
            Move::Rejected => {
                board.lock_in(&piece);
                *active = Active::Locked;
                Step::Locked
            }
            Move::Accepted(fallen) => {
                *active = Active::Falling(choose_move(board, &fallen, rng));
                Step::Moved
            }
        },
    }
}
