use crate::geometry::Side;

/// Conditions that stop the simulation. Rejected moves are not errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum GameError {
    #[error("layout marks no cells for the {0} board")]
    EmptyLayout(Side),
    #[error("no valid moves from start")]
    NoValidStart,
    #[error("no valid move: the human piece cannot spawn")]
    NoValidSpawn,
    #[error("simulation halted")]
    Halted,
}
