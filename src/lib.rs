//! Simulation core for a two-board falling-block duel: one board steered by
//! a player, one played by a greedy opponent, both advanced by one clock.

pub mod board;
pub mod error;
pub mod game;
pub mod geometry;
pub mod opponent;
pub mod piece;
pub mod shapes;

pub use error::GameError;
pub use game::{Game, GameEvent, GameState, InputEvent};
pub use geometry::{Bounds, Cell, Side};
