use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::Cell;

// ============================================================================
// Shape Catalog
// ============================================================================

/// The six tetromino families; there is no square.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shape {
    T,
    L,
    Z,
    J,
    S,
    I,
}

impl Shape {
    pub const ALL: [Shape; 6] = [Shape::T, Shape::L, Shape::Z, Shape::J, Shape::S, Shape::I];

    /// Relative offsets; element 0 is the rotation origin.
    pub fn cells(&self) -> [Cell; 4] {
        match self {
            Shape::T => [Cell::new(0, -1), Cell::new(1, -1), Cell::new(0, 0), Cell::new(-1, -1)],
            Shape::L => [Cell::new(0, -1), Cell::new(1, -1), Cell::new(1, 0), Cell::new(-1, -1)],
            Shape::J => [Cell::new(0, -1), Cell::new(1, -1), Cell::new(-1, 0), Cell::new(-1, -1)],
            Shape::S => [Cell::new(0, -1), Cell::new(-1, -1), Cell::new(0, 0), Cell::new(1, 0)],
            Shape::Z => [Cell::new(0, -1), Cell::new(1, -1), Cell::new(0, 0), Cell::new(-1, 0)],
            Shape::I => [Cell::new(0, 0), Cell::new(-1, 0), Cell::new(-2, 0), Cell::new(1, 0)],
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

// ============================================================================
// Shape Provider Trait
// ============================================================================

pub trait ShapeProvider {
    fn next_shape(&mut self) -> Shape;
}

pub struct RandomShapeProvider {
    rng: StdRng,
}

impl RandomShapeProvider {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ShapeProvider for RandomShapeProvider {
    fn next_shape(&mut self) -> Shape {
        Shape::random(&mut self.rng)
    }
}

/// Cycles through a fixed list; used to script spawns.
pub struct SequenceShapeProvider {
    shapes: Vec<Shape>,
    index: usize,
}

impl SequenceShapeProvider {
    pub fn new(shapes: Vec<Shape>) -> Self {
        assert!(!shapes.is_empty(), "shape sequence must not be empty");
        Self { shapes, index: 0 }
    }
}

impl ShapeProvider for SequenceShapeProvider {
    fn next_shape(&mut self) -> Shape {
        let shape = self.shapes[self.index % self.shapes.len()];
        self.index += 1;
        shape
    }
}
