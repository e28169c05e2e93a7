use std::fmt;

// ============================================================================
// Configuration
// ============================================================================

/// Half-width of the square window of world coordinates the layout is
/// scanned over, and of the row range searched for clearable rows.
pub const MAX_RADIUS: i32 = 25;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Which of the two boards an operation applies to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Side {
    Human,
    Autonomous,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Human, Side::Autonomous];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Human => f.write_str("human"),
            Side::Autonomous => f.write_str("autonomous"),
        }
    }
}

/// Inclusive rectangle of playable coordinates for one side.
///
/// Y grows upwards: `max_y` is the top row where pieces spawn and `min_y`
/// is the floor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    /// Panics if the rectangle is inverted.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        assert!(min_x <= max_x && min_y <= max_y, "inverted bounds");
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    /// Horizontal midpoint, truncated toward zero.
    pub fn mid_x(&self) -> i32 {
        (self.min_x + self.max_x) / 2
    }

    /// Scans the layout window for cells marked for `side` and returns
    /// their extents, or `None` when nothing is marked.
    pub fn discover(layout: &dyn LayoutSource, side: Side) -> Option<Self> {
        let mut found: Option<Self> = None;
        for y in -MAX_RADIUS..MAX_RADIUS {
            for x in -MAX_RADIUS..MAX_RADIUS {
                if !layout.is_marked(side, Cell::new(x, y)) {
                    continue;
                }
                found = Some(match found {
                    None => Self {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => Self {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                });
            }
        }
        found
    }
}

// ============================================================================
// Layout Source
// ============================================================================

/// Read-only source of the board layout, consulted once at start-up.
pub trait LayoutSource {
    fn is_marked(&self, side: Side, cell: Cell) -> bool;
}

/// Layout that marks one fixed rectangle per side.
#[derive(Clone, Copy, Debug)]
pub struct RectLayout {
    pub human: Option<Bounds>,
    pub autonomous: Option<Bounds>,
}

impl RectLayout {
    pub fn new(human: Bounds, autonomous: Bounds) -> Self {
        Self {
            human: Some(human),
            autonomous: Some(autonomous),
        }
    }
}

impl LayoutSource for RectLayout {
    fn is_marked(&self, side: Side, cell: Cell) -> bool {
        let rect = match side {
            Side::Human => self.human,
            Side::Autonomous => self.autonomous,
        };
        rect.is_some_and(|b| b.contains(cell))
    }
}
