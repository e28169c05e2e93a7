use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::Board;
use crate::error::GameError;
use crate::geometry::{Bounds, Cell, LayoutSource, Side};
use crate::opponent::{self, Step};
use crate::piece::{Active, Chunk, Move, Piece};
use crate::shapes::{RandomShapeProvider, ShapeProvider};

// ============================================================================
// Configuration
// ============================================================================

/// Fixed ticks between gravity steps at difficulty zero.
pub const INITIAL_CADENCE: u32 = 10;
pub const STATUS_LABEL: &str = "CURRIC 576";

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Playing,
    Paused,
    Halted,
}

/// Edge-triggered input, at most one per frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    MoveLeft,
    MoveRight,
    Rotate,
    HardDrop,
    PickCell(Cell),
    Pause,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceSpawned(Side),
    PieceLocked(Side),
    RowCleared { row: i32 },
    PunitiveCell(Cell),
    PunitiveAbsorbed(Cell),
    StreakBroken,
    DifficultyRaised(u32),
    OpponentBlocked,
    Paused,
    Unpaused,
    Halted,
}

/// Score, difficulty and cadence for the whole match.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Session {
    pub score: u32,
    /// Longest run of consecutive clearing steps so far.
    pub difficulty: u32,
    pub streak: u32,
    /// Fixed ticks between gravity steps; never below 1.
    pub cadence: u32,
}

impl Session {
    pub fn new() -> Self {
        Self {
            score: 0,
            difficulty: 0,
            streak: 0,
            cadence: INITIAL_CADENCE,
        }
    }

    /// Records a new best streak and speeds the cadence up by one.
    pub fn ramp(&mut self) -> bool {
        if self.streak <= self.difficulty {
            return false;
        }
        self.difficulty = self.streak;
        if self.cadence > 1 {
            self.cadence -= 1;
        }
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Readout handed to the status sink.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Status {
    pub score: u32,
    pub difficulty: u32,
    pub label: &'static str,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SideState {
    pub board: Board,
    pub active: Active,
}

impl SideState {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            active: Active::Locked,
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

pub trait RenderSink {
    /// Redraws one board: `locked` cells, then `falling` on top. Cells not
    /// named are empty.
    fn draw_side(&mut self, side: Side, bounds: Bounds, locked: &Chunk, falling: Option<&Piece>);
}

pub trait StatusSink {
    fn show_status(&mut self, status: &Status);
}

/// Skips redraws when nothing changed since the last one.
#[derive(Default, Debug)]
pub struct RenderGate {
    seen: Option<u64>,
}

impl RenderGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn present(&mut self, game: &Game, sink: &mut dyn RenderSink) -> bool {
        let version = game.version();
        if self.seen == Some(version) {
            return false;
        }
        for side in Side::BOTH {
            let state = game.side(side);
            sink.draw_side(side, state.board.bounds, &state.board.chunk, state.active.piece());
        }
        self.seen = Some(version);
        true
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    pub human: SideState,
    pub autonomous: SideState,
    pub session: Session,
    pub state: GameState,
    fixed_count: u32,
    version: u64,
    shapes: Box<dyn ShapeProvider>,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(layout: &dyn LayoutSource) -> Result<Self, GameError> {
        Self::from_rng(layout, StdRng::from_entropy())
    }

    /// Same seed, same layout and same inputs replay the same match.
    pub fn seeded(layout: &dyn LayoutSource, seed: u64) -> Result<Self, GameError> {
        Self::from_rng(layout, StdRng::seed_from_u64(seed))
    }

    fn from_rng(layout: &dyn LayoutSource, mut rng: StdRng) -> Result<Self, GameError> {
        let shapes = RandomShapeProvider::seeded(rng.gen());
        Self::with_provider(layout, Box::new(shapes), rng)
    }

    /// Discovers both boards from `layout` and spawns the opening pieces.
    pub fn with_provider(
        layout: &dyn LayoutSource,
        shapes: Box<dyn ShapeProvider>,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        let human = Bounds::discover(layout, Side::Human).ok_or(GameError::EmptyLayout(Side::Human))?;
        let autonomous = Bounds::discover(layout, Side::Autonomous)
            .ok_or(GameError::EmptyLayout(Side::Autonomous))?;
        Self::with_boards(Board::new(human), Board::new(autonomous), shapes, rng)
    }

    pub fn with_boards(
        human: Board,
        autonomous: Board,
        shapes: Box<dyn ShapeProvider>,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        let mut game = Self {
            human: SideState::new(human),
            autonomous: SideState::new(autonomous),
            session: Session::new(),
            state: GameState::Playing,
            fixed_count: 0,
            version: 0,
            shapes,
            rng,
            events: Vec::new(),
        };

        let piece = game.spawn_for(Side::Human);
        if !game.human.board.valid_piece(&piece) {
            return Err(GameError::NoValidStart);
        }
        game.human.active = Active::Falling(piece);

        let piece = game.spawn_for(Side::Autonomous);
        if game.autonomous.board.valid_piece(&piece) {
            game.autonomous.active = Active::Falling(piece);
        } else {
            game.events.push(GameEvent::OpponentBlocked);
        }
        Ok(game)
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Human => &self.human,
            Side::Autonomous => &self.autonomous,
        }
    }

    pub fn bounds(&self, side: Side) -> Bounds {
        self.side(side).board.bounds
    }

    /// Bumped on every mutation of either side or the session.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn status(&self) -> Status {
        Status {
            score: self.session.score,
            difficulty: self.session.difficulty,
            label: STATUS_LABEL,
        }
    }

    pub fn publish_status(&self, sink: &mut dyn StatusSink) {
        sink.show_status(&self.status());
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn spawn_for(&mut self, side: Side) -> Piece {
        let shape = self.shapes.next_shape();
        Piece::spawn_in(shape, &self.side(side).board.bounds)
    }

    fn halt(&mut self, error: GameError) -> GameError {
        self.state = GameState::Halted;
        self.events.push(GameEvent::Halted);
        self.touch();
        error
    }

    // ========================================================================
    // Fixed-rate step
    // ========================================================================

    /// Called by the host clock at a fixed rate. Runs a gravity step on the
    /// first call and then once every `cadence` calls.
    pub fn fixed_update(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let due = self.fixed_count % self.session.cadence == 0;
        self.fixed_count += 1;
        if !due {
            return false;
        }
        self.advance();
        self.fixed_count = 1;
        true
    }

    /// One gravity step: human drop, opponent move, human line clear, ramp.
    pub fn advance(&mut self) {
        self.drop_human();
        self.step_opponent();
        self.clear_human_row();
        if self.session.ramp() {
            self.events
                .push(GameEvent::DifficultyRaised(self.session.difficulty));
        }
        self.touch();
    }

    fn drop_human(&mut self) {
        let Active::Falling(piece) = self.human.active else {
            return;
        };
        match self.human.board.shift(&piece, 0, -1) {
            Move::Accepted(next) => self.human.active = Active::Falling(next),
            Move::Rejected => {
                self.human.board.lock_in(&piece);
                self.human.active = Active::Locked;
                self.events.push(GameEvent::PieceLocked(Side::Human));
            }
        }
    }

    fn step_opponent(&mut self) {
        let side = &mut self.autonomous;
        let step = opponent::step(
            &mut side.board,
            &mut side.active,
            &mut *self.shapes,
            &mut self.rng,
        );
        match step {
            Step::Spawned => self.events.push(GameEvent::PieceSpawned(Side::Autonomous)),
            Step::Blocked => self.events.push(GameEvent::OpponentBlocked),
            Step::Locked => self.events.push(GameEvent::PieceLocked(Side::Autonomous)),
            Step::Moved => {}
        }
    }

    /// Clears at most one human row; the opponent's board never clears.
    fn clear_human_row(&mut self) {
        match self.human.board.find_clearable_row() {
            Some(row) => {
                self.human.board.collapse_row(row);
                self.session.streak += 1;
                self.session.score += 1;
                self.events.push(GameEvent::RowCleared { row });
                self.add_punitive_cell();
            }
            None => {
                if self.session.streak > 0 {
                    self.events.push(GameEvent::StreakBroken);
                }
                self.session.streak = 0;
            }
        }
    }

    /// True when `cell` is covered by the falling human piece.
    fn under_human_piece(&self, cell: Cell) -> bool {
        self.human
            .active
            .piece()
            .is_some_and(|p| p.cells().contains(&cell))
    }

    /// Drops one random cell into the upper half of the human board. A cell
    /// that is already settled or under the falling piece is absorbed.
    pub fn add_punitive_cell(&mut self) -> bool {
        let b = self.human.board.bounds;
        let x = self.rng.gen_range(b.min_x..=b.max_x);
        let y = self.rng.gen_range(b.min_y + b.height() / 2..=b.max_y);
        let cell = Cell::new(x, y);
        if !self.under_human_piece(cell) && self.human.board.chunk.insert(cell) {
            self.events.push(GameEvent::PunitiveCell(cell));
            self.touch();
            true
        } else {
            self.events.push(GameEvent::PunitiveAbsorbed(cell));
            false
        }
    }

    // ========================================================================
    // Per-frame step
    // ========================================================================

    /// Called once per host frame. Spawns the human piece when needed and
    /// applies this frame's input.
    pub fn frame(&mut self, input: Option<InputEvent>) -> Result<(), GameError> {
        match self.state {
            GameState::Halted => return Err(GameError::Halted),
            GameState::Paused => {
                if input == Some(InputEvent::Pause) {
                    self.toggle_pause();
                }
                return Ok(());
            }
            GameState::Playing => {}
        }

        if self.human.active == Active::Locked {
            let piece = self.spawn_for(Side::Human);
            if !self.human.board.valid_piece(&piece) {
                return Err(self.halt(GameError::NoValidSpawn));
            }
            self.human.active = Active::Falling(piece);
            self.events.push(GameEvent::PieceSpawned(Side::Human));
            self.touch();
        }

        match input {
            None => {}
            Some(InputEvent::MoveLeft) => {
                self.move_piece(-1);
            }
            Some(InputEvent::MoveRight) => {
                self.move_piece(1);
            }
            Some(InputEvent::Rotate) => {
                self.rotate_piece();
            }
            Some(InputEvent::HardDrop) => {
                self.hard_drop();
            }
            Some(InputEvent::PickCell(cell)) => {
                self.pick_cell(cell);
            }
            Some(InputEvent::Pause) => self.toggle_pause(),
        }
        Ok(())
    }

    fn replace_human_piece(&mut self, next: Piece) -> bool {
        if self.human.active == Active::Falling(next) {
            return false;
        }
        self.human.active = Active::Falling(next);
        self.touch();
        true
    }

    pub fn move_piece(&mut self, dx: i32) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let Active::Falling(piece) = self.human.active else {
            return false;
        };
        self.human
            .board
            .shift(&piece, dx, 0)
            .accepted()
            .map_or(false, |next| self.replace_human_piece(next))
    }

    pub fn rotate_piece(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let Active::Falling(piece) = self.human.active else {
            return false;
        };
        let next = self.human.board.rotate(&piece);
        self.replace_human_piece(next)
    }

    /// Moves the human piece to its landing row. It locks on the next
    /// gravity step, not here.
    pub fn hard_drop(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let Active::Falling(piece) = self.human.active else {
            return false;
        };
        let next = self.human.board.hard_drop(&piece);
        self.replace_human_piece(next)
    }

    /// Adds a settled cell to the human board. Coordinates outside the
    /// board or under the falling piece are ignored.
    pub fn pick_cell(&mut self, cell: Cell) -> bool {
        if self.state != GameState::Playing
            || !self.human.board.bounds.contains(cell)
            || self.under_human_piece(cell)
        {
            return false;
        }
        if !self.human.board.chunk.insert(cell) {
            return false;
        }
        self.touch();
        true
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => {
                self.state = GameState::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameState::Paused => {
                self.state = GameState::Playing;
                self.events.push(GameEvent::Unpaused);
            }
            GameState::Halted => return,
        }
        self.touch();
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::shapes::{SequenceShapeProvider, Shape};

    /// 10 x 20 board spanning x in -5..=4 and y in -10..=9.
    pub fn standard_bounds() -> Bounds {
        Bounds::new(-5, -10, 4, 9)
    }

    pub fn empty_board() -> Board {
        Board::new(standard_bounds())
    }

    pub fn fill_row(board: &mut Board, y: i32) {
        for x in board.bounds.min_x..=board.bounds.max_x {
            board.chunk.insert(Cell::new(x, y));
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, y: i32, gap_x: i32) {
        for x in board.bounds.min_x..=board.bounds.max_x {
            if x != gap_x {
                board.chunk.insert(Cell::new(x, y));
            }
        }
    }

    /// Game with scripted spawns and a seeded generator.
    pub fn scripted_game(human: Board, autonomous: Board, shapes: Vec<Shape>, seed: u64) -> Game {
        Game::with_boards(
            human,
            autonomous,
            Box::new(SequenceShapeProvider::new(shapes)),
            StdRng::seed_from_u64(seed),
        )
        .expect("scripted game must have a valid opening spawn")
    }

    /// Remembers what it was last asked to draw.
    #[derive(Default, Debug)]
    pub struct RecordingSink {
        pub draws: usize,
        pub locked: Vec<(Side, usize)>,
        pub falling: Vec<(Side, Option<Piece>)>,
        pub statuses: Vec<Status>,
    }

    impl RenderSink for RecordingSink {
        fn draw_side(&mut self, side: Side, _bounds: Bounds, locked: &Chunk, falling: Option<&Piece>) {
            self.draws += 1;
            self.locked.push((side, locked.len()));
            self.falling.push((side, falling.copied()));
        }
    }

    impl StatusSink for RecordingSink {
        fn show_status(&mut self, status: &Status) {
            self.statuses.push(*status);
        }
    }
}
