use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};

use duel_blocks::game::{RenderGate, RenderSink, Status, StatusSink};
use duel_blocks::geometry::RectLayout;
use duel_blocks::piece::{Chunk, Piece};
use duel_blocks::{Bounds, Cell, Game, GameEvent, GameState, InputEvent, Side};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = " ·";
const INFO_WIDTH: u16 = 22;

// Timing
const FIXED_STEP: Duration = Duration::from_millis(20);
const FRAME: Duration = Duration::from_millis(16);

// ============================================================================
// Board View
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mark {
    Empty,
    Locked,
    Falling,
}

/// Marks for one board, top row first.
struct BoardView {
    bounds: Bounds,
    rows: Vec<Vec<Mark>>,
}

impl BoardView {
    fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            rows: vec![vec![Mark::Empty; bounds.width() as usize]; bounds.height() as usize],
        }
    }

    fn set(&mut self, cell: Cell, mark: Mark) {
        if !self.bounds.contains(cell) {
            return;
        }
        let row = (self.bounds.max_y - cell.y) as usize;
        let col = (cell.x - self.bounds.min_x) as usize;
        self.rows[row][col] = mark;
    }
}

struct TerminalView {
    human: BoardView,
    autonomous: BoardView,
    status: Status,
    message: String,
    human_area: Option<Rect>,
}

impl TerminalView {
    fn new(game: &Game) -> Self {
        Self {
            human: BoardView::new(game.bounds(Side::Human)),
            autonomous: BoardView::new(game.bounds(Side::Autonomous)),
            status: game.status(),
            message: String::new(),
            human_area: None,
        }
    }

    /// Maps a terminal position inside the human grid to a world cell.
    fn cell_at(&self, column: u16, row: u16) -> Option<Cell> {
        let area = self.human_area?;
        if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
            return None;
        }
        let dx = ((column - area.x) / CELL_WIDTH) as i32;
        let dy = (row - area.y) as i32;
        let bounds = self.human.bounds;
        Some(Cell::new(bounds.min_x + dx, bounds.max_y - dy))
    }

    fn note(&mut self, event: &GameEvent) {
        let message = match event {
            GameEvent::RowCleared { .. } => "Row cleared!".to_string(),
            GameEvent::PunitiveCell(_) => "Penalty block dropped".to_string(),
            GameEvent::DifficultyRaised(level) => format!("Speed up: {level}"),
            GameEvent::OpponentBlocked => "Opponent is stuck".to_string(),
            GameEvent::Halted => "No valid move".to_string(),
            _ => return,
        };
        self.message = message;
    }
}

impl RenderSink for TerminalView {
    fn draw_side(&mut self, side: Side, bounds: Bounds, locked: &Chunk, falling: Option<&Piece>) {
        let mut view = BoardView::new(bounds);
        for &cell in locked.iter() {
            view.set(cell, Mark::Locked);
        }
        for &cell in falling.into_iter().flat_map(|p| p.cells().iter()) {
            view.set(cell, Mark::Falling);
        }
        match side {
            Side::Human => self.human = view,
            Side::Autonomous => self.autonomous = view,
        }
    }
}

impl StatusSink for TerminalView {
    fn show_status(&mut self, status: &Status) {
        self.status = *status;
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, view: &mut TerminalView, state: GameState) {
    let area = frame.size();

    let board_width = |b: &BoardView| b.bounds.width() as u16 * CELL_WIDTH + 2;
    let board_height = |b: &BoardView| b.bounds.height() as u16 + 2;
    let total_width = board_width(&view.human) + board_width(&view.autonomous) + INFO_WIDTH;
    let total_height = board_height(&view.human).max(board_height(&view.autonomous));

    let main_area = centered_rect(total_width, total_height, area);
    let horizontal = Layout::horizontal([
        Constraint::Length(board_width(&view.human)),
        Constraint::Length(INFO_WIDTH),
        Constraint::Length(board_width(&view.autonomous)),
    ])
    .split(main_area);

    view.human_area = Some(render_board(frame, &view.human, " You ", Color::Cyan, horizontal[0]));
    render_info(frame, view, state, horizontal[1]);
    render_board(frame, &view.autonomous, " Opponent ", Color::Red, horizontal[2]);
}

/// Draws one board and returns the inner grid area.
fn render_board(frame: &mut Frame, board: &BoardView, title: &str, color: Color, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = board
        .rows
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|mark| match mark {
                    Mark::Empty => Span::styled(EMPTY_CHAR, Style::default().fg(Color::DarkGray)),
                    Mark::Locked => Span::styled(BLOCK_CHAR, Style::default().fg(Color::Gray)),
                    Mark::Falling => Span::styled(BLOCK_CHAR, Style::default().fg(color)),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
    inner
}

fn render_info(frame: &mut Frame, view: &TerminalView, state: GameState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let state_line = match state {
        GameState::Playing => Line::from(""),
        GameState::Paused => Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        GameState::Halted => Line::from(Span::styled("HALTED", Style::default().fg(Color::Red))),
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("PTS", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", view.status.score)),
        Line::from(""),
        Line::from(Span::styled("MAX", Style::default().fg(Color::Green))),
        Line::from(format!("{}", view.status.difficulty)),
        Line::from(""),
        Line::from(view.status.label),
        Line::from(""),
        state_line,
        Line::from(view.message.as_str()),
        Line::from(""),
        Line::from(Span::styled("←→ move  ↑ rotate", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled("↓ drop  click: block", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled("P pause  Q quit", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

enum Polled {
    Quit,
    Input(Option<InputEvent>),
}

fn poll_input(view: &TerminalView, redraw: &mut bool) -> anyhow::Result<Polled> {
    if !event::poll(FRAME)? {
        return Ok(Polled::Input(None));
    }
    let input = match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(Polled::Quit),
            KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => Some(InputEvent::Pause),
            KeyCode::Left => Some(InputEvent::MoveLeft),
            KeyCode::Right => Some(InputEvent::MoveRight),
            KeyCode::Up => Some(InputEvent::Rotate),
            KeyCode::Down => Some(InputEvent::HardDrop),
            _ => None,
        },
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            view.cell_at(mouse.column, mouse.row).map(InputEvent::PickCell)
        }
        Event::Resize(..) => {
            *redraw = true;
            None
        }
        _ => None,
    };
    Ok(Polled::Input(input))
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, game: &mut Game) -> anyhow::Result<()> {
    let mut view = TerminalView::new(game);
    let mut gate = RenderGate::new();
    let mut last_step = Instant::now();
    let mut redraw = true;

    loop {
        if gate.present(game, &mut view) {
            redraw = true;
        }
        if redraw {
            terminal.draw(|frame| render(frame, &mut view, game.state))?;
            redraw = false;
        }

        let input = match poll_input(&view, &mut redraw)? {
            Polled::Quit => break,
            Polled::Input(input) => input,
        };
        game.frame(input)?;

        while last_step.elapsed() >= FIXED_STEP {
            last_step += FIXED_STEP;
            if game.fixed_update() {
                game.publish_status(&mut view);
            }
        }

        for event in game.take_events() {
            view.note(&event);
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let board = Bounds::new(-5, -10, 4, 9);
    let layout = RectLayout::new(board, board);
    let mut game = Game::new(&layout)?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut game);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}
