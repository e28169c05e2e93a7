//! Tests for the tick orchestrator
//!
//! Test categories:
//! - Start-up and bounds discovery
//! - Fixed-rate cadence
//! - Gravity, line clear and punitive cells
//! - Difficulty ramp
//! - Per-frame input handling
//! - Render gating and status readout

use rand::rngs::StdRng;
use rand::SeedableRng;

use duel_blocks::game::test_helpers::*;
use duel_blocks::game::{RenderGate, Session, Status, INITIAL_CADENCE, STATUS_LABEL};
use duel_blocks::geometry::RectLayout;
use duel_blocks::piece::{Active, Piece};
use duel_blocks::shapes::{SequenceShapeProvider, Shape};
use duel_blocks::{Bounds, Cell, Game, GameError, GameEvent, GameState, InputEvent, Side};

fn game() -> Game {
    scripted_game(empty_board(), empty_board(), vec![Shape::T], 42)
}

fn human_piece(game: &Game) -> Piece {
    *game.human.active.piece().expect("human piece is falling")
}

// ============================================================================
// Setup Tests
// ============================================================================

mod setup {
    use super::*;

    #[test]
    fn boards_come_from_layout() {
        let human = Bounds::new(-12, -10, -3, 9);
        let autonomous = Bounds::new(3, -10, 12, 9);
        let game = Game::with_provider(
            &RectLayout::new(human, autonomous),
            Box::new(SequenceShapeProvider::new(vec![Shape::T])),
            StdRng::seed_from_u64(1),
        )
        .expect("layout is playable");

        assert_eq!(game.bounds(Side::Human), human);
        assert_eq!(game.bounds(Side::Autonomous), autonomous);
        assert_eq!(game.human.active, Active::Falling(Piece::spawn_in(Shape::T, &human)));
        assert_eq!(
            game.autonomous.active,
            Active::Falling(Piece::spawn_in(Shape::T, &autonomous))
        );
    }

    #[test]
    fn random_game_spawns_both_pieces() {
        let layout = RectLayout::new(standard_bounds(), standard_bounds());
        let game = Game::new(&layout).expect("layout is playable");

        assert!(matches!(game.human.active, Active::Falling(_)));
        assert!(matches!(game.autonomous.active, Active::Falling(_)));
        assert_eq!(game.state, GameState::Playing);
    }

    #[test]
    fn same_seed_replays_same_match() {
        let layout = RectLayout::new(standard_bounds(), standard_bounds());
        let mut a = Game::seeded(&layout, 5).expect("layout is playable");
        let mut b = Game::seeded(&layout, 5).expect("layout is playable");

        for _ in 0..300 {
            assert_eq!(a.fixed_update(), b.fixed_update());
            assert_eq!(a.frame(None), b.frame(None));
            assert_eq!(a.human.active, b.human.active);
            assert_eq!(a.autonomous.active, b.autonomous.active);
        }
    }

    #[test]
    fn missing_board_is_fatal() {
        let layout = RectLayout {
            human: Some(standard_bounds()),
            autonomous: None,
        };

        let result = Game::with_provider(
            &layout,
            Box::new(SequenceShapeProvider::new(vec![Shape::T])),
            StdRng::seed_from_u64(1),
        );

        assert_eq!(result.err(), Some(GameError::EmptyLayout(Side::Autonomous)));
    }

    #[test]
    fn blocked_opening_spawn_is_fatal() {
        let mut human = empty_board();
        fill_row(&mut human, 9);

        let result = Game::with_boards(
            human,
            empty_board(),
            Box::new(SequenceShapeProvider::new(vec![Shape::T])),
            StdRng::seed_from_u64(1),
        );

        assert_eq!(result.err(), Some(GameError::NoValidStart));
    }

    #[test]
    fn blocked_opponent_start_is_not_fatal() {
        let mut autonomous = empty_board();
        fill_row(&mut autonomous, 9);

        let mut game = scripted_game(empty_board(), autonomous, vec![Shape::T], 1);

        assert_eq!(game.autonomous.active, Active::Locked);
        assert_eq!(game.take_events(), vec![GameEvent::OpponentBlocked]);
    }

    #[test]
    fn new_session_starts_slow_and_empty() {
        let game = game();

        assert_eq!(game.session, Session::new());
        assert_eq!(game.session.cadence, INITIAL_CADENCE);
        assert_eq!(game.state, GameState::Playing);
    }
}

// ============================================================================
// Cadence Tests
// ============================================================================

mod cadence {
    use super::*;

    #[test]
    fn first_tick_fires_then_every_cadence() {
        let mut game = game();

        let fired: Vec<usize> = (0..25).filter(|_| game.fixed_update()).collect();

        assert_eq!(fired, vec![0, 10, 20]);
    }

    #[test]
    fn shorter_cadence_fires_more_often() {
        let mut game = game();
        game.session.cadence = 3;

        let fired: Vec<usize> = (0..10).filter(|_| game.fixed_update()).collect();

        assert_eq!(fired, vec![0, 3, 6, 9]);
    }

    #[test]
    fn paused_game_does_not_step() {
        let mut game = game();
        game.toggle_pause();
        let before = human_piece(&game);

        assert!(!game.fixed_update());
        assert_eq!(human_piece(&game), before);
    }
}

// ============================================================================
// Gravity Tests
// ============================================================================

mod gravity {
    use super::*;

    #[test]
    fn human_piece_falls_one_row() {
        let mut game = game();
        let before = human_piece(&game);

        game.advance();

        assert_eq!(human_piece(&game), before.shifted(0, -1));
    }

    #[test]
    fn resting_human_piece_locks_without_respawn() {
        let mut game = game();
        game.human.active = Active::Falling(Piece::spawn(Shape::I, 0, -10));
        game.take_events();

        game.advance();

        assert_eq!(game.human.active, Active::Locked);
        assert_eq!(game.human.board.chunk.len(), 4);
        assert!(game.take_events().contains(&GameEvent::PieceLocked(Side::Human)));
    }

    #[test]
    fn next_frame_respawns_human_piece() {
        let mut game = game();
        game.human.active = Active::Locked;

        game.frame(None).expect("spawn area is clear");

        assert_eq!(
            game.human.active,
            Active::Falling(Piece::spawn_in(Shape::T, &standard_bounds()))
        );
    }

    #[test]
    fn opponent_moves_every_step() {
        let mut game = scripted_game(empty_board(), empty_board(), vec![Shape::I], 42);
        let before = *game.autonomous.active.piece().expect("opponent spawned");

        game.advance();

        let after = *game.autonomous.active.piece().expect("opponent still falling");
        let lowest = |p: &Piece| p.cells().iter().map(|c| c.y).min();
        assert_eq!(lowest(&after), lowest(&before).map(|y| y - 1));
    }
}

// ============================================================================
// Line Clear Tests
// ============================================================================

mod line_clear {
    use super::*;

    #[test]
    fn full_human_row_is_cleared_and_punished() {
        let mut human = empty_board();
        fill_row(&mut human, -10);
        let mut game = scripted_game(human, empty_board(), vec![Shape::T], 5);

        game.advance();

        assert_eq!(game.session.streak, 1);
        assert_eq!(game.session.score, 1);
        assert_eq!(game.human.board.chunk.len(), 1);
        let events = game.take_events();
        assert!(events.contains(&GameEvent::RowCleared { row: -10 }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::PunitiveCell(_))));
    }

    #[test]
    fn only_one_row_clears_per_step() {
        let mut human = empty_board();
        fill_row(&mut human, -10);
        fill_row(&mut human, -9);
        let mut game = scripted_game(human, empty_board(), vec![Shape::T], 5);

        game.advance();

        assert_eq!(game.human.board.find_clearable_row(), Some(-10));
    }

    #[test]
    fn step_without_clear_breaks_streak() {
        let mut game = game();
        game.session.streak = 2;
        game.take_events();

        game.advance();

        assert_eq!(game.session.streak, 0);
        assert!(game.take_events().contains(&GameEvent::StreakBroken));
    }

    #[test]
    fn opponent_rows_are_never_cleared() {
        let mut autonomous = empty_board();
        fill_row(&mut autonomous, -10);
        let mut game = scripted_game(empty_board(), autonomous, vec![Shape::T], 5);

        game.advance();

        assert_eq!(game.autonomous.board.chunk.count_in_row(-10), 10);
        assert!(!game
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::RowCleared { .. })));
    }

    #[test]
    fn punitive_cells_land_in_upper_half() {
        let mut game = game();
        let bounds = game.bounds(Side::Human);

        for _ in 0..200 {
            game.add_punitive_cell();
        }

        assert!(!game.human.board.chunk.is_empty());
        for cell in game.human.board.chunk.iter() {
            assert!(bounds.contains(*cell), "{cell:?} outside the board");
            assert!(cell.y >= 0, "{cell:?} below the upper half");
        }
    }

    #[test]
    fn punitive_cell_grows_chunk_by_at_most_one() {
        let mut game = game();

        for _ in 0..50 {
            let before = game.human.board.chunk.len();
            let added = game.add_punitive_cell();
            let grown = game.human.board.chunk.len() - before;
            assert_eq!(grown, usize::from(added));
        }
    }

    #[test]
    fn punitive_cells_never_cover_falling_piece() {
        let mut game = game();
        let piece = human_piece(&game);

        for _ in 0..200 {
            game.add_punitive_cell();
        }

        for cell in piece.cells() {
            assert!(!game.human.board.chunk.contains(*cell), "{cell:?} covered");
        }
        assert_eq!(human_piece(&game), piece);
    }

    #[test]
    fn duplicate_punitive_cell_is_absorbed() {
        let mut game = game();
        for y in 0..=9 {
            fill_row(&mut game.human.board, y);
        }
        let before = game.human.board.chunk.len();
        game.take_events();

        assert!(!game.add_punitive_cell());

        assert_eq!(game.human.board.chunk.len(), before);
        assert!(matches!(
            game.take_events().as_slice(),
            [GameEvent::PunitiveAbsorbed(_)]
        ));
    }
}

// ============================================================================
// Difficulty Tests
// ============================================================================

mod difficulty {
    use super::*;

    #[test]
    fn each_new_best_streak_speeds_up_once() {
        let mut session = Session::new();

        for streak in 1..=3 {
            session.streak = streak;
            assert!(session.ramp());
        }

        assert_eq!(session.difficulty, 3);
        assert_eq!(session.cadence, 7);
    }

    #[test]
    fn matching_old_best_does_not_ramp() {
        let mut session = Session::new();
        session.difficulty = 2;
        session.streak = 2;

        assert!(!session.ramp());
        assert_eq!(session.cadence, INITIAL_CADENCE);
    }

    #[test]
    fn cadence_never_drops_below_one() {
        let mut session = Session::new();
        session.cadence = 1;
        session.streak = 5;

        assert!(session.ramp());
        assert_eq!(session.cadence, 1);
        assert_eq!(session.difficulty, 5);
    }

    #[test]
    fn three_consecutive_clears_ramp_the_game() {
        let mut human = empty_board();
        for y in -10..=-8 {
            fill_row(&mut human, y);
        }
        let mut game = scripted_game(human, empty_board(), vec![Shape::T], 9);

        for _ in 0..3 {
            game.advance();
        }

        assert_eq!(game.session.streak, 3);
        assert_eq!(game.session.difficulty, 3);
        assert_eq!(game.session.cadence, 7);
        assert_eq!(game.session.score, 3);
        let raised: Vec<GameEvent> = game
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::DifficultyRaised(_)))
            .collect();
        assert_eq!(
            raised,
            vec![
                GameEvent::DifficultyRaised(1),
                GameEvent::DifficultyRaised(2),
                GameEvent::DifficultyRaised(3),
            ]
        );
    }
}

// ============================================================================
// Input Tests
// ============================================================================

mod input {
    use super::*;

    #[test]
    fn left_and_right_shift_the_piece() {
        let mut game = game();
        let start = human_piece(&game);

        game.frame(Some(InputEvent::MoveLeft)).unwrap();
        assert_eq!(human_piece(&game), start.shifted(-1, 0));

        game.frame(Some(InputEvent::MoveRight)).unwrap();
        game.frame(Some(InputEvent::MoveRight)).unwrap();
        assert_eq!(human_piece(&game), start.shifted(1, 0));
    }

    #[test]
    fn blocked_shift_keeps_piece_and_version() {
        let mut game = game();
        let piece = Piece::spawn(Shape::I, -3, 5);
        game.human.active = Active::Falling(piece);
        let version = game.version();

        game.frame(Some(InputEvent::MoveLeft)).unwrap();

        assert_eq!(human_piece(&game), piece);
        assert_eq!(game.version(), version);
    }

    #[test]
    fn rotate_turns_the_piece() {
        let mut game = game();
        let start = human_piece(&game).shifted(0, -4);
        game.human.active = Active::Falling(start);

        game.frame(Some(InputEvent::Rotate)).unwrap();

        let turned = human_piece(&game);
        assert_ne!(turned, start);
        assert_eq!(turned.origin(), start.origin());
    }

    #[test]
    fn hard_drop_lands_without_locking() {
        let mut game = game();

        game.frame(Some(InputEvent::HardDrop)).unwrap();

        let landed = human_piece(&game);
        assert_eq!(landed.cells().iter().map(|c| c.y).min(), Some(-10));
        assert!(game.human.board.chunk.is_empty());

        game.advance();
        assert_eq!(game.human.active, Active::Locked);
        assert_eq!(game.human.board.chunk.len(), 4);
    }

    #[test]
    fn pick_cell_adds_one_settled_cell() {
        let mut game = game();
        let cell = Cell::new(2, -7);

        game.frame(Some(InputEvent::PickCell(cell))).unwrap();
        game.frame(Some(InputEvent::PickCell(cell))).unwrap();

        assert_eq!(game.human.board.chunk.len(), 1);
        assert!(game.human.board.chunk.contains(cell));
    }

    #[test]
    fn pick_outside_board_is_ignored() {
        let mut game = game();

        assert!(!game.pick_cell(Cell::new(20, 0)));
        assert!(game.human.board.chunk.is_empty());
    }

    #[test]
    fn pick_under_falling_piece_is_ignored() {
        let mut game = game();
        let piece = human_piece(&game);
        let version = game.version();

        for cell in piece.cells() {
            game.frame(Some(InputEvent::PickCell(*cell))).unwrap();
        }

        assert!(game.human.board.chunk.is_empty());
        assert_eq!(game.version(), version);
    }

    #[test]
    fn pause_blocks_input_until_resumed() {
        let mut game = game();
        let start = human_piece(&game);

        game.frame(Some(InputEvent::Pause)).unwrap();
        assert_eq!(game.state, GameState::Paused);

        game.frame(Some(InputEvent::MoveLeft)).unwrap();
        assert_eq!(human_piece(&game), start);

        game.frame(Some(InputEvent::Pause)).unwrap();
        assert_eq!(game.state, GameState::Playing);
        let events = game.take_events();
        assert!(events.contains(&GameEvent::Paused));
        assert!(events.contains(&GameEvent::Unpaused));
    }

    #[test]
    fn blocked_human_spawn_halts_the_game() {
        let mut game = game();
        fill_row(&mut game.human.board, 9);
        game.human.active = Active::Locked;

        assert_eq!(game.frame(None), Err(GameError::NoValidSpawn));
        assert_eq!(game.state, GameState::Halted);
        assert!(game.take_events().contains(&GameEvent::Halted));

        assert_eq!(game.frame(Some(InputEvent::MoveLeft)), Err(GameError::Halted));
        assert!(!game.fixed_update());
    }
}

// ============================================================================
// Render Tests
// ============================================================================

mod render {
    use super::*;

    #[test]
    fn gate_draws_both_sides_once_per_change() {
        let mut game = game();
        let mut gate = RenderGate::new();
        let mut sink = RecordingSink::default();

        assert!(gate.present(&game, &mut sink));
        assert_eq!(sink.draws, 2);
        assert!(!gate.present(&game, &mut sink));
        assert_eq!(sink.draws, 2);

        game.frame(Some(InputEvent::MoveLeft)).unwrap();
        assert!(gate.present(&game, &mut sink));
        assert_eq!(sink.draws, 4);
    }

    #[test]
    fn sink_sees_falling_and_locked_cells() {
        let mut game = game();
        game.pick_cell(Cell::new(0, -10));
        let mut gate = RenderGate::new();
        let mut sink = RecordingSink::default();

        gate.present(&game, &mut sink);

        assert_eq!(sink.locked[0], (Side::Human, 1));
        assert_eq!(sink.falling[0], (Side::Human, Some(human_piece(&game))));
        assert_eq!(sink.locked[1], (Side::Autonomous, 0));
    }

    #[test]
    fn status_reports_score_and_difficulty() {
        let mut game = game();
        game.session.score = 4;
        game.session.difficulty = 2;
        let mut sink = RecordingSink::default();

        game.publish_status(&mut sink);

        assert_eq!(
            sink.statuses,
            vec![Status {
                score: 4,
                difficulty: 2,
                label: STATUS_LABEL,
            }]
        );
    }

    #[test]
    fn every_step_bumps_version() {
        let mut game = game();
        let before = game.version();

        game.advance();

        assert!(game.version() > before);
    }
}
