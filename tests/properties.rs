//! Property tests for the win detector and turn alternation.

use gomoku_engine::game::win::{detect, find_line, Direction};
use gomoku_engine::{Application, Cell, Color, EngineConfig, GomokuEngine, Intent, WIN_LENGTH};
use proptest::prelude::*;

/// Straightforward scan: any run of five of `color`, in any direction.
fn has_line(board: &[Cell], width: usize, color: Color) -> bool {
    let height = board.len() / width;
    let dirs: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
    for row in 0..height as isize {
        for col in 0..width as isize {
            for (dr, dc) in dirs {
                let all = (0..WIN_LENGTH as isize).all(|k| {
                    let (r, c) = (row + dr * k, col + dc * k);
                    r >= 0
                        && c >= 0
                        && r < height as isize
                        && c < width as isize
                        && board[(r * width as isize + c) as usize] == Some(color)
                });
                if all {
                    return true;
                }
            }
        }
    }
    false
}

fn cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        4 => Just(None::<Color>),
        1 => Just(Some(Color::Black)),
        1 => Just(Some(Color::White)),
    ]
}

fn random_board(width: usize) -> impl Strategy<Value = Vec<Cell>> {
    prop::collection::vec(cell(), width * width)
}

fn direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

proptest! {
    /// Property: detect reports a color iff that color has five in a row
    #[test]
    fn prop_detect_iff_line(
        (width, board) in (5usize..12).prop_flat_map(|w| (Just(w), random_board(w)))
    ) {
        let black = has_line(&board, width, Color::Black);
        let white = has_line(&board, width, Color::White);
        match detect(&board, width) {
            Some(color) => prop_assert!(has_line(&board, width, color)),
            None => prop_assert!(!black && !white),
        }
        prop_assert_eq!(detect(&board, width).is_some(), black || white);
    }

    /// Property: a planted line is found, and find_line points at real stones
    #[test]
    fn prop_planted_line_found(
        width in 5usize..20,
        row in 0usize..20,
        col in 0usize..20,
        dir in direction(),
        black in any::<bool>(),
    ) {
        let color = if black { Color::Black } else { Color::White };
        let span = WIN_LENGTH - 1;
        let (row, col) = match dir {
            Direction::Horizontal => (row % width, col % (width - span)),
            Direction::Vertical => (row % (width - span), col % width),
            Direction::DiagonalDownRight => (row % (width - span), col % (width - span)),
            Direction::DiagonalDownLeft => (row % (width - span), span + col % (width - span)),
        };
        let (dr, dc): (usize, isize) = match dir {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::DiagonalDownRight => (1, 1),
            Direction::DiagonalDownLeft => (1, -1),
        };

        let mut board: Vec<Cell> = vec![None; width * width];
        for k in 0..WIN_LENGTH {
            let r = row + dr * k;
            let c = (col as isize + dc * k as isize) as usize;
            board[r * width + c] = Some(color);
        }

        prop_assert_eq!(detect(&board, width), Some(color));
        let line = find_line(&board, width).unwrap();
        prop_assert_eq!(line.color, color);
        for index in line.cells(width) {
            prop_assert_eq!(board[index], Some(color));
        }
    }

    /// Property: four in a row never wins
    #[test]
    fn prop_four_is_not_enough(width in 5usize..20, row in 0usize..20, start in 0usize..20) {
        let row = row % width;
        let start = start % (width - 3);
        let mut board: Vec<Cell> = vec![None; width * width];
        for c in start..start + 4 {
            board[row * width + c] = Some(Color::Black);
        }
        prop_assert_eq!(detect(&board, width), None);
    }

    /// Property: stones strictly alternate Black, White, Black...
    #[test]
    fn prop_strict_alternation(moves in prop::collection::vec((any::<bool>(), 0usize..400), 0..120)) {
        let mut engine = GomokuEngine::new(EngineConfig::default()).unwrap();
        engine.init(b"alternation");
        engine.step(&[Intent::join("black"), Intent::join("white")]);

        for (by_black, position) in moves {
            let who = if by_black { "black" } else { "white" };
            engine.step(&[Intent::play(who, position)]);

            let room = &engine.rooms().rooms()[0];
            let blacks = room.board().cells().iter().filter(|c| **c == Some(Color::Black)).count();
            let whites = room.board().cells().iter().filter(|c| **c == Some(Color::White)).count();
            prop_assert!(blacks == whites || blacks == whites + 1);
            prop_assert_eq!(room.step() as usize, blacks + whites);
            if room.winner().is_none() {
                let expected = if blacks == whites { Color::Black } else { Color::White };
                prop_assert_eq!(room.next_color(), expected);
            }
        }
    }
}
