//! Whole-game checks of the engine: self-play and the non-losing guarantee.

use tictactoe_core::{best_move, Board, Outcome, Side, CELLS};

/// Play both sides with `best_move` until the round ends.
fn self_play(mut board: Board, mut side: Side) -> Outcome {
    loop {
        let index = best_move(&board, side).expect("Ongoing board has a move");
        let outcome = board.place(index, side).expect("Engine picked a legal cell");
        if outcome.is_terminal() {
            return outcome;
        }
        side = side.opponent();
    }
}

#[test]
fn test_self_play_from_blank_is_draw() {
    assert_eq!(self_play(Board::new(), Side::X), Outcome::Draw);
}

#[test]
fn test_self_play_after_every_opening_is_draw() {
    for opening in 0..CELLS {
        let mut board = Board::new();
        board.place(opening, Side::X).unwrap();
        assert_eq!(self_play(board, Side::O), Outcome::Draw, "opening {}", opening);
    }
}

/// Explore every opponent reply; the engine answers each with `best_move`.
/// Returns the number of finished games and panics if the engine loses.
fn never_loses(board: Board, to_move: Side, engine: Side) -> u64 {
    if to_move == engine {
        let index = best_move(&board, engine).expect("Ongoing board has a move");
        let (child, outcome) = board.apply_move(index, engine).expect("Engine picked a legal cell");
        return match outcome {
            Outcome::Ongoing => never_loses(child, to_move.opponent(), engine),
            _ => 1,
        };
    }

    let mut games = 0;
    for (_, child) in board.children(to_move) {
        match child.evaluate() {
            Outcome::Win(side) => panic!("{:?} lost to {:?}:\n{}", engine, side, child),
            Outcome::Draw => games += 1,
            Outcome::Ongoing => games += never_loses(child, engine, engine),
        }
    }
    games
}

#[test]
fn test_never_loses_as_x() {
    let games = never_loses(Board::new(), Side::X, Side::X);
    assert!(games > 0);
}

#[test]
fn test_never_loses_as_o() {
    let games = never_loses(Board::new(), Side::X, Side::O);
    assert!(games > 0);
}
