//! Known positions with their expected engine answers.
//!
//! Loads `fixtures/positions.json` and checks, for each board, the terminal
//! state, the move `best_move` picks and the best minimax score.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tictactoe_core::{best_move, Board, MoveError, Outcome, SearchMode, Searcher, Side};

#[derive(Debug, Deserialize)]
struct TestData {
    version: String,
    positions: Vec<Position>,
}

#[derive(Debug, Deserialize)]
struct Position {
    description: String,
    board: String,
    side: Side,
    best_moves: Vec<usize>,
    #[serde(default)]
    score: Option<i32>,
    outcome: String,
}

fn load_positions() -> TestData {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/positions.json");
    let file = File::open(&path).expect("Failed to open positions fixture");
    serde_json::from_reader(BufReader::new(file)).expect("Failed to parse JSON")
}

fn parse_outcome(s: &str) -> Outcome {
    match s {
        "ongoing" => Outcome::Ongoing,
        "draw" => Outcome::Draw,
        "x" => Outcome::Win(Side::X),
        "o" => Outcome::Win(Side::O),
        other => panic!("Invalid outcome: {}", other),
    }
}

#[test]
fn test_fixture_loads() {
    let data = load_positions();
    assert_eq!(data.version, "1");
    assert!(data.positions.len() >= 8);
}

#[test]
fn test_fixture_outcomes() {
    for pos in load_positions().positions {
        let board: Board = pos.board.parse().expect("Invalid board");
        assert_eq!(board.evaluate(), parse_outcome(&pos.outcome), "{}", pos.description);
    }
}

#[test]
fn test_fixture_best_moves() {
    for pos in load_positions().positions {
        let board: Board = pos.board.parse().expect("Invalid board");
        let result = best_move(&board, pos.side);

        if pos.best_moves.is_empty() {
            assert_eq!(result, Err(MoveError::NoLegalMove), "{}", pos.description);
        } else {
            let index = result.unwrap_or_else(|e| panic!("{}: {}", pos.description, e));
            assert!(
                pos.best_moves.contains(&index),
                "{}: chose {}, expected one of {:?}",
                pos.description,
                index,
                pos.best_moves
            );
        }
    }
}

#[test]
fn test_fixture_scores() {
    for pos in load_positions().positions {
        let Some(expected) = pos.score else { continue };
        let board: Board = pos.board.parse().expect("Invalid board");

        let mut searcher = Searcher::new(SearchMode::AlphaBeta);
        let scores = searcher.move_scores(&board, pos.side).expect("Position has no moves");
        let best = scores.iter().map(|&(_, score)| score).max();
        assert_eq!(best, Some(expected), "{}", pos.description);

        // Every listed best move achieves the best score
        for &(index, score) in &scores {
            if pos.best_moves.contains(&index) {
                assert_eq!(score, expected, "{}: move {}", pos.description, index);
            }
        }
    }
}
