//! Exhaustive checks of the play engine against the solved game.

use anyhow::{bail, ensure, Context, Result};
use tracing::{debug, info};

use tictactoe_core::{best_move, Board, Outcome, SearchMode, Searcher, Side, CELLS};

use crate::checkpoint::Checkpoint;
use crate::solver::{terminal_value, Solver};

/// Perfect-play outcomes by board, from a live solve or a saved tablebase.
pub trait SolvedOutcomes {
    fn solved(&self, board: &Board) -> Option<i8>;
}

impl SolvedOutcomes for Solver {
    fn solved(&self, board: &Board) -> Option<i8> {
        self.outcome(board)
    }
}

impl SolvedOutcomes for Checkpoint {
    fn solved(&self, board: &Board) -> Option<i8> {
        self.lookup(board.canonical())
    }
}

/// Engine self-play from `board` with `side` to move.
fn self_play(mut board: Board, mut side: Side) -> Result<Outcome> {
    loop {
        let index = best_move(&board, side)?;
        let outcome = board.place(index, side)?;
        if outcome.is_terminal() {
            return Ok(outcome);
        }
        side = side.opponent();
    }
}

/// Self-play from the blank board and after each opening ends in a draw.
pub fn self_play_draws() -> Result<()> {
    let outcome = self_play(Board::new(), Side::X)?;
    ensure!(outcome == Outcome::Draw, "self-play from the blank board ended in {:?}", outcome);

    for opening in 0..CELLS {
        let mut board = Board::new();
        board.place(opening, Side::X)?;
        let outcome = self_play(board, Side::O)?;
        ensure!(
            outcome == Outcome::Draw,
            "self-play after opening {} ended in {:?}",
            opening,
            outcome
        );
    }
    info!("self-play draws from every opening");
    Ok(())
}

/// Play `engine` against every possible opponent sequence. Returns the number
/// of finished games; fails on the first loss.
pub fn engine_never_loses(engine: Side) -> Result<u64> {
    let games = explore(Board::new(), Side::X, engine)?;
    info!(%engine, games, "engine never loses");
    Ok(games)
}

fn explore(board: Board, to_move: Side, engine: Side) -> Result<u64> {
    if to_move == engine {
        let index = best_move(&board, engine)?;
        let (child, outcome) = board.apply_move(index, engine)?;
        return match outcome {
            Outcome::Ongoing => explore(child, engine.opponent(), engine),
            _ => Ok(1),
        };
    }

    let mut games = 0;
    for (_, child) in board.children(to_move) {
        match child.evaluate() {
            Outcome::Win(winner) => bail!("{} lost to {}:\n{}", engine, winner, child),
            Outcome::Draw => games += 1,
            Outcome::Ongoing => games += explore(child, engine, engine)?,
        }
    }
    Ok(games)
}

/// Alpha-beta and exhaustive search agree on the scores of every move.
pub fn alpha_beta_agrees(positions: &[Board]) -> Result<usize> {
    let mut full = Searcher::new(SearchMode::Exhaustive);
    let mut pruned = Searcher::new(SearchMode::AlphaBeta);
    let mut checked = 0;

    for board in positions {
        if board.evaluate().is_terminal() {
            continue;
        }
        let side = board.side_to_move().context("reachable board has a side to move")?;
        let expected = full.move_scores(board, side)?;
        let actual = pruned.move_scores(board, side)?;
        ensure!(expected == actual, "alpha-beta disagrees on\n{}", board);
        checked += 1;
    }

    info!(
        checked,
        exhaustive_nodes = full.nodes(),
        alpha_beta_nodes = pruned.nodes(),
        "alpha-beta agrees with exhaustive search"
    );
    Ok(checked)
}

/// The engine's chosen move keeps the solved outcome of every position.
pub fn engine_matches<T: SolvedOutcomes>(table: &T, positions: &[Board]) -> Result<usize> {
    let mut checked = 0;
    for board in positions {
        if board.evaluate().is_terminal() {
            continue;
        }
        let side = board.side_to_move().context("reachable board has a side to move")?;
        let expected = table.solved(board).context("position missing from the table")?;

        let index = best_move(board, side)?;
        let (child, outcome) = board.apply_move(index, side)?;
        let actual = match terminal_value(outcome) {
            Some(value) => value,
            None => table.solved(&child).context("child missing from the table")?,
        };
        ensure!(
            actual == expected,
            "engine move {} changes the outcome from {} to {} on\n{}",
            index,
            expected,
            actual,
            board
        );
        checked += 1;
    }
    info!(checked, "engine plays every position perfectly");
    Ok(checked)
}

/// Every tablebase entry agrees with a fresh full solve. A complete
/// tablebase must also hold every solved position; a partial one may not.
pub fn tablebase_matches(checkpoint: &Checkpoint, solver: &Solver) -> Result<()> {
    ensure!(
        checkpoint.partial || checkpoint.entries.len() == solver.table.len(),
        "tablebase has {} entries, solver {}",
        checkpoint.entries.len(),
        solver.table.len()
    );
    for &(canonical, outcome) in &checkpoint.entries {
        let solved = solver.table.get(&canonical).copied();
        ensure!(
            solved == Some(outcome),
            "entry {} is {} in the tablebase, {:?} when solved",
            canonical,
            outcome,
            solved
        );
    }
    debug!(
        entries = checkpoint.entries.len(),
        partial = checkpoint.partial,
        "tablebase verified"
    );
    Ok(())
}
