//! Full game-tree census, without merging transpositions.

use tictactoe_core::{Board, Outcome, Side};

/// Counts gathered over every move sequence from a position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeCounts {
    /// Every board in the tree, root included
    pub nodes: u64,
    /// Finished games (terminal leaves)
    pub games: u64,
    pub x_wins: u64,
    pub o_wins: u64,
    pub draws: u64,
}

impl TreeCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win(Side::X) => self.x_wins += 1,
            Outcome::Win(Side::O) => self.o_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Ongoing => return,
        }
        self.games += 1;
    }
}

/// Walk every line of play from `board` with `side` to move.
pub fn count_tree(board: Board, side: Side) -> TreeCounts {
    let mut counts = TreeCounts::default();
    walk(board, side, &mut counts);
    counts
}

fn walk(board: Board, side: Side, counts: &mut TreeCounts) {
    counts.nodes += 1;
    let outcome = board.evaluate();
    if outcome.is_terminal() {
        counts.record(outcome);
        return;
    }
    for (_, child) in board.children(side) {
        walk(child, side.opponent(), counts);
    }
}
