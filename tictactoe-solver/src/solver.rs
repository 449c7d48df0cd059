//! Iterative minimax solver over canonical positions.
//!
//! Every position is stored once per symmetry class, keyed by
//! [`Board::canonical`]. Values are from X's point of view.

use std::collections::{HashMap, HashSet, VecDeque};

use tictactoe_core::{Board, Cell, Outcome, Side, CELLS};

use crate::stats::SolverStats;

/// Outcome values
pub const WIN_X: i8 = 1;
pub const DRAW: i8 = 0;
pub const WIN_O: i8 = -1;

/// Value of a finished board, `None` while play continues.
pub fn terminal_value(outcome: Outcome) -> Option<i8> {
    match outcome {
        Outcome::Win(Side::X) => Some(WIN_X),
        Outcome::Win(Side::O) => Some(WIN_O),
        Outcome::Draw => Some(DRAW),
        Outcome::Ongoing => None,
    }
}

/// Best value `side` can hope for.
#[inline]
fn best_for(side: Side) -> i8 {
    match side {
        Side::X => WIN_X,
        Side::O => WIN_O,
    }
}

/// Stack frame for iterative minimax.
struct Frame {
    board: Board,
    canonical: u32,
    /// Side placing the next mark
    side: Side,
    /// Next cell to try
    cursor: usize,
    /// Best outcome found so far
    best: i8,
}

impl Frame {
    fn new(board: Board, canonical: u32, side: Side) -> Self {
        Self {
            board,
            canonical,
            side,
            cursor: 0,
            best: best_for(side.opponent()),
        }
    }

    /// The board after the next legal move, in index order.
    fn next_child(&mut self) -> Option<Board> {
        while self.cursor < CELLS {
            let index = self.cursor;
            self.cursor += 1;
            if let Ok((child, _)) = self.board.apply_move(index, self.side) {
                return Some(child);
            }
        }
        None
    }

    fn remaining_moves(&self) -> u64 {
        (self.cursor..CELLS)
            .filter(|&i| self.board.cell(i) == Some(Cell::Empty))
            .count() as u64
    }

    #[inline]
    fn update(&mut self, child: i8) {
        self.best = match self.side {
            Side::X => self.best.max(child),
            Side::O => self.best.min(child),
        };
    }
}

/// Minimax solver with transposition table.
pub struct Solver {
    /// Transposition table: canonical position -> outcome
    pub table: HashMap<u32, i8>,
    /// Solver statistics
    pub stats: SolverStats,
}

impl Solver {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            stats: SolverStats::new(),
        }
    }

    /// Solve `board` under perfect play.
    ///
    /// With `prune` a position stops exploring once its side to move has
    /// found a win; values stay exact but fewer positions land in the table.
    /// Returns `None` if the mark counts admit no side to move.
    pub fn solve(&mut self, board: Board, prune: bool) -> Option<i8> {
        let root = board.canonical();
        if let Some(&outcome) = self.table.get(&root) {
            return Some(outcome);
        }
        if let Some(outcome) = terminal_value(board.evaluate()) {
            self.table.insert(root, outcome);
            self.stats.record_terminal(outcome);
            return Some(outcome);
        }

        let mut stack: Vec<Frame> = Vec::with_capacity(CELLS + 1);
        stack.push(Frame::new(board, root, board.side_to_move()?));

        while let Some(frame) = stack.last_mut() {
            if prune && frame.best == best_for(frame.side) {
                self.stats.branches_pruned += frame.remaining_moves();
                frame.cursor = CELLS;
            }

            if let Some(child) = frame.next_child() {
                let canonical = child.canonical();

                if let Some(&outcome) = self.table.get(&canonical) {
                    self.stats.cache_hits += 1;
                    frame.update(outcome);
                    continue;
                }

                if let Some(outcome) = terminal_value(child.evaluate()) {
                    self.table.insert(canonical, outcome);
                    self.stats.record_terminal(outcome);
                    frame.update(outcome);
                    continue;
                }

                let side = frame.side.opponent();
                stack.push(Frame::new(child, canonical, side));
                self.stats.max_depth = self.stats.max_depth.max(stack.len() as u64);
            } else {
                // No more moves - pop frame and record outcome
                let Some(done) = stack.pop() else { break };
                self.table.insert(done.canonical, done.best);
                self.stats.positions_evaluated += 1;

                if let Some(parent) = stack.last_mut() {
                    parent.update(done.best);
                }
            }
        }

        self.table.get(&root).copied()
    }

    /// Look up a solved position by any of its symmetric forms.
    pub fn outcome(&self, board: &Board) -> Option<i8> {
        self.table.get(&board.canonical()).copied()
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

/// Every board reachable from the blank board by alternating play,
/// terminal positions included, sorted by encoding.
pub fn reachable_positions() -> Vec<Board> {
    let mut seen: HashSet<Board> = HashSet::new();
    let mut queue = VecDeque::from([Board::new()]);
    seen.insert(Board::new());

    while let Some(board) = queue.pop_front() {
        if board.evaluate().is_terminal() {
            continue;
        }
        let Some(side) = board.side_to_move() else { continue };
        for (_, child) in board.children(side) {
            if seen.insert(child) {
                queue.push_back(child);
            }
        }
    }

    let mut positions: Vec<Board> = seen.into_iter().collect();
    positions.sort_unstable_by_key(|board| board.to_bits());
    positions
}
