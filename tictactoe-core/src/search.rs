//! Minimax move selection.
//!
//! Scores are from the computer's point of view: a win found `depth` plies
//! below the root scores `10 - depth`, a loss `depth - 10`, a draw `0`, so
//! among equal results the engine prefers quick wins and slow losses.
//!
//! The search works on board values (each ply copies the 4-byte board), so
//! the caller's board is never touched.

use tracing::debug;

use crate::{Board, MoveError, Outcome, Side, CENTER};

/// Score of a win at the root; every ply of depth costs one point.
pub const WIN_SCORE: i32 = 10;

/// How the game tree is walked.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SearchMode {
    /// Visit every node.
    #[default]
    Exhaustive,
    /// Alpha-beta pruning. Same scores and moves, fewer nodes.
    AlphaBeta,
}

/// Minimax searcher that counts the nodes it visits.
#[derive(Clone, Debug, Default)]
pub struct Searcher {
    mode: SearchMode,
    nodes: u64,
}

impl Searcher {
    pub fn new(mode: SearchMode) -> Self {
        Self { mode, nodes: 0 }
    }

    /// Nodes visited since creation.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Pick the optimal cell for `ai` to mark.
    ///
    /// A blank board always gets the center. Otherwise every empty cell is
    /// scored and the highest wins, the lowest index breaking ties.
    pub fn best_move(&mut self, board: &Board, ai: Side) -> Result<usize, MoveError> {
        if board.is_blank() {
            return Ok(CENTER);
        }

        let start = self.nodes;
        let human = ai.opponent();
        let mut best: Option<(usize, i32)> = None;

        for (index, child) in board.children(ai) {
            let score = self.score(&child, 0, false, ai, human);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        let (index, score) = best.ok_or(MoveError::NoLegalMove)?;
        debug!(
            %ai,
            index,
            score,
            nodes = self.nodes - start,
            mode = ?self.mode,
            "search chose move"
        );
        Ok(index)
    }

    /// Score every legal move for `ai`, in ascending index order.
    ///
    /// Unlike `best_move` there is no opening shortcut.
    pub fn move_scores(&mut self, board: &Board, ai: Side) -> Result<Vec<(usize, i32)>, MoveError> {
        let human = ai.opponent();
        let scores: Vec<(usize, i32)> = board
            .children(ai)
            .map(|(index, child)| (index, self.score(&child, 0, false, ai, human)))
            .collect();

        if scores.is_empty() {
            return Err(MoveError::NoLegalMove);
        }
        Ok(scores)
    }

    /// Minimax value of `board`, reached `depth` plies below the root.
    ///
    /// `maximizing` is true when `ai` is the side to place next.
    pub fn score(&mut self, board: &Board, depth: i32, maximizing: bool, ai: Side, human: Side) -> i32 {
        match self.mode {
            SearchMode::Exhaustive => self.minimax(board, depth, maximizing, ai, human),
            SearchMode::AlphaBeta => {
                self.alpha_beta(board, depth, maximizing, ai, human, i32::MIN, i32::MAX)
            }
        }
    }

    fn minimax(&mut self, board: &Board, depth: i32, maximizing: bool, ai: Side, human: Side) -> i32 {
        self.nodes += 1;
        if let Some(score) = terminal_score(board, depth, ai) {
            return score;
        }

        let mover = if maximizing { ai } else { human };
        let values = board
            .children(mover)
            .map(|(_, child)| self.minimax(&child, depth + 1, !maximizing, ai, human));

        let best = if maximizing { values.max() } else { values.min() };
        // An ongoing board always has an empty cell
        best.unwrap_or(0)
    }

    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &mut self,
        board: &Board,
        depth: i32,
        maximizing: bool,
        ai: Side,
        human: Side,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        self.nodes += 1;
        if let Some(score) = terminal_score(board, depth, ai) {
            return score;
        }

        if maximizing {
            let mut best = i32::MIN;
            for (_, child) in board.children(ai) {
                let value = self.alpha_beta(&child, depth + 1, false, ai, human, alpha, beta);
                best = best.max(value);
                alpha = alpha.max(value);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = i32::MAX;
            for (_, child) in board.children(human) {
                let value = self.alpha_beta(&child, depth + 1, true, ai, human, alpha, beta);
                best = best.min(value);
                beta = beta.min(value);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }
}

/// Score of a finished board, or `None` while play continues.
#[inline]
fn terminal_score(board: &Board, depth: i32, ai: Side) -> Option<i32> {
    match board.evaluate() {
        Outcome::Win(side) if side == ai => Some(WIN_SCORE - depth),
        Outcome::Win(_) => Some(depth - WIN_SCORE),
        Outcome::Draw => Some(0),
        Outcome::Ongoing => None,
    }
}

/// Pick the optimal cell for `ai` with an exhaustive search.
pub fn best_move(board: &Board, ai: Side) -> Result<usize, MoveError> {
    Searcher::default().best_move(board, ai)
}

/// Exhaustive minimax value of `board`; see [`Searcher::score`].
pub fn score(board: &Board, depth: i32, maximizing: bool, ai: Side, human: Side) -> i32 {
    Searcher::default().score(board, depth, maximizing, ai, human)
}
