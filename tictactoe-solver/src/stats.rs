//! Solver statistics tracking.

use std::time::Instant;

use tracing::info;

use crate::solver::{WIN_O, WIN_X};

/// Statistics collected during solving.
#[derive(Debug, Clone)]
pub struct SolverStats {
    /// Positions where we computed the outcome by examining children
    pub positions_evaluated: u64,

    /// Cache hits (position already in transposition table)
    pub cache_hits: u64,

    /// Terminal positions (a line completed or the board filled)
    pub terminal_positions: u64,

    /// Maximum stack depth reached
    pub max_depth: u64,

    /// Moves skipped once the side to move had found a win
    pub branches_pruned: u64,

    /// Breakdown of terminal outcomes
    pub x_wins: u64,
    pub o_wins: u64,
    pub draws: u64,

    start_time: Instant,
}

impl SolverStats {
    pub fn new() -> Self {
        Self {
            positions_evaluated: 0,
            cache_hits: 0,
            terminal_positions: 0,
            max_depth: 0,
            branches_pruned: 0,
            x_wins: 0,
            o_wins: 0,
            draws: 0,
            start_time: Instant::now(),
        }
    }

    /// Record a terminal position outcome
    pub fn record_terminal(&mut self, outcome: i8) {
        self.terminal_positions += 1;
        match outcome {
            WIN_X => self.x_wins += 1,
            WIN_O => self.o_wins += 1,
            _ => self.draws += 1,
        }
    }

    pub fn positions_per_sec(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.positions_evaluated as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Emit the final summary as one structured event
    pub fn log_summary(&self, table_size: usize) {
        info!(
            positions_evaluated = self.positions_evaluated,
            unique = table_size,
            cache_hits = self.cache_hits,
            terminals = self.terminal_positions,
            x_wins = self.x_wins,
            o_wins = self.o_wins,
            draws = self.draws,
            max_depth = self.max_depth,
            pruned = self.branches_pruned,
            positions_per_sec = self.positions_per_sec() as u64,
            "solve finished"
        );
    }
}

impl Default for SolverStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::DRAW;

    #[test]
    fn test_record_terminal() {
        let mut stats = SolverStats::new();
        stats.record_terminal(WIN_X);
        stats.record_terminal(WIN_O);
        stats.record_terminal(DRAW);
        stats.record_terminal(DRAW);
        assert_eq!(stats.terminal_positions, 4);
        assert_eq!((stats.x_wins, stats.o_wins, stats.draws), (1, 1, 2));
    }
}
