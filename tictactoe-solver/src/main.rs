//! Tic-tac-toe Solver
//!
//! Offline companion to the play engine: counts the game tree, solves every
//! position into a tablebase, and verifies the engine against it.

mod checkpoint;
mod solver;
mod stats;
mod tree;
mod verify;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tictactoe_core::{Board, Side};

use crate::checkpoint::Checkpoint;
use crate::solver::{reachable_positions, Solver, DRAW, WIN_X};

#[derive(Parser, Debug)]
#[command(name = "solver", about = "Solve and verify tic-tac-toe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the full game tree and report node and game counts
    Count,
    /// Solve every reachable position and write the tablebase
    Solve {
        #[arg(long, default_value = "data/tablebase.bin")]
        out: PathBuf,
        /// Stop exploring a position once its side to move has a win
        #[arg(long)]
        prune: bool,
    },
    /// Check the engine exhaustively, optionally against a saved tablebase
    Verify {
        #[arg(long)]
        tablebase: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Count => count(),
        Command::Solve { out, prune } => solve(out, prune),
        Command::Verify { tablebase } => verify(tablebase),
    }
}

fn count() -> Result<()> {
    let start = Instant::now();
    let counts = tree::count_tree(Board::new(), Side::X);
    info!(
        nodes = counts.nodes,
        games = counts.games,
        x_wins = counts.x_wins,
        o_wins = counts.o_wins,
        draws = counts.draws,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "game tree counted"
    );
    Ok(())
}

fn solve(out: PathBuf, prune: bool) -> Result<()> {
    let mut solver = Solver::new();
    let outcome = solver
        .solve(Board::new(), prune)
        .context("blank board has no side to move")?;
    solver.stats.log_summary(solver.table.len());

    match outcome {
        WIN_X => info!("X wins with optimal play"),
        DRAW => info!("Game is a draw with optimal play"),
        _ => info!("O wins with optimal play"),
    }

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let count = Checkpoint::save(&out, &solver.table, prune)
        .with_context(|| format!("writing {}", out.display()))?;
    info!(
        path = %out.display(),
        entries = count,
        bytes = Checkpoint::estimate_size(count),
        partial = prune,
        "tablebase saved"
    );
    Ok(())
}

fn verify(tablebase: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();
    let positions = reachable_positions();
    info!(positions = positions.len(), "enumerated reachable positions");

    let mut solver = Solver::new();
    solver.solve(Board::new(), false);

    verify::self_play_draws()?;
    verify::engine_never_loses(Side::X)?;
    verify::engine_never_loses(Side::O)?;
    verify::alpha_beta_agrees(&positions)?;
    verify::engine_matches(&solver, &positions)?;

    if let Some(path) = tablebase {
        let checkpoint =
            Checkpoint::load(&path).with_context(|| format!("loading {}", path.display()))?;
        verify::tablebase_matches(&checkpoint, &solver)?;
        info!(
            path = %path.display(),
            entries = checkpoint.entries.len(),
            partial = checkpoint.partial,
            "tablebase matches a fresh solve"
        );
        if checkpoint.partial {
            info!("partial tablebase, skipping engine check against the file");
        } else {
            verify::engine_matches(&checkpoint, &positions)?;
        }
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "all checks passed");
    Ok(())
}
