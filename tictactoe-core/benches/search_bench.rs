use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion, SamplingMode};
use tictactoe_core::{Board, SearchMode, Searcher, Side};

/// Hardest reply for the engine: O answering a corner opening.
fn after_corner_opening() -> Board {
    let mut board = Board::new();
    board.place(0, Side::X).expect("blank board accepts a corner");
    board
}

fn bench_best_move(board: &Board, side: Side, mode: SearchMode) -> usize {
    Searcher::new(mode)
        .best_move(board, side)
        .expect("ongoing board has a move")
}

fn bench_full_game(mode: SearchMode) {
    let mut board = Board::new();
    let mut side = Side::X;
    let mut searcher = Searcher::new(mode);
    loop {
        let Ok(index) = searcher.best_move(&board, side) else { break };
        match board.place(index, side) {
            Ok(outcome) if !outcome.is_terminal() => side = side.opponent(),
            _ => break,
        }
    }
}

fn search_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    group
        .sampling_mode(SamplingMode::Flat)
        .sample_size(10)
        .measurement_time(Duration::from_secs(20));

    let board = after_corner_opening();

    group.bench_function("reply_to_corner_exhaustive", |b| {
        b.iter(|| bench_best_move(black_box(&board), Side::O, SearchMode::Exhaustive))
    });

    group.bench_function("reply_to_corner_alpha_beta", |b| {
        b.iter(|| bench_best_move(black_box(&board), Side::O, SearchMode::AlphaBeta))
    });

    group.bench_function("self_play_exhaustive", |b| {
        b.iter(|| bench_full_game(SearchMode::Exhaustive))
    });

    group.bench_function("self_play_alpha_beta", |b| {
        b.iter(|| bench_full_game(SearchMode::AlphaBeta))
    });

    group.finish();
}

criterion_group!(benches, search_bench);
criterion_main!(benches);
