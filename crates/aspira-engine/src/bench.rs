//! Fixed-depth benchmark over a built-in set of positions.
//!
//! Each position is searched from a flushed table and history, so the node
//! total is the same on every run of a given build.

use std::fmt;
use std::time::{Duration, Instant};

use aspira_core::{FenError, Position};

use crate::eval::Evaluator;
use crate::search::Searcher;
use crate::time::SearchLimits;

/// Depth used when none is requested.
pub const BENCH_DEPTH: u8 = 6;

pub const BENCH_POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "r1bq1rk1/pp2bppp/2n1pn2/3p4/2PP4/2N1PN2/PP3PPP/R2QKB1R w KQ - 0 8",
    "6k1/5pp1/4p2p/8/3P4/4P3/5PPP/2R3K1 w - - 0 30",
    "8/8/4k3/3p4/3P4/4K3/8/8 w - - 0 50",
];

/// Totals from one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchReport {
    pub positions: usize,
    pub nodes: u64,
    /// Mean of the per-position speeds.
    pub nps: u64,
    pub elapsed: Duration,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} nodes {} nps", self.nodes, self.nps)
    }
}

/// Search every built-in position to `depth`.
pub fn run_bench<E: Evaluator>(searcher: &mut Searcher<E>, depth: u8) -> Result<BenchReport, FenError> {
    run_bench_on(searcher, BENCH_POSITIONS, depth)
}

/// Search each of `fens` to `depth`, flushing the searcher before every one.
pub fn run_bench_on<E: Evaluator>(
    searcher: &mut Searcher<E>,
    fens: &[&str],
    depth: u8,
) -> Result<BenchReport, FenError> {
    let limits = SearchLimits::fixed_depth(depth);
    let start = Instant::now();
    let mut nodes = 0u64;
    let mut nps_sum = 0u64;

    for fen in fens {
        let mut pos = Position::from_fen(fen)?;
        searcher.flush();
        let result = searcher.search(&mut pos, &limits);
        tracing::debug!(fen, depth = result.depth, nodes = result.nodes, "bench position done");
        nodes += result.nodes;
        nps_sum += result.nps;
    }

    let positions = fens.len();
    let report = BenchReport {
        positions,
        nodes,
        nps: nps_sum / positions.max(1) as u64,
        elapsed: start.elapsed(),
    };
    tracing::info!(positions, nodes, nps = report.nps, elapsed = ?report.elapsed, "bench finished");
    Ok(report)
}
