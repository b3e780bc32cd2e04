//! Iterative-deepening search driver.

pub mod control;
pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod see;
pub mod tt;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use aspira_core::{Move, Position, legal_moves};

use crate::config::EngineConfig;
use crate::eval::{Evaluator, EvaluatorKind};
use crate::time::SearchLimits;

use control::SearchControl;
use heuristics::Heuristics;
use negamax::{DRAW, MATE, MATE_BOUND, MAX_PLY, SearchContext};
use tt::TranspositionTable;

/// Deepest iteration the driver will start.
pub const MAX_DEPTH: u8 = (MAX_PLY - 8) as u8;

/// A score as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns from the side to move's point of view.
    Cp(i32),
    /// Moves to mate; negative when the side to move is being mated.
    Mate(i32),
}

impl Score {
    pub fn from_internal(score: i32) -> Score {
        if score >= MATE_BOUND {
            Score::Mate((MATE - score + 1) / 2)
        } else if score <= -MATE_BOUND {
            Score::Mate(-(MATE + score) / 2)
        } else {
            Score::Cp(score)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "cp {cp}"),
            Score::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

/// Progress report after each completed iteration.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u8,
    pub seldepth: usize,
    pub score: Score,
    pub nodes: u64,
    pub nps: u64,
    pub time: Duration,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// `None` only when the side to move has no legal move.
    pub best_move: Option<Move>,
    /// Second move in the PV, the expected reply.
    pub ponder: Option<Move>,
    pub pv: Vec<Move>,
    /// Side-to-move relative, in the internal mate convention.
    pub score: i32,
    /// Deepest fully completed iteration; 0 if none completed.
    pub depth: u8,
    pub seldepth: usize,
    pub nodes: u64,
    pub nps: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn score(&self) -> Score {
        Score::from_internal(self.score)
    }
}

/// Iterative-deepening searcher with its transposition table and ordering memory.
pub struct Searcher<E = EvaluatorKind> {
    evaluator: E,
    tt: TranspositionTable,
    heuristics: Box<Heuristics>,
    stop: Arc<AtomicBool>,
    last_nodes: u64,
    last_nps: u64,
}

impl Searcher<EvaluatorKind> {
    pub fn from_config(config: EngineConfig) -> Self {
        Searcher::new(config.evaluator, config.hash_mb)
    }
}

impl<E: Evaluator> Searcher<E> {
    pub fn new(evaluator: E, hash_mb: usize) -> Self {
        tracing::debug!(hash_mb, evaluator = evaluator.name(), "searcher created");
        Self {
            evaluator,
            tt: TranspositionTable::new(hash_mb),
            heuristics: Box::default(),
            stop: Arc::new(AtomicBool::new(false)),
            last_nodes: 0,
            last_nps: 0,
        }
    }

    /// Flag that makes a running search return as soon as it next polls.
    ///
    /// A stop raised before a search starts ends that search after its first poll.
    /// The flag is cleared when a search returns.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn set_evaluator(&mut self, evaluator: E) {
        tracing::debug!(evaluator = evaluator.name(), "evaluator replaced");
        self.evaluator = evaluator;
    }

    /// Nodes visited by the last search.
    pub fn last_nodes(&self) -> u64 {
        self.last_nodes
    }

    /// Nodes per second of the last search.
    pub fn last_nps(&self) -> u64 {
        self.last_nps
    }

    /// Forget everything learned in earlier searches (new game).
    pub fn flush(&mut self) {
        self.tt.clear();
        self.heuristics.clear();
    }

    pub fn resize_tt(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    pub fn hashfull(&self) -> u32 {
        self.tt.hashfull()
    }

    pub fn search(&mut self, pos: &mut Position, limits: &SearchLimits) -> SearchResult {
        self.search_with_info(pos, limits, |_| {})
    }

    /// Search `pos` within `limits`, reporting each completed iteration to `on_info`.
    ///
    /// The position is restored before returning. The returned move always comes
    /// from a completed iteration, or is the first legal move if none completed.
    pub fn search_with_info<F>(&mut self, pos: &mut Position, limits: &SearchLimits, mut on_info: F) -> SearchResult
    where
        F: FnMut(&SearchInfo),
    {
        let (soft, hard) = limits.allocate(pos.side_to_move());
        let control = SearchControl::new(Arc::clone(&self.stop), soft, hard, limits.nodes);
        let max_depth = limits.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH);
        tracing::debug!(?soft, ?hard, max_depth, nodes = ?limits.nodes, "search started");

        self.tt.new_search();
        self.heuristics.new_search();

        let root_moves = legal_moves(pos);
        let Some(&fallback) = root_moves.as_slice().first() else {
            self.stop.store(false, Ordering::Relaxed);
            self.last_nodes = 0;
            self.last_nps = 0;
            let score = if pos.is_in_check() { -MATE } else { DRAW };
            return SearchResult {
                best_move: None,
                ponder: None,
                pv: Vec::new(),
                score,
                depth: 0,
                seldepth: 0,
                nodes: 0,
                nps: 0,
                elapsed: control.elapsed(),
            };
        };

        let mut ctx = SearchContext::new(pos, &self.evaluator, &mut self.tt, &mut self.heuristics, &control);

        let mut completed_pv: Vec<Move> = Vec::new();
        let mut completed_score = DRAW;
        let mut completed_depth: u8 = 0;

        for depth in 1..=max_depth {
            if depth > 1 && control.should_stop_iterating() {
                break;
            }

            let Some(score) = ctx.aspiration(i32::from(depth), completed_score) else {
                tracing::debug!(depth, nodes = ctx.nodes, "iteration aborted");
                break;
            };

            let pv = ctx.pv.root_pv().to_vec();
            if pv.is_empty() {
                break;
            }
            completed_pv = pv;
            completed_score = score;
            completed_depth = depth;

            let elapsed = control.elapsed();
            let info = SearchInfo {
                depth,
                seldepth: ctx.seldepth,
                score: Score::from_internal(score),
                nodes: ctx.nodes,
                nps: nps(ctx.nodes, elapsed),
                time: elapsed,
                hashfull: ctx.tt.hashfull(),
                pv: completed_pv.clone(),
            };
            tracing::debug!(
                depth,
                score = %info.score,
                nodes = info.nodes,
                nps = info.nps,
                pv = %PvLine(&completed_pv),
                "iteration complete"
            );
            on_info(&info);

            // A forced move needs no deeper look when the clock matters.
            if root_moves.len() == 1 && soft.is_some() {
                break;
            }
        }

        let nodes = ctx.nodes;
        let seldepth = ctx.seldepth;
        drop(ctx);

        let elapsed = control.elapsed();
        self.last_nodes = nodes;
        self.last_nps = nps(nodes, elapsed);
        self.stop.store(false, Ordering::Relaxed);

        if completed_pv.is_empty() {
            tracing::debug!("no iteration completed, playing the first legal move");
            completed_pv.push(fallback);
        }

        SearchResult {
            best_move: completed_pv.first().copied(),
            ponder: completed_pv.get(1).copied(),
            pv: completed_pv,
            score: completed_score,
            depth: completed_depth,
            seldepth,
            nodes,
            nps: self.last_nps,
            elapsed,
        }
    }
}

impl<E> fmt::Debug for Searcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher")
            .field("tt", &self.tt)
            .field("last_nodes", &self.last_nodes)
            .finish_non_exhaustive()
    }
}

impl Default for Searcher<EvaluatorKind> {
    fn default() -> Self {
        Searcher::from_config(EngineConfig::default())
    }
}

fn nps(nodes: u64, elapsed: Duration) -> u64 {
    let micros = elapsed.as_micros().max(1);
    (u128::from(nodes) * 1_000_000 / micros) as u64
}

/// Space-separated UCI moves.
pub struct PvLine<'a>(pub &'a [Move]);

impl fmt::Display for PvLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores_report_moves() {
        assert_eq!(Score::from_internal(MATE - 1), Score::Mate(1));
        assert_eq!(Score::from_internal(MATE - 3), Score::Mate(2));
        assert_eq!(Score::from_internal(-(MATE - 2)), Score::Mate(-1));
        assert_eq!(Score::from_internal(-MATE), Score::Mate(0));
        assert_eq!(Score::from_internal(37), Score::Cp(37));
        assert_eq!(Score::Mate(-2).to_string(), "mate -2");
        assert_eq!(Score::Cp(-15).to_string(), "cp -15");
    }

    #[test]
    fn pv_line_formats_uci() {
        let pos = Position::startpos();
        let e4 = pos.parse_uci_move("e2e4").unwrap();
        let nf3 = pos.parse_uci_move("g1f3").unwrap();
        assert_eq!(PvLine(&[e4, nf3]).to_string(), "e2e4 g1f3");
        assert_eq!(PvLine(&[]).to_string(), "");
    }

    #[test]
    fn nps_never_divides_by_zero() {
        assert_eq!(nps(500, Duration::ZERO), 500_000_000);
        assert_eq!(nps(1_000, Duration::from_millis(500)), 2_000);
    }
}
