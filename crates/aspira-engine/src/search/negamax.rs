//! Principal variation search with null-move pruning, late-move reductions and
//! a quiescence search at the horizon.
//!
//! Scores are side-to-move relative. A side that is mated at `ply` scores
//! `-MATE + ply`, so shorter mates always sort first.

use aspira_core::{Move, MoveList, Position, capture_moves, legal_moves};

use crate::eval::{Evaluator, relative};
use crate::search::control::SearchControl;
use crate::search::heuristics::Heuristics;
use crate::search::ordering::{MovePicker, NodeContext, lmr_reduction};
use crate::search::see::{see_ge, see_value};
use crate::search::tt::{Bound, TranspositionTable};

/// Score bound wider than any reachable score.
pub const INF: i32 = 32_001;

/// Score of delivering mate at the root; mate at ply `n` scores `MATE - n`.
pub const MATE: i32 = 32_000;

/// Scores at or beyond this magnitude are forced mates.
pub const MATE_BOUND: i32 = MATE - MAX_PLY as i32;

pub const DRAW: i32 = 0;

/// Maximum search depth (in plies) for array sizing and recursion limits.
pub const MAX_PLY: usize = 128;

/// Qsearch skips a capture that cannot lift the score to alpha even with this margin.
const DELTA_MARGIN: i32 = 200;

/// Half-width of the first aspiration window.
const ASPIRATION_DELTA: i32 = 25;

/// Beyond this the aspiration window is abandoned for a full one.
const ASPIRATION_MAX: i32 = 1_000;

/// Quiet moves searched at full depth before reductions apply.
const LMR_MIN_MOVES: usize = 3;

/// Triangular PV table for collecting principal variation lines.
pub struct PvTable {
    moves: [[Move; MAX_PLY]; MAX_PLY],
    len: [usize; MAX_PLY],
}

impl PvTable {
    pub fn new() -> Self {
        Self {
            moves: [[Move::NULL; MAX_PLY]; MAX_PLY],
            len: [0; MAX_PLY],
        }
    }

    /// Clear the PV line at `ply` (called at the top of each node).
    pub fn clear_ply(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.len[ply] = 0;
        }
    }

    /// Make `mv` followed by the line at `ply + 1` the line at `ply`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        self.moves[ply][0] = mv;

        let child = ply + 1;
        if child < MAX_PLY {
            let copy_len = self.len[child].min(MAX_PLY - 1);
            let (top, bottom) = self.moves.split_at_mut(child);
            top[ply][1..1 + copy_len].copy_from_slice(&bottom[0][..copy_len]);
            self.len[ply] = 1 + copy_len;
        } else {
            self.len[ply] = 1;
        }
    }

    /// The principal variation from the root.
    pub fn root_pv(&self) -> &[Move] {
        &self.moves[0][..self.len[0]]
    }
}

impl Default for PvTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Search state threaded through the recursion.
///
/// Borrowed from the [`Searcher`](super::Searcher) for one iteration; the
/// position is made and unmade in place and is back at the root on return.
pub(super) struct SearchContext<'a, E: ?Sized> {
    pub pos: &'a mut Position,
    pub evaluator: &'a E,
    pub tt: &'a mut TranspositionTable,
    pub heuristics: &'a mut Heuristics,
    pub control: &'a SearchControl,
    pub pv: Box<PvTable>,
    pub nodes: u64,
    pub seldepth: usize,
    /// Latched once the control says stop; every frame then unwinds.
    pub stopped: bool,
}

impl<'a, E: Evaluator + ?Sized> SearchContext<'a, E> {
    pub fn new(
        pos: &'a mut Position,
        evaluator: &'a E,
        tt: &'a mut TranspositionTable,
        heuristics: &'a mut Heuristics,
        control: &'a SearchControl,
    ) -> Self {
        Self {
            pos,
            evaluator,
            tt,
            heuristics,
            control,
            pv: Box::default(),
            nodes: 0,
            seldepth: 0,
            stopped: false,
        }
    }

    #[inline]
    fn poll_stop(&mut self) -> bool {
        if !self.stopped && self.control.should_stop(self.nodes) {
            self.stopped = true;
        }
        self.stopped
    }

    #[inline]
    fn static_eval(&self) -> i32 {
        relative(self.evaluator, &*self.pos)
    }

    /// One iteration at `depth` with an aspiration window around `prev`.
    ///
    /// `None` if the search was stopped before the iteration finished.
    pub fn aspiration(&mut self, depth: i32, prev: i32) -> Option<i32> {
        let mut delta = ASPIRATION_DELTA;
        let (mut alpha, mut beta) = if depth >= 4 && prev.abs() < MATE_BOUND {
            (prev - delta, prev + delta)
        } else {
            (-INF, INF)
        };

        loop {
            let score = self.negamax(depth, 0, alpha, beta, Move::NULL, true);
            if self.stopped {
                return None;
            }

            if score <= alpha {
                tracing::trace!(depth, score, alpha, "aspiration fail low");
                alpha = (score - delta).max(-INF);
            } else if score >= beta {
                tracing::trace!(depth, score, beta, "aspiration fail high");
                beta = (score + delta).min(INF);
            } else {
                return Some(score);
            }

            delta *= 2;
            if delta > ASPIRATION_MAX || score.abs() >= MATE_BOUND {
                alpha = -INF;
                beta = INF;
            }
        }
    }

    /// Fail-soft negamax. `prev` is the move that led here, `Move::NULL` after a
    /// null move or at the root.
    ///
    /// Returns a score within `(alpha, beta)` when exact, otherwise a bound on the
    /// true score. `null_ok` is false directly below a null move so two nulls
    /// never follow each other. After a stop the return value is meaningless and
    /// the caller must check `stopped`.
    pub fn negamax(&mut self, depth: i32, ply: usize, mut alpha: i32, mut beta: i32, prev: Move, null_ok: bool) -> i32 {
        self.pv.clear_ply(ply);
        if self.poll_stop() {
            return 0;
        }

        let root = ply == 0;
        if !root {
            // Fifty-move and repetition draws
            if self.pos.is_fifty_move_draw() || self.pos.is_threefold_repetition() {
                return DRAW;
            }
            if ply >= MAX_PLY - 1 {
                return self.static_eval();
            }
            // Mate distance pruning: no line from here beats a mate already found nearer the root.
            alpha = alpha.max(-MATE + ply as i32);
            beta = beta.min(MATE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        // Horizon
        if depth <= 0 {
            return self.qsearch(ply, alpha, beta);
        }

        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        let pv_node = beta - alpha > 1;
        let key = self.pos.key();

        // Transposition table cutoff; the stored move is tried first either way.
        let mut tt_move = Move::NULL;
        if let Some(hit) = self.tt.lookup(key, ply) {
            tt_move = hit.mv;
            if !root && i32::from(hit.depth) >= depth {
                match hit.bound {
                    Bound::Exact => return hit.score,
                    Bound::Lower => alpha = alpha.max(hit.score),
                    Bound::Upper => beta = beta.min(hit.score),
                    Bound::None => {}
                }
                if alpha >= beta {
                    return hit.score;
                }
            }
        }
        let alpha_orig = alpha;

        let us = self.pos.side_to_move();
        let in_check = self.pos.is_in_check();

        // Null-move pruning
        if null_ok
            && !pv_node
            && !in_check
            && depth >= 3
            && beta.abs() < MATE_BOUND
            && self.pos.has_non_pawn_material(us)
            && self.static_eval() >= beta
        {
            let r = 3 + depth / 4;
            let undo = self.pos.make_null_move();
            let score = -self.negamax(depth - 1 - r, ply + 1, -beta, -beta + 1, Move::NULL, false);
            self.pos.undo_null_move(undo);
            if self.stopped {
                return 0;
            }
            if score >= beta {
                // Unproven mates from a null-move search are not trusted.
                return if score >= MATE_BOUND { beta } else { score };
            }
        }

        // Checkmate or stalemate
        let moves = legal_moves(&*self.pos);
        if moves.is_empty() {
            return if in_check { -MATE + ply as i32 } else { DRAW };
        }

        let node = NodeContext {
            tt_move,
            killers: self.heuristics.killers.get(ply),
            counter: self.heuristics.counters.get(!us, prev),
            heuristics: &*self.heuristics,
        };
        let mut picker = MovePicker::new(moves, &*self.pos, &node);

        let mut best_score = -INF;
        let mut best_move = Move::NULL;
        let mut quiets_tried = MoveList::new();

        while let Some(mv) = picker.pick_next() {
            let index = picker.yielded() - 1;
            let quiet = mv.is_quiet();

            let undo = self.pos.make_move(mv);
            let gives_check = self.pos.is_in_check();
            // Check extension
            let new_depth = depth - 1 + i32::from(gives_check);

            // PVS: full window for the first move, null window with late-move
            // reductions for the rest.
            let score = if index == 0 {
                -self.negamax(new_depth, ply + 1, -beta, -alpha, mv, true)
            } else {
                let mut reduction = 0;
                if depth >= 3 && index >= LMR_MIN_MOVES && quiet && !in_check && !gives_check {
                    reduction = lmr_reduction(depth, index) - i32::from(pv_node);
                    reduction = reduction.clamp(0, new_depth - 1);
                }
                let mut score = -self.negamax(new_depth - reduction, ply + 1, -alpha - 1, -alpha, mv, true);
                if score > alpha && reduction > 0 {
                    score = -self.negamax(new_depth, ply + 1, -alpha - 1, -alpha, mv, true);
                }
                if score > alpha && score < beta {
                    score = -self.negamax(new_depth, ply + 1, -beta, -alpha, mv, true);
                }
                score
            };

            self.pos.undo_move(undo);
            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    alpha = score;
                    self.pv.update(ply, mv);
                    if alpha >= beta {
                        if quiet {
                            self.reward_quiet(ply, depth, prev, mv, &quiets_tried);
                        }
                        break;
                    }
                }
            }
            if quiet {
                quiets_tried.push(mv);
            }
        }

        // Store in transposition table
        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > alpha_orig {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.store(key, best_move, best_score, depth.clamp(0, 255) as u8, bound, ply);

        best_score
    }

    /// Quiet move `mv` caused a cutoff: remember it as killer and counter move
    /// and shift history towards it and away from the quiets tried before it.
    fn reward_quiet(&mut self, ply: usize, depth: i32, prev: Move, mv: Move, tried: &MoveList) {
        let us = self.pos.side_to_move();
        let heuristics = &mut *self.heuristics;
        heuristics.killers.store(ply, mv);
        heuristics.counters.store(!us, prev, mv);
        heuristics.history.reward(us, mv, depth);
        for &other in tried {
            heuristics.history.penalize(us, other, depth);
        }
    }

    /// Quiescence search: captures only, or every evasion when in check.
    ///
    /// The static eval stands in for the score when no capture improves on it.
    /// Captures that lose material by SEE, or that cannot reach alpha even with
    /// [`DELTA_MARGIN`] to spare, are skipped.
    pub fn qsearch(&mut self, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        if self.poll_stop() {
            return 0;
        }
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        if ply >= MAX_PLY - 1 {
            return self.static_eval();
        }

        if self.pos.is_in_check() {
            return self.qsearch_evasions(ply, alpha, beta);
        }

        // Stand pat
        let stand_pat = self.static_eval();
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        let mut best_score = stand_pat;
        let mut picker = MovePicker::tactical(capture_moves(&*self.pos));
        while let Some(mv) = picker.pick_next() {
            // Delta pruning
            if !mv.is_promotion() {
                let gain = mv.captured().map_or(0, see_value);
                if stand_pat + gain + DELTA_MARGIN <= alpha {
                    continue;
                }
            }
            if !see_ge(&*self.pos, mv, 0) {
                continue;
            }

            let undo = self.pos.make_move(mv);
            let score = -self.qsearch(ply + 1, -beta, -alpha);
            self.pos.undo_move(undo);
            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        best_score
    }

    /// No stand-pat in check: every legal reply is searched.
    fn qsearch_evasions(&mut self, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        let moves = legal_moves(&*self.pos);
        if moves.is_empty() {
            return -MATE + ply as i32;
        }

        let node = NodeContext {
            tt_move: Move::NULL,
            killers: self.heuristics.killers.get(ply),
            counter: Move::NULL,
            heuristics: &*self.heuristics,
        };
        let mut picker = MovePicker::new(moves, &*self.pos, &node);

        let mut best_score = -INF;
        while let Some(mv) = picker.pick_next() {
            let undo = self.pos.make_move(mv);
            let score = -self.qsearch(ply + 1, -beta, -alpha);
            self.pos.undo_move(undo);
            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        best_score
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::eval::Classic;

    struct Fixture {
        tt: TranspositionTable,
        heuristics: Heuristics,
        control: SearchControl,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tt: TranspositionTable::new(1),
                heuristics: Heuristics::default(),
                control: SearchControl::new_infinite(Arc::new(AtomicBool::new(false))),
            }
        }

        fn run<R>(&mut self, fen: &str, f: impl FnOnce(&mut SearchContext<'_, Classic>) -> R) -> R {
            let mut pos: Position = fen.parse().unwrap();
            let mut ctx = SearchContext::new(&mut pos, &Classic, &mut self.tt, &mut self.heuristics, &self.control);
            f(&mut ctx)
        }
    }

    #[test]
    fn pv_update_copies_child_line() {
        let mut pv = PvTable::new();
        let a = Move::from_raw(0x10);
        let b = Move::from_raw(0x20);
        let c = Move::from_raw(0x30);
        pv.update(2, c);
        pv.update(1, b);
        pv.update(0, a);
        assert_eq!(pv.root_pv(), &[a, b, c]);
        pv.clear_ply(0);
        assert!(pv.root_pv().is_empty());
    }

    #[test]
    fn qsearch_stands_pat_when_captures_lose() {
        // Qxd5 drops the queen to the e6 pawn; standing pat keeps the material edge.
        let fen = "4k3/8/4p3/3p4/8/8/3Q4/4K3 w - - 0 1";
        let mut fx = Fixture::new();
        let (q, stand) = fx.run(fen, |ctx| (ctx.qsearch(0, -INF, INF), ctx.static_eval()));
        assert_eq!(q, stand);
    }

    #[test]
    fn qsearch_takes_hanging_material() {
        let fen = "4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 1";
        let mut fx = Fixture::new();
        let (q, stand) = fx.run(fen, |ctx| (ctx.qsearch(0, -INF, INF), ctx.static_eval()));
        assert!(q > stand + 400, "qsearch {q} should win the rook over {stand}");
    }

    #[test]
    fn qsearch_in_check_sees_mate() {
        // Black is mated by the rook; no stand-pat is allowed in check.
        let fen = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";
        let mut fx = Fixture::new();
        let score = fx.run(fen, |ctx| ctx.qsearch(3, -INF, INF));
        assert_eq!(score, -MATE + 3);
    }

    #[test]
    fn negamax_scores_checkmate_and_stalemate() {
        let mut fx = Fixture::new();
        let mated = fx.run("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", |ctx| ctx.negamax(2, 0, -INF, INF, Move::NULL, true));
        assert_eq!(mated, -MATE);
        let stalemate = fx.run("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", |ctx| ctx.negamax(2, 0, -INF, INF, Move::NULL, true));
        assert_eq!(stalemate, DRAW);
    }

    #[test]
    fn aspiration_finds_mate_in_one() {
        let mut fx = Fixture::new();
        let (score, pv) = fx.run("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", |ctx| {
            let score = ctx.aspiration(4, 0);
            (score, ctx.pv.root_pv().to_vec())
        });
        assert_eq!(score, Some(MATE - 1));
        assert_eq!(pv.len(), 1);
        assert_eq!(pv[0].to_uci(), "a1a8");
    }

    #[test]
    fn stopped_search_reports_no_iteration() {
        let mut fx = Fixture::new();
        fx.control.stop_flag().store(true, std::sync::atomic::Ordering::Relaxed);
        let score = fx.run(aspira_core::STARTING_FEN, |ctx| ctx.aspiration(3, 0));
        assert_eq!(score, None);
    }
}
