//! Move ordering: TT move, SEE-classified captures, killers, counter move, history.

use std::sync::OnceLock;

use aspira_core::{Move, MoveList, PieceKind, Position};

use crate::search::heuristics::Heuristics;
use crate::search::see::see_ge;

/// MVV-LVA weights: `victim * 16 - attacker`, King counted as 0 for both.
const MVV_LVA_WEIGHT: [i32; 6] = [1, 3, 3, 5, 9, 0];

const TT_MOVE: i32 = 1_000_000;
const QUEEN_PROMOTION: i32 = 800_000;
const GOOD_CAPTURE: i32 = 500_000;
const KILLER: i32 = 400_000;
const COUNTER: i32 = 300_000;
const BAD_CAPTURE: i32 = -500_000;
const UNDER_PROMOTION: i32 = -600_000;

#[inline]
pub fn mvv_lva(victim: PieceKind, attacker: PieceKind) -> i32 {
    MVV_LVA_WEIGHT[victim.index()] * 16 - MVV_LVA_WEIGHT[attacker.index()]
}

/// Ordering context for a main-search node.
pub struct NodeContext<'a> {
    pub tt_move: Move,
    pub killers: [Move; 2],
    pub counter: Move,
    pub heuristics: &'a Heuristics,
}

/// Score bands, highest first:
/// TT move, queen promotions, winning captures (MVV-LVA), killers, counter move,
/// quiets by history, losing captures, under-promotions.
fn score_main(pos: &Position, mv: Move, node: &NodeContext<'_>) -> i32 {
    if mv == node.tt_move {
        return TT_MOVE;
    }
    if let Some(promo) = mv.promotion() {
        let bonus = mv.captured().map_or(0, |victim| mvv_lva(victim, PieceKind::Pawn));
        return if promo == PieceKind::Queen { QUEEN_PROMOTION + bonus } else { UNDER_PROMOTION + bonus };
    }
    if let Some(victim) = mv.captured() {
        let order = mvv_lva(victim, mv.piece());
        return if see_ge(pos, mv, 0) { GOOD_CAPTURE + order } else { BAD_CAPTURE + order };
    }
    if mv == node.killers[0] {
        KILLER
    } else if mv == node.killers[1] {
        KILLER - 1
    } else if mv == node.counter {
        COUNTER
    } else {
        node.heuristics.history.score(pos.side_to_move(), mv)
    }
}

/// Quiescence ordering: promotions, then MVV-LVA.
fn score_tactical(mv: Move) -> i32 {
    let promo = match mv.promotion() {
        Some(PieceKind::Queen) => QUEEN_PROMOTION,
        _ => 0,
    };
    promo + mv.captured().map_or(0, |victim| mvv_lva(victim, mv.piece()))
}

// ── LMR Table ─────────────────────────────────────────────────────────────────

static LMR_TABLE: OnceLock<[[u8; 64]; 64]> = OnceLock::new();

fn lmr_table() -> &'static [[u8; 64]; 64] {
    LMR_TABLE.get_or_init(|| {
        let mut t = [[0u8; 64]; 64];
        for (d, row) in t.iter_mut().enumerate().skip(1) {
            for (m, r) in row.iter_mut().enumerate().skip(1) {
                *r = (0.75 + (d as f64).ln() * (m as f64).ln() / 2.25) as u8;
            }
        }
        t
    })
}

/// Plies to reduce the `move_index`-th move (0-based) at `depth`.
pub fn lmr_reduction(depth: i32, move_index: usize) -> i32 {
    let d = depth.clamp(0, 63) as usize;
    i32::from(lmr_table()[d][move_index.min(63)])
}

// ── Move Picker ────────────────────────────────────────────────────────────────

/// Incremental picker: a selection sort that yields the best remaining move.
pub struct MovePicker {
    moves: MoveList,
    scores: [i32; 256],
    cursor: usize,
}

impl MovePicker {
    /// All moves of a main-search node.
    pub fn new(moves: MoveList, pos: &Position, node: &NodeContext<'_>) -> Self {
        let mut scores = [0; 256];
        for (score, &mv) in scores.iter_mut().zip(moves.iter()) {
            *score = score_main(pos, mv, node);
        }
        Self { moves, scores, cursor: 0 }
    }

    /// Captures and promotions for quiescence search.
    pub fn tactical(moves: MoveList) -> Self {
        let mut scores = [0; 256];
        for (score, &mv) in scores.iter_mut().zip(moves.iter()) {
            *score = score_tactical(mv);
        }
        Self { moves, scores, cursor: 0 }
    }

    /// Moves yielded so far.
    pub fn yielded(&self) -> usize {
        self.cursor
    }

    /// Yield the next highest-scored move.
    pub fn pick_next(&mut self) -> Option<Move> {
        let len = self.moves.len();
        if self.cursor >= len {
            return None;
        }

        let mut best = self.cursor;
        for i in self.cursor + 1..len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }

        self.moves.as_mut_slice().swap(self.cursor, best);
        self.scores.swap(self.cursor, best);
        let mv = self.moves[self.cursor];
        self.cursor += 1;
        Some(mv)
    }
}
