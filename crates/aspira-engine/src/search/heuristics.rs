//! Quiet-move ordering memory: killers, history and counter moves.

use aspira_core::{Color, Move, Piece};

use crate::search::negamax::MAX_PLY;

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: [[Move::NULL; 2]; MAX_PLY],
        }
    }

    /// Store a killer move at the given ply.
    ///
    /// Shifts slot 0 to slot 1 if the new move differs from slot 0.
    pub fn store(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        if self.slots[ply][0] != mv {
            self.slots[ply][1] = self.slots[ply][0];
            self.slots[ply][0] = mv;
        }
    }

    /// The two killers at `ply`, most recent first.
    pub fn get(&self, ply: usize) -> [Move; 2] {
        if ply >= MAX_PLY {
            return [Move::NULL; 2];
        }
        self.slots[ply]
    }

    pub fn clear(&mut self) {
        self.slots = [[Move::NULL; 2]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Maximum absolute value for history scores.
pub const HISTORY_MAX: i32 = 16_384;

/// History heuristic indexed by `[side][from][to]`.
///
/// Rewards quiet moves that cause beta cutoffs and penalises the quiet moves
/// tried before them.
pub struct HistoryTable {
    table: [[[i32; 64]; 64]; 2],
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            table: [[[0; 64]; 64]; 2],
        }
    }

    fn entry(&mut self, side: Color, mv: Move) -> &mut i32 {
        &mut self.table[side.index()][mv.from().index()][mv.to().index()]
    }

    pub fn reward(&mut self, side: Color, mv: Move, depth: i32) {
        let entry = self.entry(side, mv);
        *entry = (*entry + depth * depth).min(HISTORY_MAX);
    }

    pub fn penalize(&mut self, side: Color, mv: Move, depth: i32) {
        let entry = self.entry(side, mv);
        *entry = (*entry - depth * depth).max(-HISTORY_MAX);
    }

    #[inline]
    pub fn score(&self, side: Color, mv: Move) -> i32 {
        self.table[side.index()][mv.from().index()][mv.to().index()]
    }

    /// Halve every score so a new search favours fresh information.
    pub fn age(&mut self) {
        for v in self.table.iter_mut().flatten().flatten() {
            *v /= 2;
        }
    }

    pub fn clear(&mut self) {
        self.table = [[[0; 64]; 64]; 2];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The quiet reply that last refuted a move, indexed by that move's `[piece][to]`.
pub struct CounterMoveTable {
    table: [[Move; 64]; 12],
}

impl CounterMoveTable {
    pub fn new() -> Self {
        Self {
            table: [[Move::NULL; 64]; 12],
        }
    }

    /// `prev` was played by `mover`; `reply` refuted it.
    pub fn store(&mut self, mover: Color, prev: Move, reply: Move) {
        if !prev.is_null() {
            self.table[Piece::new(mover, prev.piece()).index()][prev.to().index()] = reply;
        }
    }

    pub fn get(&self, mover: Color, prev: Move) -> Move {
        if prev.is_null() {
            return Move::NULL;
        }
        self.table[Piece::new(mover, prev.piece()).index()][prev.to().index()]
    }

    pub fn clear(&mut self) {
        self.table = [[Move::NULL; 64]; 12];
    }
}

impl Default for CounterMoveTable {
    fn default() -> Self {
        Self::new()
    }
}

/// All ordering tables a searcher carries from one search to the next.
#[derive(Default)]
pub struct Heuristics {
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub counters: CounterMoveTable,
}

impl Heuristics {
    /// Forget killers and age history before a new search.
    pub fn new_search(&mut self) {
        self.killers.clear();
        self.history.age();
    }

    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
        self.counters.clear();
    }
}
