//! Transposition table: one 16-byte entry per slot, depth-preferred replacement.
//!
//! ## Entry layout
//!
//! ```text
//! key  (u64): full Zobrist key, compared exactly on lookup
//! data (u64):
//!   bits 63-58: generation (6 bits, wraps at 64)
//!   bits 57-56: bound      (2 bits)
//!   bits 55-48: depth      (8 bits)
//!   bits 47-32: score      (i16 as u16, see below for mates)
//!   bits 31-0:  move       (packed move)
//! ```
//!
//! ## Mate scores
//!
//! During the search a mate `n` plies beyond a node at `ply` is worth
//! `MATE - (ply + n)`. The same position can be reached at another ply through a
//! transposition, so the stored score drops the path length: [`score_to_tt`]
//! turns "mate in N plies from here" into "mate in N plies from the root" of the
//! stored position, and [`score_from_tt`] adds the reading ply back.
//!
//! ## Replacement
//!
//! One slot per index. A new result for a different position wins the slot when
//! the slot is empty, belongs to an earlier search, or was searched no deeper.
//! The full key is kept so an index collision reads as a miss.
//!
//! The table is owned by a single searcher; no synchronization is needed.

use aspira_core::Move;

use super::negamax::MATE_BOUND;

/// Smallest table the engine will allocate, whatever the megabyte budget.
pub const MIN_ENTRIES: usize = 1024;

const GENERATION_MASK: u8 = 0x3F;

/// What the stored score says about the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// Empty slot.
    None = 0,
    /// The score is exact.
    Exact = 1,
    /// Failed high: the true score is at least this.
    Lower = 2,
    /// Failed low: the true score is at most this.
    Upper = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Bound {
        match bits & 0x3 {
            1 => Bound::Exact,
            2 => Bound::Lower,
            3 => Bound::Upper,
            _ => Bound::None,
        }
    }
}

/// A matching entry, with its score already converted back to the reading ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtHit {
    /// Best or refuting move; null when the node stored none.
    pub mv: Move,
    pub score: i32,
    /// Remaining depth the score was searched to.
    pub depth: u8,
    pub bound: Bound,
}

/// Score to store for a node at `ply`.
///
/// Mate scores lose the distance from the search root to this node: a winning
/// mate gains `ply` and a losing one gives it up, leaving the distance counted
/// from the stored position itself. Other scores pass through.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i16 {
    let ply = ply as i32;
    let adjusted = if score >= MATE_BOUND {
        score + ply
    } else if score <= -MATE_BOUND {
        score - ply
    } else {
        score
    };
    adjusted as i16
}

/// Score of a stored entry as seen from a node at `ply`.
///
/// Reverse of [`score_to_tt`]: the distance from the root to the reading node is
/// added back, so `score_from_tt(score_to_tt(s, p), p) == s`.
#[inline]
pub fn score_from_tt(score: i16, ply: usize) -> i32 {
    let score = i32::from(score);
    let ply = ply as i32;
    if score >= MATE_BOUND {
        score - ply
    } else if score <= -MATE_BOUND {
        score + ply
    } else {
        score
    }
}

/// One slot. `key == 0` with an empty bound is an unused slot.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
struct Entry {
    key: u64,
    data: u64,
}

impl Entry {
    const EMPTY: Entry = Entry { key: 0, data: 0 };

    fn pack(mv: Move, score: i16, depth: u8, bound: Bound, generation: u8) -> u64 {
        (u64::from(generation & GENERATION_MASK) << 58)
            | ((bound as u64) << 56)
            | (u64::from(depth) << 48)
            | (u64::from(score as u16) << 32)
            | u64::from(mv.raw())
    }

    #[inline]
    fn bound(self) -> Bound {
        Bound::from_bits(self.data >> 56)
    }

    #[inline]
    fn depth(self) -> u8 {
        (self.data >> 48) as u8
    }

    #[inline]
    fn generation(self) -> u8 {
        (self.data >> 58) as u8 & GENERATION_MASK
    }

    #[inline]
    fn score(self) -> i16 {
        (self.data >> 32) as u16 as i16
    }

    #[inline]
    fn mv(self) -> Move {
        Move::from_raw(self.data as u32)
    }
}

/// Fixed-size, power-of-two hash table of search results.
pub struct TranspositionTable {
    entries: Box<[Entry]>,
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// A table sized from a megabyte budget, rounded down to a power of two and
    /// never below [`MIN_ENTRIES`].
    pub fn new(mb: usize) -> TranspositionTable {
        let len = entries_for(mb);
        TranspositionTable {
            entries: vec![Entry::EMPTY; len].into_boxed_slice(),
            mask: len - 1,
            generation: 0,
        }
    }

    /// Reallocate for a new budget. All entries are lost.
    pub fn resize(&mut self, mb: usize) {
        *self = TranspositionTable::new(mb);
        tracing::debug!(mb, entries = self.entries.len(), "transposition table resized");
    }

    /// Empty every slot and reset the generation.
    pub fn clear(&mut self) {
        self.entries.fill(Entry::EMPTY);
        self.generation = 0;
        tracing::debug!("transposition table cleared");
    }

    /// Age the table; entries from earlier searches become replaceable regardless of depth.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1) & GENERATION_MASK;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        key as usize & self.mask
    }

    /// The entry for exactly `key`, if present.
    ///
    /// `ply` is the reading node's distance from the root; mate scores in the
    /// hit are adjusted to it. The caller decides whether the bound and depth
    /// allow a cutoff; the move is useful for ordering either way.
    pub fn lookup(&self, key: u64, ply: usize) -> Option<TtHit> {
        let entry = self.entries[self.index(key)];
        if entry.key != key || entry.bound() == Bound::None {
            return None;
        }
        Some(TtHit {
            mv: entry.mv(),
            score: score_from_tt(entry.score(), ply),
            depth: entry.depth(),
            bound: entry.bound(),
        })
    }

    /// Record a search result.
    ///
    /// `score` is as the node at `ply` saw it and is normalised with
    /// [`score_to_tt`] before packing.
    ///
    /// A slot holding another position is overwritten only when it is empty, from
    /// an older search, or no deeper than the new result. A null `mv` keeps the
    /// move already stored for the same position.
    pub fn store(&mut self, key: u64, mv: Move, score: i32, depth: u8, bound: Bound, ply: usize) {
        let index = self.index(key);
        let old = self.entries[index];
        let same = old.key == key;

        // Depth-preferred, but stale and same-position entries always yield.
        let replace = same
            || old.bound() == Bound::None
            || old.generation() != self.generation
            || depth >= old.depth();
        if !replace {
            return;
        }

        let mv = if mv.is_null() && same { old.mv() } else { mv };
        self.entries[index] = Entry {
            key,
            data: Entry::pack(mv, score_to_tt(score, ply), depth, bound, self.generation),
        };
    }

    /// Per-mille occupancy by current-search entries, sampled over the first 1000 slots.
    pub fn hashfull(&self) -> u32 {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample]
            .iter()
            .filter(|e| e.bound() != Bound::None && e.generation() == self.generation)
            .count();
        (used * 1000 / sample) as u32
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("entries", &self.entries.len())
            .field("generation", &self.generation)
            .finish()
    }
}

fn entries_for(mb: usize) -> usize {
    let wanted = mb.saturating_mul(1024 * 1024) / std::mem::size_of::<Entry>();
    let rounded = if wanted == 0 { 0 } else { 1 << wanted.ilog2() };
    rounded.max(MIN_ENTRIES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::negamax::MATE;
    use aspira_core::{PieceKind, Square};

    fn e2e4() -> Move {
        Move::normal(Square::E2, Square::E4, PieceKind::Pawn, None)
    }

    fn d2d4() -> Move {
        Move::normal(Square::D2, Square::D4, PieceKind::Pawn, None)
    }

    #[test]
    fn entry_is_16_bytes() {
        assert_eq!(std::mem::size_of::<Entry>(), 16);
    }

    #[test]
    fn sizing_rounds_down_to_a_power_of_two() {
        assert_eq!(TranspositionTable::new(1).len(), 65_536);
        assert_eq!(TranspositionTable::new(3).len(), 131_072);
        assert_eq!(TranspositionTable::new(0).len(), MIN_ENTRIES);
    }

    #[test]
    fn store_then_lookup() {
        let mut tt = TranspositionTable::new(1);
        let key = 0xDEAD_BEEF_1234_5678;
        tt.store(key, e2e4(), 37, 6, Bound::Exact, 3);
        let hit = tt.lookup(key, 3).expect("stored entry");
        assert_eq!(hit, TtHit { mv: e2e4(), score: 37, depth: 6, bound: Bound::Exact });
    }

    #[test]
    fn aliased_key_is_a_miss() {
        let mut tt = TranspositionTable::new(1);
        let key = 0x1234_0000_0000_0042;
        tt.store(key, e2e4(), 10, 3, Bound::Lower, 0);
        let alias = key ^ (1 << 40);
        assert_eq!(tt.index(alias), tt.index(key));
        assert!(tt.lookup(alias, 0).is_none());
        assert!(tt.lookup(0x77, 0).is_none());
    }

    #[test]
    fn mate_scores_are_ply_independent() {
        let mut tt = TranspositionTable::new(1);
        // Mate found 5 plies below a node at ply 4: MATE - 9 from the root.
        tt.store(1, e2e4(), MATE - 9, 5, Bound::Exact, 4);
        // Stored as mate in 5 from the stored position.
        assert_eq!(score_to_tt(MATE - 9, 4), (MATE - 5) as i16);
        assert_eq!(score_to_tt(-(MATE - 9), 4), -(MATE - 5) as i16);
        assert_eq!(score_from_tt((MATE - 5) as i16, 4), MATE - 9);
        // Read from a transposition at ply 2 the same mate is 7 plies from the root.
        assert_eq!(tt.lookup(1, 2).unwrap().score, MATE - 7);

        tt.store(2, e2e4(), -(MATE - 6), 5, Bound::Exact, 6);
        assert_eq!(tt.lookup(2, 1).unwrap().score, -(MATE - 1));

        assert_eq!(score_from_tt(score_to_tt(-250, 9), 3), -250);
    }

    #[test]
    fn shallower_result_for_another_key_is_rejected() {
        let mut tt = TranspositionTable::new(1);
        let mask = tt.mask as u64;
        let a = 5;
        let b = 5 | (mask + 1);
        tt.store(a, e2e4(), 1, 8, Bound::Lower, 0);
        tt.store(b, d2d4(), 2, 3, Bound::Lower, 0);
        assert!(tt.lookup(b, 0).is_none());
        assert_eq!(tt.lookup(a, 0).unwrap().mv, e2e4());

        tt.store(b, d2d4(), 2, 8, Bound::Upper, 0);
        assert_eq!(tt.lookup(b, 0).unwrap().mv, d2d4());
        assert!(tt.lookup(a, 0).is_none());
    }

    #[test]
    fn older_generation_is_replaced_regardless_of_depth() {
        let mut tt = TranspositionTable::new(1);
        let mask = tt.mask as u64;
        tt.store(9, e2e4(), 1, 20, Bound::Exact, 0);
        tt.new_search();
        tt.store(9 | (mask + 1), d2d4(), 2, 1, Bound::Lower, 0);
        assert_eq!(tt.lookup(9 | (mask + 1), 0).unwrap().mv, d2d4());
    }

    #[test]
    fn same_key_keeps_move_when_none_given() {
        let mut tt = TranspositionTable::new(1);
        tt.store(11, e2e4(), 5, 4, Bound::Lower, 0);
        tt.store(11, Move::NULL, -5, 6, Bound::Upper, 0);
        let hit = tt.lookup(11, 0).unwrap();
        assert_eq!(hit.mv, e2e4());
        assert_eq!(hit.bound, Bound::Upper);
        assert_eq!(hit.depth, 6);
    }

    #[test]
    fn clear_and_hashfull() {
        let mut tt = TranspositionTable::new(1);
        assert_eq!(tt.hashfull(), 0);
        for key in 0..500u64 {
            tt.store(key, e2e4(), 0, 1, Bound::Exact, 0);
        }
        assert_eq!(tt.hashfull(), 500);
        tt.new_search();
        assert_eq!(tt.hashfull(), 0);
        tt.clear();
        assert!(tt.lookup(3, 0).is_none());
    }
}
