//! Pre-allocated LIFO of board snapshots.

use super::BoardState;

/// Snapshots for game moves plus search plies.
pub const HISTORY_CAPACITY: usize = 2048;

/// Fixed-capacity snapshot stack. Allocated once per position and never grown.
#[derive(Clone)]
pub(crate) struct HistoryStack {
    slots: Box<[BoardState]>,
    len: usize,
}

impl HistoryStack {
    pub(crate) fn new() -> HistoryStack {
        HistoryStack {
            slots: vec![BoardState::EMPTY; HISTORY_CAPACITY].into_boxed_slice(),
            len: 0,
        }
    }

    /// Copy `state` in and return the new depth.
    ///
    /// # Panics
    ///
    /// When the stack is full.
    #[inline]
    pub(crate) fn push(&mut self, state: &BoardState) -> usize {
        assert!(self.len < HISTORY_CAPACITY, "history stack overflow at {} plies", self.len);
        self.slots[self.len] = *state;
        self.len += 1;
        self.len
    }

    /// # Panics
    ///
    /// When the stack is empty.
    #[inline]
    pub(crate) fn pop(&mut self) -> BoardState {
        assert!(self.len > 0, "undo with an empty history stack");
        self.len -= 1;
        self.slots[self.len]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Zobrist key of the snapshot `back` entries below the top (1 = most recent).
    #[inline]
    pub(crate) fn key_back(&self, back: usize) -> u64 {
        self.slots[self.len - back].key
    }
}
