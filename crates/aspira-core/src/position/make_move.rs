//! In-place move application and its exact reversal.

use crate::castling::CastlePath;
use crate::chess_move::{Move, MoveFlag};
use crate::color::Color;
use crate::piece::{Piece, PieceKind};
use crate::zobrist::KEYS;

use super::Position;

/// Proof that a move (or null move) was made at a given history depth.
///
/// Not `Clone`: each token is consumed by exactly one undo, and undoing with a token
/// from another depth panics.
#[must_use = "pass the token to undo_move or undo_null_move"]
#[derive(Debug, PartialEq, Eq)]
pub struct MoveUndo {
    depth: usize,
}

impl Position {
    /// Apply `mv`, which must be legal in this position.
    pub fn make_move(&mut self, mv: Move) -> MoveUndo {
        let depth = self.history.push(&self.state);
        let st = &mut self.state;
        let us = st.side_to_move;
        let them = !us;
        let (from, to) = (mv.from(), mv.to());
        let mover = Piece::new(us, mv.piece());

        if let Some(ep) = st.en_passant.take() {
            st.key ^= KEYS.en_passant(ep);
        }

        match mv.flag() {
            MoveFlag::Castling => {
                let path = match CastlePath::for_king_target(to) {
                    Some(path) => path,
                    None => panic!("corrupted packed move: castle to {to}"),
                };
                st.shift(mover, from, to);
                st.shift(Piece::new(us, PieceKind::Rook), path.rook_from, path.rook_to);
            }
            MoveFlag::EnPassant => {
                let victim = to.offset(-us.push_delta());
                st.remove(Piece::new(them, PieceKind::Pawn), victim);
                st.shift(mover, from, to);
            }
            flag => {
                if let Some(captured) = mv.captured() {
                    st.remove(Piece::new(them, captured), to);
                }
                match mv.promotion() {
                    Some(promo) => {
                        st.remove(mover, from);
                        st.put(Piece::new(us, promo), to);
                    }
                    None => st.shift(mover, from, to),
                }
                if flag == MoveFlag::DoublePush {
                    let ep = from.offset(us.push_delta());
                    st.en_passant = Some(ep);
                    st.key ^= KEYS.en_passant(ep);
                }
            }
        }

        let rights = st.castling.after_move(from, to);
        if rights != st.castling {
            st.key ^= KEYS.castling(st.castling) ^ KEYS.castling(rights);
            st.castling = rights;
        }

        if mv.piece() == PieceKind::Pawn || mv.is_capture() {
            st.halfmove_clock = 0;
        } else {
            st.halfmove_clock = st.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            st.fullmove_number = st.fullmove_number.saturating_add(1);
        }
        st.side_to_move = them;
        st.key ^= KEYS.white_to_move();
        st.ply_count = st.ply_count.saturating_add(1);
        st.plies_from_null = st.plies_from_null.saturating_add(1);

        MoveUndo { depth }
    }

    /// Restore the position from before the move that produced `undo`.
    ///
    /// # Panics
    ///
    /// If `undo` was not issued by the most recent unreversed make.
    pub fn undo_move(&mut self, undo: MoveUndo) {
        assert_eq!(
            undo.depth,
            self.history.len(),
            "undo out of order: token depth {} at history depth {}",
            undo.depth,
            self.history.len()
        );
        self.state = self.history.pop();
    }

    /// Pass the turn without moving a piece.
    pub fn make_null_move(&mut self) -> MoveUndo {
        let depth = self.history.push(&self.state);
        let st = &mut self.state;
        if let Some(ep) = st.en_passant.take() {
            st.key ^= KEYS.en_passant(ep);
        }
        st.side_to_move = !st.side_to_move;
        st.key ^= KEYS.white_to_move();
        st.halfmove_clock = st.halfmove_clock.saturating_add(1);
        st.ply_count = st.ply_count.saturating_add(1);
        st.plies_from_null = 0;
        MoveUndo { depth }
    }

    pub fn undo_null_move(&mut self, undo: MoveUndo) {
        self.undo_move(undo);
    }

    /// Make `mv` permanently, as when replaying game moves. Its snapshot stays on the
    /// history stack for repetition detection.
    pub fn play(&mut self, mv: Move) {
        let _kept = self.make_move(mv);
    }
}
