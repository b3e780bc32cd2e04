//! Checkers and absolutely pinned pieces of the side to move.

use crate::attacks::{between, bishop_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

/// `(checkers, pinned)` for the side to move, whose king stands on `king_sq`.
pub(crate) fn checkers_and_pinned(pos: &Position, king_sq: Square) -> (Bitboard, Bitboard) {
    let us = pos.side_to_move();
    let them = !us;
    let ours = pos.side(us);
    let occupied = pos.occupied();
    let enemy = |kind| pos.colored(them, kind);

    let mut checkers = (knight_attacks(king_sq) & enemy(PieceKind::Knight))
        | (pawn_attacks(us, king_sq) & enemy(PieceKind::Pawn));
    let mut pinned = Bitboard::EMPTY;

    // Sliders that would hit the king on an empty board: zero blockers is a check,
    // exactly one friendly blocker is a pin.
    let snipers = (bishop_attacks(king_sq, Bitboard::EMPTY)
        & (enemy(PieceKind::Bishop) | enemy(PieceKind::Queen)))
        | (rook_attacks(king_sq, Bitboard::EMPTY) & (enemy(PieceKind::Rook) | enemy(PieceKind::Queen)));

    for sniper in snipers {
        let blockers = between(king_sq, sniper) & occupied;
        if blockers.is_empty() {
            checkers |= sniper.bitboard();
        } else if !blockers.more_than_one() {
            pinned |= blockers & ours;
        }
    }

    (checkers, pinned)
}
