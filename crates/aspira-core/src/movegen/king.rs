//! King steps and castling.

use crate::attacks::{between, king_attacks};
use crate::castling::{CastlePath, CastleSide};
use crate::chess_move::{Move, MoveFlag};
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

use super::MoveList;
use super::gen_type::GenType;

pub(super) fn gen_king<G: GenType>(pos: &Position, king_sq: Square, list: &mut MoveList) {
    let us = pos.side_to_move();
    let them = !us;
    // Without the king in the occupancy a slider's ray continues past it, so the
    // king cannot step back along the line it is checked on.
    let through = pos.occupied() ^ king_sq.bitboard();
    let targets = if G::TACTICAL { pos.side(them) } else { !pos.side(us) };

    for to in king_attacks(king_sq) & targets {
        if !pos.is_square_attacked_through(to, them, through) {
            let victim = pos.piece_at(to).map(|piece| piece.kind());
            list.push(Move::normal(king_sq, to, PieceKind::King, victim));
        }
    }

    if G::TACTICAL || pos.castling().is_empty() || pos.is_square_attacked(king_sq, them) {
        return;
    }
    for side in [CastleSide::King, CastleSide::Queen] {
        if !pos.castling().has(us, side) {
            continue;
        }
        let path = CastlePath::of(us, side);
        let must_be_empty = between(path.king_from, path.rook_from);
        let king_walk = between(path.king_from, path.king_to) | path.king_to.bitboard();
        if (must_be_empty & pos.occupied()).any() {
            continue;
        }
        if Iterator::any(&mut king_walk.into_iter(), |sq| pos.is_square_attacked(sq, them)) {
            continue;
        }
        list.push(Move::encode(path.king_from, path.king_to, PieceKind::King, None, None, MoveFlag::Castling));
    }
}
