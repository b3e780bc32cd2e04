//! Pawn pushes, captures, promotions and en passant.

use crate::attacks::{bishop_attacks, line, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::chess_move::{Move, MoveFlag};
use crate::color::Color;
use crate::piece::PieceKind;
use crate::square::Square;

use super::gen_type::GenType;
use super::{GenContext, MoveList};

pub(super) fn gen_pawns<G: GenType>(ctx: &GenContext<'_>, list: &mut MoveList) {
    let pos = ctx.pos;
    let us = pos.side_to_move();
    let them = !us;
    let push = us.push_delta();
    let empty = !pos.occupied();
    let enemy = pos.side(them);
    let pawns = pos.colored(us, PieceKind::Pawn);

    let (promo_rank, double_rank) = match us {
        Color::White => (Bitboard::RANK_8, Bitboard::RANK_4),
        Color::Black => (Bitboard::RANK_1, Bitboard::RANK_5),
    };

    // A pinned pawn may only move along the line through its king.
    let unpinned = |from: Square, to: Square| !ctx.pinned.contains(from) || line(ctx.king_sq, from).contains(to);

    let singles = pawns.forward(us) & empty;

    for to in singles & promo_rank & ctx.check_mask {
        let from = to.offset(-push);
        if unpinned(from, to) {
            push_promotions::<G>(list, from, to, None);
        }
    }

    if !G::TACTICAL {
        for to in singles & !promo_rank & ctx.check_mask {
            let from = to.offset(-push);
            if unpinned(from, to) {
                list.push(Move::normal(from, to, PieceKind::Pawn, None));
            }
        }
        for to in singles.forward(us) & empty & double_rank & ctx.check_mask {
            let from = to.offset(-2 * push);
            if unpinned(from, to) {
                list.push(Move::encode(from, to, PieceKind::Pawn, None, None, MoveFlag::DoublePush));
            }
        }
    }

    for from in pawns {
        for to in pawn_attacks(us, from) & enemy & ctx.check_mask {
            if !unpinned(from, to) {
                continue;
            }
            let victim = ctx.victim(to);
            if promo_rank.contains(to) {
                push_promotions::<G>(list, from, to, victim);
            } else {
                list.push(Move::normal(from, to, PieceKind::Pawn, victim));
            }
        }
    }

    if let Some(ep) = pos.en_passant() {
        let victim_sq = ep.offset(-push);
        // The double-pushed pawn can only be the checker itself; a slider check is
        // resolved only if the arrival square blocks it.
        if !ctx.check_mask.contains(ep) && !ctx.check_mask.contains(victim_sq) {
            return;
        }
        for from in pawn_attacks(them, ep) & pawns {
            if !unpinned(from, ep) {
                continue;
            }
            // Both pawns vacate squares at once, which can expose the king sideways.
            let after = (pos.occupied() ^ from.bitboard() ^ victim_sq.bitboard()) | ep.bitboard();
            let queens = pos.colored(them, PieceKind::Queen);
            let straight = pos.colored(them, PieceKind::Rook) | queens;
            let diagonal = pos.colored(them, PieceKind::Bishop) | queens;
            if (rook_attacks(ctx.king_sq, after) & straight).any()
                || (bishop_attacks(ctx.king_sq, after) & diagonal).any()
            {
                continue;
            }
            list.push(Move::encode(
                from,
                ep,
                PieceKind::Pawn,
                Some(PieceKind::Pawn),
                None,
                MoveFlag::EnPassant,
            ));
        }
    }
}

fn push_promotions<G: GenType>(list: &mut MoveList, from: Square, to: Square, victim: Option<PieceKind>) {
    let choices: &[PieceKind] = if G::TACTICAL { &PieceKind::PROMOTIONS[..1] } else { &PieceKind::PROMOTIONS };
    for &promo in choices {
        list.push(Move::encode(from, to, PieceKind::Pawn, victim, Some(promo), MoveFlag::Promotion));
    }
}
