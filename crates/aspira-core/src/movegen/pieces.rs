//! Knight, bishop, rook and queen moves.

use crate::attacks::{line, piece_attacks};
use crate::chess_move::Move;
use crate::piece::PieceKind;

use super::gen_type::GenType;
use super::{GenContext, MoveList};

const KINDS: [PieceKind; 4] = [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen];

pub(super) fn gen_pieces<G: GenType>(ctx: &GenContext<'_>, list: &mut MoveList) {
    let pos = ctx.pos;
    let us = pos.side_to_move();
    let occupied = pos.occupied();
    let targets = (if G::TACTICAL { pos.side(!us) } else { !pos.side(us) }) & ctx.check_mask;

    for kind in KINDS {
        for from in pos.colored(us, kind) {
            let mut dests = piece_attacks(kind, from, occupied) & targets;
            if ctx.pinned.contains(from) {
                if kind == PieceKind::Knight {
                    continue;
                }
                dests &= line(ctx.king_sq, from);
            }
            for to in dests {
                list.push(Move::normal(from, to, kind, ctx.victim(to)));
            }
        }
    }
}
