//! Static Exchange Evaluation (SEE).
//!
//! Decides whether the capture sequence started by a move nets at least a given
//! material threshold, with both sides recapturing with their least valuable
//! attacker. Sliders hidden behind a capturing piece join as it leaves.

use aspira_core::attacks::{bishop_attacks, rook_attacks};
use aspira_core::{Bitboard, Color, Move, PieceKind, Position, Square};

/// Exchange values indexed by `PieceKind::index()`.
pub const SEE_VALUE: [i32; 6] = [100, 300, 300, 500, 900, 20_000];

#[inline]
pub fn see_value(kind: PieceKind) -> i32 {
    SEE_VALUE[kind.index()]
}

/// `true` if playing `mv` and the exchange that follows on its target square
/// gains at least `threshold` for the side to move.
///
/// Castling and promotions are scored as a zero exchange.
pub fn see_ge(pos: &Position, mv: Move, threshold: i32) -> bool {
    if mv.is_castle() || mv.is_promotion() {
        return threshold <= 0;
    }

    let from = mv.from();
    let to = mv.to();

    let mut swap = mv.captured().map_or(0, see_value) - threshold;
    if swap < 0 {
        return false;
    }
    swap = see_value(mv.piece()) - swap;
    if swap <= 0 {
        return true;
    }

    let mut occupied = (pos.occupied() ^ from.bitboard()) | to.bitboard();
    if mv.is_en_passant() {
        occupied ^= en_passant_victim(pos.side_to_move(), to).bitboard();
    }

    let diagonal = pos.kind(PieceKind::Bishop) | pos.kind(PieceKind::Queen);
    let straight = pos.kind(PieceKind::Rook) | pos.kind(PieceKind::Queen);

    let mut attackers = pos.attackers_to(to, occupied);
    let mut side = pos.side_to_move();
    // `true` while the side that moved first is ahead.
    let mut winning = true;

    loop {
        side = !side;
        attackers &= occupied;
        let ours = attackers & pos.side(side);
        if ours.is_empty() {
            break;
        }
        winning = !winning;

        let Some((sq, kind)) = least_valuable(pos, ours) else {
            break;
        };

        if kind == PieceKind::King {
            // The king may only take last: with enemy attackers left it would be illegal.
            return if (attackers & pos.side(!side)).any() { !winning } else { winning };
        }

        swap = see_value(kind) - swap;
        if swap < i32::from(winning) {
            break;
        }

        occupied ^= sq.bitboard();
        if matches!(kind, PieceKind::Pawn | PieceKind::Bishop | PieceKind::Queen) {
            attackers |= bishop_attacks(to, occupied) & diagonal;
        }
        if matches!(kind, PieceKind::Rook | PieceKind::Queen) {
            attackers |= rook_attacks(to, occupied) & straight;
        }
    }

    winning
}

fn least_valuable(pos: &Position, attackers: Bitboard) -> Option<(Square, PieceKind)> {
    PieceKind::ALL
        .into_iter()
        .find_map(|kind| (attackers & pos.kind(kind)).lsb().map(|sq| (sq, kind)))
}

/// Square of the pawn removed by an en passant capture landing on `to`.
fn en_passant_victim(mover: Color, to: Square) -> Square {
    let rank = match mover {
        Color::White => to.rank() - 1,
        Color::Black => to.rank() + 1,
    };
    Square::from_coords(to.file(), rank).unwrap_or(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(fen: &str, uci: &str, threshold: i32) -> bool {
        let pos: Position = fen.parse().unwrap();
        let mv = pos.parse_uci_move(uci).unwrap();
        see_ge(&pos, mv, threshold)
    }

    #[test]
    fn pawn_takes_undefended_knight() {
        let fen = "4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1";
        assert!(check(fen, "e4d5", 0));
        assert!(check(fen, "e4d5", 300));
        assert!(!check(fen, "e4d5", 301));
    }

    #[test]
    fn pawn_takes_defended_knight_still_wins() {
        // PxN, pxP: 300 - 100.
        let fen = "4k3/8/4p3/3n4/4P3/8/8/4K3 w - - 0 1";
        assert!(check(fen, "e4d5", 200));
        assert!(!check(fen, "e4d5", 201));
    }

    #[test]
    fn queen_takes_pawn_defended_by_pawn_loses() {
        let fen = "4k3/8/3p4/2p5/8/4Q3/8/4K3 w - - 0 1";
        assert!(!check(fen, "e3c5", 0));
        assert!(check(fen, "e3c5", -800));
    }

    #[test]
    fn xray_rook_backs_up_the_capture() {
        // Rxd5 Rxd5 Rxd5: the rook behind on d1 joins after the first capture.
        let fen = "3rk3/8/8/3r4/8/8/3R4/3RK3 w - - 0 1";
        assert!(check(fen, "d2d5", 500));
        let lone = "3rk3/8/8/3r4/8/8/3R4/4K3 w - - 0 1";
        assert!(check(lone, "d2d5", 0));
        assert!(!check(lone, "d2d5", 1));
        assert!(!check(lone, "d2d5", 500));
    }

    #[test]
    fn king_cannot_recapture_into_a_defended_square() {
        // Qxf7 is defended by the rook on f1; the black king may not take back.
        let fen = "6k1/5p2/8/8/8/8/5Q2/5RK1 w - - 0 1";
        assert!(check(fen, "f2f7", 100));
    }

    #[test]
    fn en_passant_is_an_even_trade() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        assert!(check(fen, "e5d6", 0));
        assert!(check(fen, "e5d6", 100));
    }

    #[test]
    fn quiet_move_to_an_attacked_square_loses() {
        let fen = "4k3/8/3p4/8/8/3N4/8/4K3 w - - 0 1";
        assert!(!check(fen, "d3e5", 0));
        assert!(check(fen, "d3e5", -300));
        assert!(check(fen, "d3f4", 0));
    }
}
