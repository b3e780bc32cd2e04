//! Legal move generation with pin masks and a check-evasion mask.

mod gen_type;
mod king;
mod pawns;
mod pieces;
mod pins;

use crate::attacks::between;
use crate::bitboard::Bitboard;
use crate::chess_move::Move;
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

use self::gen_type::{All, GenType, Tactical};

/// Fixed-capacity move buffer; 256 covers the 218-move maximum of any legal position.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; 256],
    len: u16,
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList { moves: [Move::NULL; 256], len: 0 }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!((self.len as usize) < 256);
        self.moves[self.len as usize] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len as usize]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len as usize]
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Move {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

/// Per-position data shared by the piece generators.
pub(crate) struct GenContext<'a> {
    pub(crate) pos: &'a Position,
    pub(crate) king_sq: Square,
    pub(crate) pinned: Bitboard,
    /// Destinations that resolve the current check; every square when not in check.
    pub(crate) check_mask: Bitboard,
}

impl GenContext<'_> {
    /// Kind of the enemy piece on `sq`, if any.
    #[inline]
    pub(crate) fn victim(&self, sq: Square) -> Option<PieceKind> {
        self.pos.piece_at(sq).map(|piece| piece.kind())
    }
}

/// Every legal move in the position.
pub fn legal_moves(pos: &Position) -> MoveList {
    generate::<All>(pos)
}

/// Legal captures (en passant included) and queen promotions.
pub fn capture_moves(pos: &Position) -> MoveList {
    generate::<Tactical>(pos)
}

fn generate<G: GenType>(pos: &Position) -> MoveList {
    let mut list = MoveList::new();
    let king_sq = pos.king_square(pos.side_to_move());
    let (checkers, pinned) = pins::checkers_and_pinned(pos, king_sq);

    if checkers.more_than_one() {
        king::gen_king::<G>(pos, king_sq, &mut list);
        return list;
    }
    let check_mask = match checkers.lsb() {
        Some(checker) => between(king_sq, checker) | checkers,
        None => Bitboard::FULL,
    };
    let ctx = GenContext { pos, king_sq, pinned, check_mask };
    pawns::gen_pawns::<G>(&ctx, &mut list);
    pieces::gen_pieces::<G>(&ctx, &mut list);
    king::gen_king::<G>(pos, king_sq, &mut list);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess_move::MoveFlag;

    fn moves(fen: &str) -> MoveList {
        legal_moves(&fen.parse().unwrap())
    }

    #[test]
    fn starting_position_has_20_moves() {
        let list = legal_moves(&Position::startpos());
        assert_eq!(list.len(), 20);
        let doubles = list.iter().filter(|m| m.flag() == MoveFlag::DoublePush).count();
        assert_eq!(doubles, 8);
    }

    #[test]
    fn pinned_knight_cannot_move() {
        let list = moves("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(list.iter().all(|m| m.from() != Square::E2));
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        let list = moves("4r1k1/8/8/8/8/5n2/8/4K3 w - - 0 1");
        assert!(!list.is_empty());
        assert!(list.iter().all(|m| m.piece() == PieceKind::King));
    }

    #[test]
    fn castling_not_through_attacked_square() {
        let list = moves("4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1");
        let castles: Vec<_> = list.iter().filter(|m| m.is_castle()).collect();
        assert_eq!(castles.len(), 1);
        assert_eq!(castles[0].to(), Square::C1);
    }

    #[test]
    fn en_passant_is_generated_with_victim() {
        let list = moves("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let ep: Vec<_> = list.iter().filter(|m| m.is_en_passant()).collect();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep[0].captured(), Some(PieceKind::Pawn));
    }

    #[test]
    fn en_passant_exposing_king_on_rank_is_illegal() {
        let list = moves("4k3/8/8/KPp4r/8/8/8/8 w - c6 0 1");
        assert!(list.iter().all(|m| !m.is_en_passant()));
    }

    #[test]
    fn en_passant_resolves_pawn_check() {
        // d5 pawn gives check to the e4 king; exd6 e.p. removes it.
        let list = moves("4k3/8/8/3pP3/4K3/8/8/8 w - d6 0 1");
        assert!(list.iter().any(|m| m.is_en_passant()));
    }

    #[test]
    fn promotions_come_in_four() {
        let list = moves("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(list.iter().filter(|m| m.is_promotion()).count(), 4);
    }

    #[test]
    fn captures_carry_the_victim_kind() {
        let list = moves("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1");
        let exd5 = list.iter().find(|m| m.from() == Square::E4 && m.to() == Square::D5);
        assert_eq!(exd5.and_then(|m| m.captured()), Some(PieceKind::Queen));
    }

    #[test]
    fn capture_list_is_tactical_subset() {
        let pos: Position = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
            .parse()
            .unwrap();
        let all = legal_moves(&pos);
        let tactical = capture_moves(&pos);
        assert_eq!(tactical.len(), 8);
        for mv in &tactical {
            assert!(mv.is_capture() || mv.promotion() == Some(PieceKind::Queen));
            assert!(all.contains(*mv), "{mv} not legal");
        }
    }

    #[test]
    fn capture_list_promotes_to_queen_only() {
        let pos: Position = "1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let tactical = capture_moves(&pos);
        let promos: Vec<_> = tactical.iter().filter(|m| m.is_promotion()).collect();
        assert_eq!(promos.len(), 2);
        assert!(promos.iter().all(|m| m.promotion() == Some(PieceKind::Queen)));
    }
}
