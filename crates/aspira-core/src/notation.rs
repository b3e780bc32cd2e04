//! Coordinate move text (`e2e4`, `e7e8q`) resolved against the legal moves.

use crate::chess_move::Move;
use crate::error::MoveParseError;
use crate::movegen::legal_moves;
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

impl Position {
    /// The legal move written as `text` in UCI coordinate notation.
    pub fn parse_uci_move(&self, text: &str) -> Result<Move, MoveParseError> {
        let malformed = || MoveParseError::Malformed { text: text.to_string() };
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(malformed());
        }
        let from = Square::from_algebraic(&text[0..2]).ok_or_else(malformed)?;
        let to = Square::from_algebraic(&text[2..4]).ok_or_else(malformed)?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_letter(c) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(malformed()),
            },
        };

        legal_moves(self)
            .iter()
            .copied()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion() == promotion)
            .ok_or_else(|| MoveParseError::Illegal { text: text.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess_move::MoveFlag;

    #[test]
    fn resolves_flags_from_the_position() {
        let pos = Position::startpos();
        let mv = pos.parse_uci_move("e2e4").unwrap();
        assert_eq!(mv.flag(), MoveFlag::DoublePush);
        assert_eq!(mv.piece(), PieceKind::Pawn);

        let pos: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        assert!(pos.parse_uci_move("e1c1").unwrap().is_castle());
    }

    #[test]
    fn promotion_letter_selects_piece() {
        let pos: Position = "1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mv = pos.parse_uci_move("a7b8n").unwrap();
        assert_eq!(mv.promotion(), Some(PieceKind::Knight));
        assert_eq!(mv.captured(), Some(PieceKind::Rook));
        assert!(matches!(pos.parse_uci_move("a7b8"), Err(MoveParseError::Illegal { .. })));
    }

    #[test]
    fn rejects_bad_text() {
        let pos = Position::startpos();
        for text in ["", "e2", "e2e9", "e2e4k", "z1a1", "e2e4qq", "é2e4"] {
            assert!(
                matches!(pos.parse_uci_move(text), Err(MoveParseError::Malformed { .. })),
                "{text:?}"
            );
        }
        assert_eq!(
            pos.parse_uci_move("e2e5"),
            Err(MoveParseError::Illegal { text: "e2e5".into() })
        );
    }
}
