//! Piece kinds and colored pieces.

use std::fmt;

use crate::color::Color;

/// A piece kind without color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Promotion targets, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] =
        [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decode a 4-bit field value. Values 6..=15 are not piece kinds.
    #[inline]
    pub const fn from_code(code: u8) -> Option<PieceKind> {
        match code {
            0 => Some(PieceKind::Pawn),
            1 => Some(PieceKind::Knight),
            2 => Some(PieceKind::Bishop),
            3 => Some(PieceKind::Rook),
            4 => Some(PieceKind::Queen),
            5 => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Lowercase letter used by FEN and coordinate notation.
    pub const fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Case-insensitive inverse of [`PieceKind::letter`].
    pub fn from_letter(c: char) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.letter() == c.to_ascii_lowercase())
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A colored piece. Its index (0..12) selects one of the position's twelve bitboards:
/// White pawn..king are 0..6, Black pawn..king are 6..12.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece(u8);

impl Piece {
    pub const COUNT: usize = 12;

    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece(color as u8 * 6 + kind as u8)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn color(self) -> Color {
        if self.0 < 6 { Color::White } else { Color::Black }
    }

    #[inline]
    pub const fn kind(self) -> PieceKind {
        match PieceKind::from_code(self.0 % 6) {
            Some(kind) => kind,
            None => unreachable!(),
        }
    }

    /// All twelve pieces in index order.
    pub fn all() -> impl Iterator<Item = Piece> {
        (0u8..12).map(Piece)
    }

    /// FEN letter: uppercase for White.
    pub fn fen_char(self) -> char {
        let c = self.kind().letter();
        match self.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece::new(color, kind))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({})", self.fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::{Piece, PieceKind};
    use crate::color::Color;

    #[test]
    fn index_layout() {
        assert_eq!(Piece::new(Color::White, PieceKind::Pawn).index(), 0);
        assert_eq!(Piece::new(Color::White, PieceKind::King).index(), 5);
        assert_eq!(Piece::new(Color::Black, PieceKind::Pawn).index(), 6);
        assert_eq!(Piece::new(Color::Black, PieceKind::King).index(), 11);
    }

    #[test]
    fn color_and_kind_roundtrip() {
        for piece in Piece::all() {
            assert_eq!(Piece::new(piece.color(), piece.kind()), piece);
            assert_eq!(Piece::from_fen_char(piece.fen_char()), Some(piece));
        }
    }

    #[test]
    fn codes_above_king_are_not_kinds() {
        for code in 6..16 {
            assert_eq!(PieceKind::from_code(code), None);
        }
        assert_eq!(PieceKind::from_code(4), Some(PieceKind::Queen));
    }

    #[test]
    fn fen_letters() {
        assert_eq!(Piece::from_fen_char('N'), Some(Piece::new(Color::White, PieceKind::Knight)));
        assert_eq!(Piece::from_fen_char('q'), Some(Piece::new(Color::Black, PieceKind::Queen)));
        assert_eq!(Piece::from_fen_char('x'), None);
        assert_eq!(Piece::from_fen_char('3'), None);
    }
}
