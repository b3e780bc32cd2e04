//! Board squares, indexed rank-major from A1 = 0 to H8 = 63.

use std::fmt;

use crate::bitboard::Bitboard;

/// One of the 64 squares. Index = rank * 8 + file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

macro_rules! named_squares {
    ($($name:ident = $idx:expr),* $(,)?) => {
        impl Square {
            $(pub const $name: Square = Square($idx);)*
        }
    };
}

named_squares! {
    A1 = 0, B1 = 1, C1 = 2, D1 = 3, E1 = 4, F1 = 5, G1 = 6, H1 = 7,
    A2 = 8, B2 = 9, C2 = 10, D2 = 11, E2 = 12, F2 = 13, G2 = 14, H2 = 15,
    A3 = 16, B3 = 17, C3 = 18, D3 = 19, E3 = 20, F3 = 21, G3 = 22, H3 = 23,
    A4 = 24, B4 = 25, C4 = 26, D4 = 27, E4 = 28, F4 = 29, G4 = 30, H4 = 31,
    A5 = 32, B5 = 33, C5 = 34, D5 = 35, E5 = 36, F5 = 37, G5 = 38, H5 = 39,
    A6 = 40, B6 = 41, C6 = 42, D6 = 43, E6 = 44, F6 = 45, G6 = 46, H6 = 47,
    A7 = 48, B7 = 49, C7 = 50, D7 = 51, E7 = 52, F7 = 53, G7 = 54, H7 = 55,
    A8 = 56, B8 = 57, C8 = 58, D8 = 59, E8 = 60, F8 = 61, G8 = 62, H8 = 63,
}

impl Square {
    pub const COUNT: usize = 64;

    /// Square from zero-based file and rank (both 0..8).
    #[inline]
    pub const fn from_coords(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    #[inline]
    pub const fn from_index(index: u8) -> Option<Square> {
        if index < 64 { Some(Square(index)) } else { None }
    }

    #[inline]
    pub(crate) const fn from_index_unchecked(index: u8) -> Square {
        debug_assert!(index < 64);
        Square(index)
    }

    /// Parse lowercase algebraic notation such as `"e4"`.
    pub fn from_algebraic(s: &str) -> Option<Square> {
        match s.as_bytes() {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Square::from_coords(f - b'a', r - b'1'),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// File index, 0 = a-file.
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// Rank index, 0 = first rank.
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Mirror across the horizontal midline (A1 <-> A8).
    #[inline]
    pub const fn flip_rank(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// Square `delta` indices away. Caller guarantees the result is on the board.
    #[inline]
    pub(crate) const fn offset(self, delta: i8) -> Square {
        Square::from_index_unchecked((self.0 as i8 + delta) as u8)
    }

    #[inline]
    pub const fn bitboard(self) -> Bitboard {
        Bitboard::new(1u64 << self.0)
    }

    /// All squares in index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::Square;

    #[test]
    fn algebraic_roundtrip() {
        for sq in Square::all() {
            let text = sq.to_string();
            assert_eq!(Square::from_algebraic(&text), Some(sq), "{text}");
        }
        assert_eq!(Square::E4.to_string(), "e4");
    }

    #[test]
    fn rejects_bad_algebraic() {
        for bad in ["", "e", "e9", "i1", "E4", "e44"] {
            assert_eq!(Square::from_algebraic(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn coords() {
        assert_eq!(Square::G7.file(), 6);
        assert_eq!(Square::G7.rank(), 6);
        assert_eq!(Square::from_coords(4, 0), Some(Square::E1));
        assert_eq!(Square::from_coords(8, 0), None);
        assert_eq!(Square::C2.flip_rank(), Square::C7);
    }
}
