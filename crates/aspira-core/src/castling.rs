//! Castling rights as four independent flags packed into a nibble.

use std::fmt;

use crate::color::Color;
use crate::square::Square;

/// Bit 0 = White king-side, 1 = White queen-side, 2 = Black king-side, 3 = Black queen-side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

/// Which wing a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);
    pub const WHITE_KING: CastlingRights = CastlingRights(0b0001);
    pub const WHITE_QUEEN: CastlingRights = CastlingRights(0b0010);
    pub const BLACK_KING: CastlingRights = CastlingRights(0b0100);
    pub const BLACK_QUEEN: CastlingRights = CastlingRights(0b1000);

    /// Raw nibble, also the index into the Zobrist castling keys.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn flag(color: Color, side: CastleSide) -> CastlingRights {
        match (color, side) {
            (Color::White, CastleSide::King) => Self::WHITE_KING,
            (Color::White, CastleSide::Queen) => Self::WHITE_QUEEN,
            (Color::Black, CastleSide::King) => Self::BLACK_KING,
            (Color::Black, CastleSide::Queen) => Self::BLACK_QUEEN,
        }
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::flag(color, side).0 != 0
    }

    #[inline]
    pub const fn with(self, other: CastlingRights) -> CastlingRights {
        CastlingRights(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: CastlingRights) -> CastlingRights {
        CastlingRights(self.0 & !other.0)
    }

    /// Rights left after a move touches `from` and `to`: a king or rook leaving its home
    /// square, or a rook being captured there, revokes the matching flags.
    #[inline]
    pub const fn after_move(self, from: Square, to: Square) -> CastlingRights {
        CastlingRights(self.0 & KEEP_MASK[from.index()] & KEEP_MASK[to.index()])
    }
}

/// Per-square mask of the rights that survive the square being vacated or captured on.
const KEEP_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[Square::A1.index()] = !CastlingRights::WHITE_QUEEN.0 & 0b1111;
    mask[Square::H1.index()] = !CastlingRights::WHITE_KING.0 & 0b1111;
    mask[Square::E1.index()] = CastlingRights::BLACK_KING.0 | CastlingRights::BLACK_QUEEN.0;
    mask[Square::A8.index()] = !CastlingRights::BLACK_QUEEN.0 & 0b1111;
    mask[Square::H8.index()] = !CastlingRights::BLACK_KING.0 & 0b1111;
    mask[Square::E8.index()] = CastlingRights::WHITE_KING.0 | CastlingRights::WHITE_QUEEN.0;
    mask
};

/// King and rook travel for one castle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlePath {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
}

impl CastlePath {
    pub const fn of(color: Color, side: CastleSide) -> CastlePath {
        let (king_from, king_to, rook_from, rook_to) = match (color, side) {
            (Color::White, CastleSide::King) => (Square::E1, Square::G1, Square::H1, Square::F1),
            (Color::White, CastleSide::Queen) => (Square::E1, Square::C1, Square::A1, Square::D1),
            (Color::Black, CastleSide::King) => (Square::E8, Square::G8, Square::H8, Square::F8),
            (Color::Black, CastleSide::Queen) => (Square::E8, Square::C8, Square::A8, Square::D8),
        };
        CastlePath { king_from, king_to, rook_from, rook_to }
    }

    /// Path for a king arriving on `king_to`; only g- and c-file targets are castles.
    pub const fn for_king_target(king_to: Square) -> Option<CastlePath> {
        let color = if king_to.rank() == 0 { Color::White } else { Color::Black };
        match king_to.file() {
            6 => Some(Self::of(color, CastleSide::King)),
            2 => Some(Self::of(color, CastleSide::Queen)),
            _ => None,
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (flag, c) in [
            (Self::WHITE_KING, 'K'),
            (Self::WHITE_QUEEN, 'Q'),
            (Self::BLACK_KING, 'k'),
            (Self::BLACK_QUEEN, 'q'),
        ] {
            if self.0 & flag.0 != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastlingRights({self})")
    }
}
