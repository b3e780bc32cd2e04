//! Packed move: squares, moving piece, captured piece, promotion and flag in one `u32`.

use std::fmt;

use crate::piece::PieceKind;
use crate::square::Square;

const FROM_SHIFT: u32 = 0;
const TO_SHIFT: u32 = 6;
const PIECE_SHIFT: u32 = 12;
const CAPTURED_SHIFT: u32 = 16;
const PROMO_SHIFT: u32 = 20;
const FLAG_SHIFT: u32 = 24;

const SQUARE_MASK: u32 = 0x3F;
const NIBBLE: u32 = 0xF;

/// Captured-field value meaning "nothing captured".
pub const EMPTY: u8 = 6;

/// How a move is applied beyond relocating one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    Default = 0,
    DoublePush = 1,
    EnPassant = 2,
    Promotion = 3,
    Castling = 4,
}

impl MoveFlag {
    const fn from_code(code: u8) -> MoveFlag {
        match code {
            0 => MoveFlag::Default,
            1 => MoveFlag::DoublePush,
            2 => MoveFlag::EnPassant,
            3 => MoveFlag::Promotion,
            4 => MoveFlag::Castling,
            _ => panic!("corrupted packed move: flag out of range"),
        }
    }
}

/// A move packed into 32 bits.
///
/// ```text
/// bits  0-5   from square
/// bits  6-11  to square
/// bits 12-15  moving piece kind
/// bits 16-19  captured piece kind (6 = EMPTY)
/// bits 20-23  promotion piece kind (0 = none)
/// bits 24-27  MoveFlag
/// ```
///
/// Equality is structural, so two encodings of the same squares with different
/// metadata are different moves.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u32);

impl Move {
    /// The "no move" sentinel. Never produced by move generation.
    pub const NULL: Move = Move((EMPTY as u32) << CAPTURED_SHIFT);

    /// Pack all fields.
    pub const fn encode(
        from: Square,
        to: Square,
        piece: PieceKind,
        captured: Option<PieceKind>,
        promotion: Option<PieceKind>,
        flag: MoveFlag,
    ) -> Move {
        let captured = match captured {
            Some(kind) => kind as u32,
            None => EMPTY as u32,
        };
        let promotion = match promotion {
            Some(kind) => kind as u32,
            None => 0,
        };
        Move(
            (from.index() as u32) << FROM_SHIFT
                | (to.index() as u32) << TO_SHIFT
                | (piece as u32) << PIECE_SHIFT
                | captured << CAPTURED_SHIFT
                | promotion << PROMO_SHIFT
                | (flag as u32) << FLAG_SHIFT,
        )
    }

    /// Plain move or capture.
    #[inline]
    pub const fn normal(from: Square, to: Square, piece: PieceKind, captured: Option<PieceKind>) -> Move {
        Move::encode(from, to, piece, captured, None, MoveFlag::Default)
    }

    /// Reinterpret raw bits, e.g. read back from the transposition table.
    #[inline]
    pub const fn from_raw(bits: u32) -> Move {
        Move(bits)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked((self.0 >> FROM_SHIFT & SQUARE_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked((self.0 >> TO_SHIFT & SQUARE_MASK) as u8)
    }

    /// Kind of the piece that moves.
    ///
    /// # Panics
    ///
    /// If the field does not hold a piece kind, which only a corrupted move can produce.
    #[inline]
    pub const fn piece(self) -> PieceKind {
        match PieceKind::from_code((self.0 >> PIECE_SHIFT & NIBBLE) as u8) {
            Some(kind) => kind,
            None => panic!("corrupted packed move: moving piece out of range"),
        }
    }

    /// Kind of the captured piece; `None` when the field holds [`EMPTY`].
    ///
    /// # Panics
    ///
    /// If the field holds neither a piece kind nor [`EMPTY`].
    #[inline]
    pub const fn captured(self) -> Option<PieceKind> {
        let code = (self.0 >> CAPTURED_SHIFT & NIBBLE) as u8;
        if code == EMPTY {
            return None;
        }
        match PieceKind::from_code(code) {
            Some(kind) => Some(kind),
            None => panic!("corrupted packed move: captured piece out of range"),
        }
    }

    /// # Panics
    ///
    /// If the field holds a pawn or king code, or a value above the king.
    #[inline]
    pub const fn promotion(self) -> Option<PieceKind> {
        match self.0 >> PROMO_SHIFT & NIBBLE {
            0 => None,
            1 => Some(PieceKind::Knight),
            2 => Some(PieceKind::Bishop),
            3 => Some(PieceKind::Rook),
            4 => Some(PieceKind::Queen),
            _ => panic!("corrupted packed move: promotion piece out of range"),
        }
    }

    #[inline]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_code((self.0 >> FLAG_SHIFT & NIBBLE) as u8)
    }

    /// `true` if an enemy piece is removed, en passant included.
    #[inline]
    pub const fn is_capture(self) -> bool {
        (self.0 >> CAPTURED_SHIFT & NIBBLE) as u8 != EMPTY
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.0 >> PROMO_SHIFT & NIBBLE != 0
    }

    /// Neither a capture nor a promotion.
    #[inline]
    pub const fn is_quiet(self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.flag(), MoveFlag::Castling)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.flag(), MoveFlag::EnPassant)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == Move::NULL.0
    }

    /// Coordinate notation, e.g. `e2e4`, `e7e8q`.
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::NULL
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion() {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Move(NULL)");
        }
        write!(f, "Move({self} {:?} {:?}", self.piece(), self.flag())?;
        if let Some(kind) = self.captured() {
            write!(f, " x{kind:?}")?;
        }
        f.write_str(")")
    }
}
