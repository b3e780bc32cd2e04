//! Zobrist keys, generated at compile time into one immutable table.

use crate::castling::CastlingRights;
use crate::color::Color;
use crate::piece::PieceKind;
use crate::square::Square;

/// Every random constant that feeds a position key.
pub struct ZobristKeys {
    /// Indexed `[color][kind][square]`.
    pieces: [[[u64; 64]; 6]; 2],
    /// One key per 4-bit rights combination.
    castling: [u64; 16],
    /// Indexed by the en-passant square's file.
    en_passant: [u64; 8],
    /// XORed in while White is to move.
    white_to_move: u64,
}

/// Process-wide key table.
pub static KEYS: ZobristKeys = ZobristKeys::generate(0x2025_5A0B_A5F1_7A00);

/// SplitMix64 step: returns the output and the advanced state.
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31), state)
}

impl ZobristKeys {
    const fn generate(seed: u64) -> ZobristKeys {
        let mut state = seed;
        let mut pieces = [[[0u64; 64]; 6]; 2];
        let mut color = 0;
        while color < 2 {
            let mut kind = 0;
            while kind < 6 {
                let mut sq = 0;
                while sq < 64 {
                    let (key, next) = splitmix64(state);
                    pieces[color][kind][sq] = key;
                    state = next;
                    sq += 1;
                }
                kind += 1;
            }
            color += 1;
        }

        let mut castling = [0u64; 16];
        let mut i = 0;
        while i < 16 {
            let (key, next) = splitmix64(state);
            castling[i] = key;
            state = next;
            i += 1;
        }

        let mut en_passant = [0u64; 8];
        let mut file = 0;
        while file < 8 {
            let (key, next) = splitmix64(state);
            en_passant[file] = key;
            state = next;
            file += 1;
        }

        let (white_to_move, _) = splitmix64(state);
        ZobristKeys { pieces, castling, en_passant, white_to_move }
    }

    #[inline]
    pub fn piece(&self, color: Color, kind: PieceKind, sq: Square) -> u64 {
        self.pieces[color.index()][kind.index()][sq.index()]
    }

    #[inline]
    pub fn castling(&self, rights: CastlingRights) -> u64 {
        self.castling[rights.bits() as usize]
    }

    #[inline]
    pub fn en_passant(&self, sq: Square) -> u64 {
        self.en_passant[sq.file() as usize]
    }

    #[inline]
    pub fn white_to_move(&self) -> u64 {
        self.white_to_move
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_distinct_and_nonzero() {
        let mut seen = HashSet::new();
        let all = KEYS
            .pieces
            .iter()
            .flatten()
            .flatten()
            .chain(KEYS.castling.iter())
            .chain(KEYS.en_passant.iter())
            .chain(std::iter::once(&KEYS.white_to_move));
        for &key in all {
            assert_ne!(key, 0);
            assert!(seen.insert(key), "duplicate key {key:#x}");
        }
        assert_eq!(seen.len(), 768 + 16 + 8 + 1);
    }

    #[test]
    fn accessors_index_the_right_tables() {
        assert_eq!(
            KEYS.piece(Color::Black, PieceKind::Queen, Square::D8),
            KEYS.pieces[1][4][59]
        );
        assert_eq!(KEYS.en_passant(Square::C6), KEYS.en_passant[2]);
        assert_eq!(KEYS.castling(CastlingRights::ALL), KEYS.castling[15]);
    }
}
