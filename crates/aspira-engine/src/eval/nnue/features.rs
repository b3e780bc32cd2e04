//! 768-input feature mapping, relative to one perspective.

use aspira_core::{Color, PieceKind, Square};

/// Inputs per perspective: 2 colors x 6 kinds x 64 squares.
pub const FEATURES: usize = 768;

/// Input index of a piece as seen from `perspective`.
///
/// Layout, with squares mirrored vertically for the Black perspective:
/// - own pieces: `kind * 64 + sq` (0..384)
/// - enemy pieces: `384 + kind * 64 + sq` (384..768)
#[inline]
pub fn feature_index(perspective: Color, piece_color: Color, kind: PieceKind, sq: Square) -> usize {
    let sq = match perspective {
        Color::White => sq.index(),
        Color::Black => sq.index() ^ 56,
    };
    let side = if piece_color == perspective { 0 } else { 384 };
    side + kind.index() * 64 + sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_cover_the_input_range() {
        let mut seen = vec![false; FEATURES];
        for perspective in Color::ALL {
            for color in Color::ALL {
                for kind in PieceKind::ALL {
                    for sq in Square::all() {
                        let idx = feature_index(perspective, color, kind, sq);
                        assert!(idx < FEATURES);
                        if perspective == Color::White {
                            assert!(!seen[idx], "duplicate index {idx}");
                            seen[idx] = true;
                        }
                    }
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn perspectives_mirror_each_other() {
        let white = feature_index(Color::White, Color::White, PieceKind::Knight, Square::G1);
        let black = feature_index(Color::Black, Color::Black, PieceKind::Knight, Square::G8);
        assert_eq!(white, black);
        assert_eq!(feature_index(Color::White, Color::Black, PieceKind::Pawn, Square::A1), 384);
    }
}
