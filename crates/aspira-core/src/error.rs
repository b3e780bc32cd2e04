//! Errors for FEN input, position validation and move text.

/// Rejected FEN input. The target position is never modified when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, found {found}")]
    WrongFieldCount { found: usize },

    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount { found: usize },

    /// `rank` counts from the top of the diagram (0 = eighth rank).
    #[error("rank {rank} of the placement covers {length} squares, expected 8")]
    BadRankLength { rank: usize, length: usize },

    #[error("invalid piece character '{character}'")]
    InvalidPieceChar { character: char },

    #[error("invalid side to move \"{found}\"")]
    InvalidColor { found: String },

    #[error("invalid castling character '{character}'")]
    InvalidCastlingChar { character: char },

    #[error("invalid en passant square \"{found}\"")]
    InvalidEnPassant { found: String },

    #[error("invalid {field} \"{found}\"")]
    InvalidMoveCounter { field: &'static str, found: String },

    #[error("invalid position: {0}")]
    InvalidBoard(#[from] BoardError),
}

/// Structural problems that make a piece placement unplayable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("expected exactly one {color} king, found {count}")]
    KingCount { color: &'static str, count: u32 },

    #[error("pawn on the first or eighth rank")]
    PawnOnBackRank,

    #[error("the side not to move is in check")]
    OpponentInCheck,
}

/// Coordinate move text that does not name a legal move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    #[error("malformed move \"{text}\"")]
    Malformed { text: String },

    #[error("illegal move \"{text}\"")]
    Illegal { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            FenError::WrongFieldCount { found: 2 }.to_string(),
            "expected 4 to 6 FEN fields, found 2"
        );
        assert_eq!(
            MoveParseError::Illegal { text: "e2e5".into() }.to_string(),
            "illegal move \"e2e5\""
        );
    }

    #[test]
    fn board_error_converts_and_chains() {
        let err: FenError = BoardError::PawnOnBackRank.into();
        assert_eq!(err, FenError::InvalidBoard(BoardError::PawnOnBackRank));
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("pawn on the first or eighth rank"));
    }
}
