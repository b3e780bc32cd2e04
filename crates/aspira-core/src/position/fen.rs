//! FEN import and export for [`Position`].

use std::fmt;
use std::str::FromStr;

use crate::bitboard::Bitboard;
use crate::castling::{CastleSide, CastlePath, CastlingRights};
use crate::color::Color;
use crate::error::{BoardError, FenError};
use crate::piece::{Piece, PieceKind};
use crate::square::Square;

use super::{BoardState, Position};

/// The standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Parse a FEN with four to six fields. Missing move counters default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let mut state = BoardState::EMPTY;
        parse_placement(fields[0], &mut state)?;

        state.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidColor { found: other.to_string() }),
        };
        state.castling = parse_castling(fields[2])?;
        state.en_passant = parse_en_passant(fields[3], state.side_to_move)?;
        state.halfmove_clock = parse_counter(fields.get(4), "halfmove clock", 0)?;
        state.fullmove_number = parse_counter(fields.get(5), "fullmove number", 1)?.max(1);

        validate(&state)?;
        state.castling = playable_rights(&state);
        state.en_passant = state.en_passant.filter(|&ep| en_passant_playable(&state, ep));
        state.refresh();

        let pos = Position::from_state(state);
        if pos.is_king_in_check(!pos.side_to_move()) {
            return Err(BoardError::OpponentInCheck.into());
        }
        Ok(pos)
    }

    /// Replace this position with `fen`. On error the position is left untouched.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), FenError> {
        *self = Position::from_fen(fen)?;
        Ok(())
    }

    /// Six-field FEN of the current position.
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                match Square::from_coords(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }
        let ep = self.en_passant().map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{out} {} {} {ep} {} {}",
            self.side_to_move(),
            self.castling(),
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

fn parse_placement(text: &str, state: &mut BoardState) -> Result<(), FenError> {
    let ranks: Vec<&str> = text.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }
    for (row, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0usize;
        for c in rank_text.chars() {
            if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += skip as usize;
                continue;
            }
            let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
            let sq = u8::try_from(file)
                .ok()
                .and_then(|f| Square::from_coords(f, rank))
                .ok_or(FenError::BadRankLength { rank: row, length: file + 1 })?;
            state.put(piece, sq);
            file += 1;
        }
        if file != 8 {
            return Err(FenError::BadRankLength { rank: row, length: file });
        }
    }
    Ok(())
}

fn parse_castling(text: &str) -> Result<CastlingRights, FenError> {
    if text == "-" {
        return Ok(CastlingRights::NONE);
    }
    text.chars().try_fold(CastlingRights::NONE, |rights, c| {
        let flag = match c {
            'K' => CastlingRights::WHITE_KING,
            'Q' => CastlingRights::WHITE_QUEEN,
            'k' => CastlingRights::BLACK_KING,
            'q' => CastlingRights::BLACK_QUEEN,
            _ => return Err(FenError::InvalidCastlingChar { character: c }),
        };
        Ok(rights.with(flag))
    })
}

fn parse_en_passant(text: &str, side_to_move: Color) -> Result<Option<Square>, FenError> {
    if text == "-" {
        return Ok(None);
    }
    let expected_rank = match side_to_move {
        Color::White => 5,
        Color::Black => 2,
    };
    match Square::from_algebraic(text) {
        Some(sq) if sq.rank() == expected_rank => Ok(Some(sq)),
        _ => Err(FenError::InvalidEnPassant { found: text.to_string() }),
    }
}

fn parse_counter(text: Option<&&str>, field: &'static str, default: u16) -> Result<u16, FenError> {
    match text {
        None => Ok(default),
        Some(text) => text
            .parse()
            .map_err(|_| FenError::InvalidMoveCounter { field, found: text.to_string() }),
    }
}

fn validate(state: &BoardState) -> Result<(), BoardError> {
    for (color, name) in [(Color::White, "white"), (Color::Black, "black")] {
        let count = state.pieces[Piece::new(color, PieceKind::King).index()].count();
        if count != 1 {
            return Err(BoardError::KingCount { color: name, count });
        }
    }
    let pawns = state.pieces[Piece::new(Color::White, PieceKind::Pawn).index()]
        | state.pieces[Piece::new(Color::Black, PieceKind::Pawn).index()];
    if (pawns & (Bitboard::RANK_1 | Bitboard::RANK_8)).any() {
        return Err(BoardError::PawnOnBackRank);
    }
    Ok(())
}

/// An en-passant square is only kept when a double push could have produced it: the
/// enemy pawn stands just past it and both it and the pawn's origin square are empty.
fn en_passant_playable(state: &BoardState, ep: Square) -> bool {
    let push = state.side_to_move.push_delta();
    let victim = ep.offset(-push);
    let origin = ep.offset(push);
    let enemy_pawn = Piece::new(!state.side_to_move, PieceKind::Pawn);
    state.pieces[enemy_pawn.index()].contains(victim) && !state.all.contains(ep) && !state.all.contains(origin)
}

/// Drop rights whose king or rook is not on its home square.
fn playable_rights(state: &BoardState) -> CastlingRights {
    let mut rights = state.castling;
    for color in Color::ALL {
        for side in [CastleSide::King, CastleSide::Queen] {
            let path = CastlePath::of(color, side);
            let king_home = state.pieces[Piece::new(color, PieceKind::King).index()].contains(path.king_from);
            let rook_home = state.pieces[Piece::new(color, PieceKind::Rook).index()].contains(path.rook_from);
            if !(king_home && rook_home) {
                rights = rights.without(CastlingRights::flag(color, side));
            }
        }
    }
    rights
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Position, FenError> {
        Position::from_fen(fen)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for fen in [
            STARTING_FEN,
            "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r3k3/8/8/8/8/8/8/4K2R b Kq - 12 40",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
            assert_eq!(pos.to_string(), fen);
        }
    }

    #[test]
    fn startpos_matches_constructor() {
        let parsed = Position::from_fen(STARTING_FEN).unwrap();
        let built = Position::startpos();
        assert_eq!(parsed.key(), built.key());
        assert_eq!(parsed.to_fen(), built.to_fen());
    }

    #[test]
    fn missing_counters_default() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn rights_without_pieces_are_dropped() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w KQkq - 0 1").unwrap();
        assert_eq!(pos.castling(), CastlingRights::WHITE_KING);
    }

    #[test]
    fn key_and_terms_computed_on_load() {
        let pos = Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(pos.key(), pos.compute_key());
        let (mg, eg, phase) = pos.compute_terms();
        assert_eq!((pos.eval_mg(), pos.eval_eg(), pos.phase()), (mg, eg, phase));
    }

    #[test]
    fn errors() {
        let cases: [(&str, FenError); 9] = [
            ("8/8/8 w - - 0 1", FenError::WrongRankCount { found: 3 }),
            ("4k3/8/8/8/8/8/8/4K3", FenError::WrongFieldCount { found: 1 }),
            ("4k3/8/8/8/8/8/8/4K4 w - - 0 1", FenError::BadRankLength { rank: 7, length: 9 }),
            ("4k3/8/8/8/8/8/8/4X3 w - - 0 1", FenError::InvalidPieceChar { character: 'X' }),
            ("4k3/8/8/8/8/8/8/4K3 x - - 0 1", FenError::InvalidColor { found: "x".into() }),
            ("4k3/8/8/8/8/8/8/4K3 w Z - 0 1", FenError::InvalidCastlingChar { character: 'Z' }),
            ("4k3/8/8/8/8/8/8/4K3 w - e4 0 1", FenError::InvalidEnPassant { found: "e4".into() }),
            (
                "4k3/8/8/8/8/8/8/4K3 w - - x 1",
                FenError::InvalidMoveCounter { field: "halfmove clock", found: "x".into() },
            ),
            ("8/8/8/8/8/8/8/4K3 w - - 0 1", BoardError::KingCount { color: "black", count: 0 }.into()),
        ];
        for (fen, expected) in cases {
            assert_eq!(Position::from_fen(fen).unwrap_err(), expected, "{fen}");
        }
    }

    #[test]
    fn structural_errors() {
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/P3K3 w - - 0 1").unwrap_err(),
            FenError::InvalidBoard(BoardError::PawnOnBackRank)
        );
        assert_eq!(
            Position::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1").unwrap_err(),
            FenError::InvalidBoard(BoardError::OpponentInCheck)
        );
    }

    #[test]
    fn en_passant_without_a_pushed_pawn_is_dropped() {
        // No black pawn on d5, so d6 cannot be an en-passant target.
        let pos = Position::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.to_fen(), "4k3/8/8/4P3/8/8/8/4K3 w - - 0 1");
        assert_eq!(pos.key(), pos.compute_key());
        let moves: Vec<String> = crate::legal_moves(&pos).iter().map(|m| m.to_uci()).collect();
        assert!(!moves.contains(&"e5d6".to_string()), "{moves:?}");

        // Origin square occupied: the pawn cannot have just come from d7.
        let blocked = Position::from_fen("4k3/3n4/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(blocked.en_passant(), None);
        // Target square occupied.
        let occupied = Position::from_fen("4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(occupied.en_passant(), None);
    }

    #[test]
    fn genuine_en_passant_is_kept_and_playable() {
        let mut pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        assert_eq!(pos.en_passant(), Square::from_algebraic("d6"));
        let ep = pos.parse_uci_move("e5d6").unwrap();
        assert!(ep.is_en_passant());
        pos.play(ep);
        assert_eq!(pos.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 2");
        assert_eq!(pos.key(), pos.compute_key());
    }

    #[test]
    fn failed_load_leaves_position_untouched() {
        let mut pos = Position::startpos();
        assert!(pos.load_fen("not a fen").is_err());
        assert_eq!(pos.to_fen(), STARTING_FEN);
        pos.load_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.occupied().count(), 2);
    }
}
