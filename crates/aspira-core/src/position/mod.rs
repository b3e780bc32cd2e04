//! Bitboard position with incremental evaluation terms, Zobrist key and undo history.

mod fen;
mod history;
mod make_move;

use std::fmt;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::castling::CastlingRights;
use crate::color::Color;
use crate::piece::{Piece, PieceKind};
use crate::psqt::{self, MAX_PHASE};
use crate::square::Square;
use crate::zobrist::KEYS;

pub use self::fen::STARTING_FEN;
pub use self::history::HISTORY_CAPACITY;
pub use self::make_move::MoveUndo;

use self::history::HistoryStack;

/// Everything that changes when a move is made. Copied whole into the history stack.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoardState {
    /// Indexed by [`Piece::index`].
    pieces: [Bitboard; Piece::COUNT],
    occupancy: [Bitboard; 2],
    all: Bitboard,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    ply_count: u16,
    plies_from_null: u16,
    eval_mg: i32,
    eval_eg: i32,
    /// Raw phase weight sum; may exceed 24 after promotions.
    phase: i32,
    key: u64,
}

impl BoardState {
    pub(crate) const EMPTY: BoardState = BoardState {
        pieces: [Bitboard::EMPTY; Piece::COUNT],
        occupancy: [Bitboard::EMPTY; 2],
        all: Bitboard::EMPTY,
        side_to_move: Color::White,
        castling: CastlingRights::NONE,
        en_passant: None,
        halfmove_clock: 0,
        fullmove_number: 1,
        ply_count: 0,
        plies_from_null: 0,
        eval_mg: 0,
        eval_eg: 0,
        phase: 0,
        key: 0,
    };

    #[inline]
    fn put(&mut self, piece: Piece, sq: Square) {
        debug_assert!(!self.all.contains(sq), "put on occupied {sq}");
        let bb = sq.bitboard();
        self.pieces[piece.index()] |= bb;
        self.occupancy[piece.color().index()] |= bb;
        self.all |= bb;
        let t = psqt::terms(piece, sq);
        self.eval_mg += t.mg;
        self.eval_eg += t.eg;
        self.phase += psqt::phase_weight(piece.kind());
        self.key ^= KEYS.piece(piece.color(), piece.kind(), sq);
    }

    #[inline]
    fn remove(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.pieces[piece.index()].contains(sq), "no {piece:?} on {sq}");
        let bb = sq.bitboard();
        self.pieces[piece.index()] ^= bb;
        self.occupancy[piece.color().index()] ^= bb;
        self.all ^= bb;
        let t = psqt::terms(piece, sq);
        self.eval_mg -= t.mg;
        self.eval_eg -= t.eg;
        self.phase -= psqt::phase_weight(piece.kind());
        self.key ^= KEYS.piece(piece.color(), piece.kind(), sq);
    }

    #[inline]
    fn shift(&mut self, piece: Piece, from: Square, to: Square) {
        let bb = from.bitboard() | to.bitboard();
        self.pieces[piece.index()] ^= bb;
        self.occupancy[piece.color().index()] ^= bb;
        self.all ^= bb;
        let (a, b) = (psqt::terms(piece, from), psqt::terms(piece, to));
        self.eval_mg += b.mg - a.mg;
        self.eval_eg += b.eg - a.eg;
        self.key ^= KEYS.piece(piece.color(), piece.kind(), from)
            ^ KEYS.piece(piece.color(), piece.kind(), to);
    }

    /// Key recomputed from every feature of the state.
    fn key_from_scratch(&self) -> u64 {
        let mut key = 0u64;
        for piece in Piece::all() {
            for sq in self.pieces[piece.index()] {
                key ^= KEYS.piece(piece.color(), piece.kind(), sq);
            }
        }
        if self.side_to_move == Color::White {
            key ^= KEYS.white_to_move();
        }
        key ^= KEYS.castling(self.castling);
        if let Some(ep) = self.en_passant {
            key ^= KEYS.en_passant(ep);
        }
        key
    }

    /// `(mg, eg, raw phase)` recomputed from the piece placement.
    fn terms_from_scratch(&self) -> (i32, i32, i32) {
        let (mut mg, mut eg, mut phase) = (0, 0, 0);
        for piece in Piece::all() {
            for sq in self.pieces[piece.index()] {
                let t = psqt::terms(piece, sq);
                mg += t.mg;
                eg += t.eg;
                phase += psqt::phase_weight(piece.kind());
            }
        }
        (mg, eg, phase)
    }

    /// Derive key and evaluation terms after a bulk edit of the placement.
    fn refresh(&mut self) {
        let (mg, eg, phase) = self.terms_from_scratch();
        self.eval_mg = mg;
        self.eval_eg = eg;
        self.phase = phase;
        self.key = self.key_from_scratch();
    }
}

/// A chess position that is mutated in place by [`Position::make_move`] and restored by
/// [`Position::undo_move`].
#[derive(Clone)]
pub struct Position {
    state: BoardState,
    history: HistoryStack,
}

impl Position {
    /// The standard starting position.
    pub fn startpos() -> Position {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut state = BoardState::EMPTY;
        for (file, kind) in (0u8..).zip(BACK_RANK) {
            for (color, back, pawns) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
                if let (Some(sq), Some(pawn_sq)) =
                    (Square::from_coords(file, back), Square::from_coords(file, pawns))
                {
                    state.put(Piece::new(color, kind), sq);
                    state.put(Piece::new(color, PieceKind::Pawn), pawn_sq);
                }
            }
        }
        state.castling = CastlingRights::ALL;
        state.refresh();
        Position::from_state(state)
    }

    pub(crate) fn from_state(state: BoardState) -> Position {
        Position { state, history: HistoryStack::new() }
    }

    /// The piece on `sq`, if any.
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        if !self.state.all.contains(sq) {
            return None;
        }
        let color = if self.state.occupancy[0].contains(sq) { Color::White } else { Color::Black };
        PieceKind::ALL
            .into_iter()
            .map(|kind| Piece::new(color, kind))
            .find(|piece| self.state.pieces[piece.index()].contains(sq))
    }

    /// Squares holding `piece`.
    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.state.pieces[piece.index()]
    }

    /// Squares holding `kind` of the given color.
    #[inline]
    pub fn colored(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.state.pieces[Piece::new(color, kind).index()]
    }

    /// Squares holding `kind` of either color.
    #[inline]
    pub fn kind(&self, kind: PieceKind) -> Bitboard {
        self.colored(Color::White, kind) | self.colored(Color::Black, kind)
    }

    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.state.occupancy[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.state.all
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.state.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.state.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.state.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.state.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.state.fullmove_number
    }

    /// Plies made on this position since it was set up.
    #[inline]
    pub fn ply_count(&self) -> u16 {
        self.state.ply_count
    }

    /// Plies since the last null move (or since setup).
    #[inline]
    pub fn plies_from_null(&self) -> u16 {
        self.state.plies_from_null
    }

    /// Number of snapshots on the undo stack.
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.state.key
    }

    /// White-relative midgame term (material plus piece-square).
    #[inline]
    pub fn eval_mg(&self) -> i32 {
        self.state.eval_mg
    }

    #[inline]
    pub fn eval_eg(&self) -> i32 {
        self.state.eval_eg
    }

    /// Game phase in `[0, 24]`; 24 is the full opening material.
    #[inline]
    pub fn phase(&self) -> i32 {
        self.state.phase.clamp(0, MAX_PHASE)
    }

    /// Tapered material and piece-square score, White-relative.
    #[inline]
    pub fn evaluate(&self) -> i32 {
        psqt::taper(self.state.eval_mg, self.state.eval_eg, self.state.phase)
    }

    /// # Panics
    ///
    /// If `color` has no king, which only a corrupted position can produce.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        match self.colored(color, PieceKind::King).lsb() {
            Some(sq) => sq,
            None => panic!("no {color} king on the board"),
        }
    }

    /// Pieces of both colors attacking `sq`, with sliders seen through `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let diagonal = self.kind(PieceKind::Bishop) | self.kind(PieceKind::Queen);
        let straight = self.kind(PieceKind::Rook) | self.kind(PieceKind::Queen);
        (pawn_attacks(Color::Black, sq) & self.colored(Color::White, PieceKind::Pawn))
            | (pawn_attacks(Color::White, sq) & self.colored(Color::Black, PieceKind::Pawn))
            | (knight_attacks(sq) & self.kind(PieceKind::Knight))
            | (king_attacks(sq) & self.kind(PieceKind::King))
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight)
    }

    /// `true` if any piece of `by` attacks `sq`.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        self.is_square_attacked_through(sq, by, self.state.all)
    }

    pub(crate) fn is_square_attacked_through(&self, sq: Square, by: Color, occupied: Bitboard) -> bool {
        let them = |kind| self.colored(by, kind);
        (knight_attacks(sq) & them(PieceKind::Knight)).any()
            || (pawn_attacks(!by, sq) & them(PieceKind::Pawn)).any()
            || (king_attacks(sq) & them(PieceKind::King)).any()
            || (bishop_attacks(sq, occupied) & (them(PieceKind::Bishop) | them(PieceKind::Queen))).any()
            || (rook_attacks(sq, occupied) & (them(PieceKind::Rook) | them(PieceKind::Queen))).any()
    }

    pub fn is_king_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), !color)
    }

    /// Whether the side to move is in check.
    #[inline]
    pub fn is_in_check(&self) -> bool {
        self.is_king_in_check(self.state.side_to_move)
    }

    /// Enemy pieces giving check to the side to move.
    pub fn checkers(&self) -> Bitboard {
        let us = self.state.side_to_move;
        self.attackers_to(self.king_square(us), self.state.all) & self.side(!us)
    }

    /// `true` if `color` has a knight, bishop, rook or queen.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let pawns_and_king = self.colored(color, PieceKind::Pawn) | self.colored(color, PieceKind::King);
        (self.side(color) ^ pawns_and_king).any()
    }

    /// `true` once the current position has occurred twice before with the same side to
    /// move. The scan stops at the last irreversible move and at the last null move.
    pub fn is_threefold_repetition(&self) -> bool {
        let reach = usize::from(self.state.halfmove_clock.min(self.state.plies_from_null))
            .min(self.history.len());
        let mut seen = 0;
        for back in (2..=reach).step_by(2) {
            if self.history.key_back(back) == self.state.key {
                seen += 1;
                if seen >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// Fifty moves by each side without a capture or pawn move.
    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.state.halfmove_clock >= 100
    }

    /// Zobrist key recomputed from scratch; always equal to [`Position::key`].
    pub fn compute_key(&self) -> u64 {
        self.state.key_from_scratch()
    }

    /// `(mg, eg, phase)` recomputed from scratch; always equal to the incremental terms.
    pub fn compute_terms(&self) -> (i32, i32, i32) {
        let (mg, eg, phase) = self.state.terms_from_scratch();
        (mg, eg, phase.clamp(0, MAX_PHASE))
    }

    /// Multi-line board diagram with FEN and key.
    pub fn pretty(&self) -> Pretty<'_> {
        Pretty(self)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{}\")", self.to_fen())
    }
}

/// Display adapter returned by [`Position::pretty`].
pub struct Pretty<'a>(&'a Position);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.0;
        writeln!(f, " +---+---+---+---+---+---+---+---+")?;
        for rank in (0u8..8).rev() {
            for file in 0u8..8 {
                let c = Square::from_coords(file, rank)
                    .and_then(|sq| pos.piece_at(sq))
                    .map_or(' ', Piece::fen_char);
                write!(f, " | {c}")?;
            }
            writeln!(f, " | {}", rank + 1)?;
            writeln!(f, " +---+---+---+---+---+---+---+---+")?;
        }
        writeln!(f, "   a   b   c   d   e   f   g   h")?;
        writeln!(f)?;
        writeln!(f, "Fen: {}", pos.to_fen())?;
        write!(f, "Key: {:016X}", pos.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_layout() {
        let pos = Position::startpos();
        assert_eq!(pos.occupied().count(), 32);
        assert_eq!(pos.piece_at(Square::E1), Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(pos.piece_at(Square::D8), Some(Piece::new(Color::Black, PieceKind::Queen)));
        assert_eq!(pos.piece_at(Square::G7), Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert_eq!(pos.piece_at(Square::E4), None);
        assert_eq!(pos.king_square(Color::Black), Square::E8);
        assert_eq!(pos.castling(), CastlingRights::ALL);
    }

    #[test]
    fn startpos_is_balanced() {
        let pos = Position::startpos();
        assert_eq!(pos.eval_mg(), 0);
        assert_eq!(pos.eval_eg(), 0);
        assert_eq!(pos.evaluate(), 0);
        assert_eq!(pos.phase(), 24);
        assert_eq!(pos.key(), pos.compute_key());
    }

    #[test]
    fn attack_queries() {
        let pos = Position::startpos();
        assert!(pos.is_square_attacked(Square::F3, Color::White));
        assert!(!pos.is_square_attacked(Square::E4, Color::White));
        assert!(pos.is_square_attacked(Square::F6, Color::Black));
        assert!(!pos.is_in_check());
        assert!(pos.checkers().is_empty());
        assert!(pos.has_non_pawn_material(Color::White));
    }

    #[test]
    fn checkers_and_material() {
        let pos: Position = "4k3/8/8/8/8/8/4r3/4K2n w - - 0 1".parse().unwrap();
        assert!(pos.is_in_check());
        assert_eq!(pos.checkers(), Square::E2.bitboard());
        assert!(!pos.has_non_pawn_material(Color::White));
        assert!(pos.has_non_pawn_material(Color::Black));
        assert!(pos.is_king_in_check(Color::White));
        assert!(!pos.is_king_in_check(Color::Black));
    }

    #[test]
    fn attackers_to_sees_both_colors() {
        let pos: Position = "4k3/8/8/3p4/4P3/5N2/8/4K3 w - - 0 1".parse().unwrap();
        let attackers = pos.attackers_to(Square::D5, pos.occupied());
        assert_eq!(attackers, Square::E4.bitboard());
        let attackers = pos.attackers_to(Square::E4, pos.occupied());
        assert_eq!(attackers, Square::D5.bitboard());
    }

    #[test]
    fn pretty_print_has_diagram_and_fen() {
        let text = Position::startpos().pretty().to_string();
        assert!(text.contains("| r | n | b | q | k | b | n | r | 8"));
        assert!(text.contains("| R | N | B | Q | K | B | N | R | 1"));
        assert!(text.contains(&format!("Fen: {STARTING_FEN}")));
    }

    #[test]
    #[should_panic(expected = "no w king")]
    fn missing_king_panics() {
        let pos = Position::from_state(BoardState::EMPTY);
        let _ = pos.king_square(Color::White);
    }
}
