//! Board representation, move encoding and legal move generation.

pub mod attacks;
mod bitboard;
mod castling;
mod chess_move;
mod color;
mod error;
pub mod movegen;
mod notation;
mod perft;
mod piece;
mod position;
pub mod psqt;
mod square;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use castling::{CastlePath, CastleSide, CastlingRights};
pub use chess_move::{EMPTY, Move, MoveFlag};
pub use color::Color;
pub use error::{BoardError, FenError, MoveParseError};
pub use movegen::{MoveList, capture_moves, legal_moves};
pub use perft::{divide, perft};
pub use piece::{Piece, PieceKind};
pub use position::{HISTORY_CAPACITY, MoveUndo, Position, Pretty, STARTING_FEN};
pub use square::Square;
