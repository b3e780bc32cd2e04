//! Neural evaluator: a (768 -> H) x 2 -> 1 SCReLU network loaded at runtime.
//!
//! Both accumulators are rebuilt from the board on every call.

mod accumulator;
mod features;
mod network;

use std::path::PathBuf;

use aspira_core::{Color, Position};

use self::accumulator::Accumulator;
use super::Evaluator;

pub use self::features::{FEATURES, feature_index};
pub use self::network::{MAX_HIDDEN, Network};

/// Failure to load a network file.
#[derive(Debug, thiserror::Error)]
pub enum NnueError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("network file is truncated ({len} bytes)")]
    Truncated { len: usize },
    #[error("network declares {0} input features, expected {FEATURES}")]
    FeatureCount(u32),
    #[error("network declares a hidden width of zero")]
    ZeroHidden,
    #[error("hidden width {hidden} exceeds the supported maximum of {max}")]
    HiddenTooWide { hidden: usize, max: usize },
    #[error("network with hidden width {hidden} should be {expected} bytes, found {actual}")]
    Size { hidden: usize, expected: usize, actual: usize },
}

impl Evaluator for Network {
    fn evaluate(&self, pos: &Position) -> i32 {
        let hidden = self.hidden();
        let white = Accumulator::refresh(pos, Color::White, self);
        let black = Accumulator::refresh(pos, Color::Black, self);
        let (us, them) = match pos.side_to_move() {
            Color::White => (&white, &black),
            Color::Black => (&black, &white),
        };
        let score = self.forward(&us.vals[..hidden], &them.vals[..hidden]);
        score * pos.side_to_move().sign()
    }

    fn name(&self) -> &'static str {
        "nnue"
    }
}

#[cfg(test)]
mod tests {
    use aspira_core::PieceKind;

    use super::*;

    /// File image of a one-neuron net that only counts the perspective's own queens.
    fn queen_counter() -> Vec<u8> {
        let hidden = 1usize;
        let mut words: Vec<i16> = vec![0; FEATURES * hidden];
        for sq in 0..64 {
            words[PieceKind::Queen.index() * 64 + sq] = 100;
        }
        words.extend([0i16]); // bias
        words.extend([64i16, -64]); // output weights
        words.push(0); // output bias

        let mut bytes = Vec::new();
        bytes.extend((hidden as u32).to_le_bytes());
        bytes.extend((FEATURES as u32).to_le_bytes());
        for w in words {
            bytes.extend(w.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn symmetric_position_scores_zero() {
        let net = Network::from_bytes(&queen_counter()).unwrap();
        assert_eq!(net.hidden(), 1);
        let pos = Position::startpos();
        assert_eq!(net.evaluate(&pos), 0);
        let black: Position = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1".parse().unwrap();
        assert_eq!(net.evaluate(&black), 0);
    }

    #[test]
    fn score_is_white_relative_for_both_movers() {
        let net = Network::from_bytes(&queen_counter()).unwrap();
        let white: Position = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse().unwrap();
        let black: Position = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1".parse().unwrap();
        let w = net.evaluate(&white);
        assert!(w > 0, "white is a queen up, got {w}");
        assert_eq!(net.evaluate(&black), w);
    }

    #[test]
    fn rejects_malformed_files() {
        let good = queen_counter();
        assert!(matches!(Network::from_bytes(&good[..5]), Err(NnueError::Truncated { len: 5 })));
        assert!(matches!(Network::from_bytes(&good[..good.len() - 2]), Err(NnueError::Size { .. })));

        let mut features = good.clone();
        features[4..8].copy_from_slice(&512u32.to_le_bytes());
        assert!(matches!(Network::from_bytes(&features), Err(NnueError::FeatureCount(512))));

        let mut zero = good.clone();
        zero[0..4].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(Network::from_bytes(&zero), Err(NnueError::ZeroHidden)));

        let mut wide = good;
        wide[0..4].copy_from_slice(&4096u32.to_le_bytes());
        assert!(matches!(Network::from_bytes(&wide), Err(NnueError::HiddenTooWide { hidden: 4096, .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Network::load("/nonexistent/aspira.nnue").unwrap_err();
        assert!(matches!(err, NnueError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/aspira.nnue"));
    }
}
