//! Position evaluation behind a single `evaluate(position)` contract.
//!
//! Every evaluator scores from White's point of view; the search flips the sign
//! for Black through [`relative`].

#[cfg(feature = "nnue")]
pub mod nnue;

#[cfg(feature = "nnue")]
use std::sync::Arc;

use aspira_core::Position;

/// A static evaluation function the search can be built around.
pub trait Evaluator: Send + Sync {
    /// Centipawns, positive when White is better.
    fn evaluate(&self, pos: &Position) -> i32;

    /// Short label for logs and `info string` output.
    fn name(&self) -> &'static str;
}

/// Tapered PeSTO material and piece-square score kept incrementally by the position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classic;

impl Evaluator for Classic {
    #[inline]
    fn evaluate(&self, pos: &Position) -> i32 {
        pos.evaluate()
    }

    fn name(&self) -> &'static str {
        "classic"
    }
}

/// Runtime choice between the built-in evaluators.
#[derive(Debug, Clone, Default)]
pub enum EvaluatorKind {
    #[default]
    Classic,
    #[cfg(feature = "nnue")]
    Nnue(Arc<nnue::Network>),
}

impl Evaluator for EvaluatorKind {
    #[inline]
    fn evaluate(&self, pos: &Position) -> i32 {
        match self {
            EvaluatorKind::Classic => Classic.evaluate(pos),
            #[cfg(feature = "nnue")]
            EvaluatorKind::Nnue(net) => net.evaluate(pos),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            EvaluatorKind::Classic => Classic.name(),
            #[cfg(feature = "nnue")]
            EvaluatorKind::Nnue(net) => net.name(),
        }
    }
}

/// Score from the side to move's point of view.
#[inline]
pub fn relative<E: Evaluator + ?Sized>(evaluator: &E, pos: &Position) -> i32 {
    evaluator.evaluate(pos) * pos.side_to_move().sign()
}
