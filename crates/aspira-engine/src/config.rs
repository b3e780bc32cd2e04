//! Engine construction settings.

use crate::eval::EvaluatorKind;

/// Transposition table size used when nothing else is asked for.
pub const DEFAULT_HASH_MB: usize = 16;

/// Settings a [`Searcher`](crate::Searcher) is built from.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Transposition table size in MiB.
    pub hash_mb: usize,
    pub evaluator: EvaluatorKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { hash_mb: DEFAULT_HASH_MB, evaluator: EvaluatorKind::Classic }
    }
}
