//! Search and evaluation for aspira.

pub mod bench;
pub mod config;
pub mod eval;
pub mod search;
pub mod time;

pub use bench::{BENCH_DEPTH, BENCH_POSITIONS, BenchReport, run_bench, run_bench_on};
pub use config::{DEFAULT_HASH_MB, EngineConfig};
pub use eval::{Classic, Evaluator, EvaluatorKind, relative};
#[cfg(feature = "nnue")]
pub use eval::nnue::{Network, NnueError};
pub use search::control::SearchControl;
pub use search::negamax::{INF, MATE, MATE_BOUND, MAX_PLY};
pub use search::see::see_ge;
pub use search::tt::TranspositionTable;
pub use search::{MAX_DEPTH, PvLine, Score, SearchInfo, SearchResult, Searcher};
pub use time::{SearchLimits, compute_limits};
