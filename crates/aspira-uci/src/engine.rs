//! Event-driven UCI engine: commands on the main thread, searches on a worker.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Instant;

use tracing::{debug, info, warn};

use aspira_core::{Position, divide};
use aspira_engine::{EngineConfig, EvaluatorKind, PvLine, SearchInfo, SearchResult, Searcher, run_bench};

use crate::command::{Command, GoParams, HASH_MAX_MB, HASH_MIN_MB, UciOption, parse_command};
use crate::error::UciError;

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

/// Settings changed while the searcher was away on the worker thread.
#[derive(Default)]
struct Pending {
    clear: bool,
    resize_mb: Option<usize>,
    evaluator: Option<EvaluatorKind>,
}

/// The UCI engine: current position plus a searcher that is either at home
/// or lent to the search thread.
pub struct UciEngine {
    position: Position,
    searcher: Option<Searcher>,
    stop: Arc<AtomicBool>,
    pending: Pending,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let searcher = Searcher::from_config(config);
        Self {
            position: Position::startpos(),
            stop: searcher.stop_handle(),
            searcher: Some(searcher),
            pending: Pending::default(),
        }
    }

    fn is_searching(&self) -> bool {
        self.searcher.is_none()
    }

    /// Run the UCI event loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!(cmd = %trimmed, "received UCI command");
                if stdin_tx.send(EngineEvent::UciCommand(parse_command(trimmed))).is_err() {
                    return;
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(pos) => self.position = *pos,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::Perft(depth) => self.handle_perft(depth),
                    Command::Bench(depth) => self.handle_bench(depth),
                    Command::SetOption(opt) => self.handle_setoption(opt),
                    Command::Display => println!("{}", self.position.pretty()),
                    Command::Stop => self.stop.store(true, Ordering::Relaxed),
                    Command::Quit => {
                        if self.is_searching() {
                            self.stop.store(true, Ordering::Relaxed);
                            for ev in &rx {
                                if let EngineEvent::SearchDone(done) = ev {
                                    self.finish_search(done);
                                    break;
                                }
                            }
                        }
                        break;
                    }
                    Command::Unknown(cmd) => debug!(%cmd, "ignoring unknown command"),
                },
                EngineEvent::UciCommand(Err(e)) => warn!(error = %e, "UCI parse error"),
                EngineEvent::SearchDone(done) => self.finish_search(done),
                EngineEvent::InputClosed => break,
            }
        }

        info!("aspira shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name aspira {}", env!("CARGO_PKG_VERSION"));
        println!("id author the aspira developers");
        println!("option name Hash type spin default {} min {HASH_MIN_MB} max {HASH_MAX_MB}", aspira_engine::DEFAULT_HASH_MB);
        println!("option name Clear Hash type button");
        if cfg!(feature = "nnue") {
            println!("option name EvalFile type string default <empty>");
        }
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.position = Position::startpos();
        match self.searcher.as_mut() {
            Some(searcher) => searcher.flush(),
            None => self.pending.clear = true,
        }
    }

    fn handle_setoption(&mut self, option: UciOption) {
        match option {
            UciOption::Hash(mb) => match self.searcher.as_mut() {
                Some(searcher) => searcher.resize_tt(mb),
                None => self.pending.resize_mb = Some(mb),
            },
            UciOption::ClearHash => match self.searcher.as_mut() {
                Some(searcher) => searcher.flush(),
                None => self.pending.clear = true,
            },
            UciOption::EvalFile(path) => {
                let Some(evaluator) = load_evaluator(&path) else { return };
                match self.searcher.as_mut() {
                    Some(searcher) => searcher.set_evaluator(evaluator),
                    None => self.pending.evaluator = Some(evaluator),
                }
            }
        }
    }

    fn handle_perft(&mut self, depth: usize) {
        if self.is_searching() {
            warn!("perft received while searching, ignoring");
            return;
        }
        let start = Instant::now();
        let counts = divide(&mut self.position, depth);
        let total: u64 = counts.iter().map(|(_, n)| n).sum();
        for (mv, n) in &counts {
            println!("{mv}: {n}");
        }
        println!();
        println!("Nodes searched: {total}");
        debug!(depth, total, elapsed = ?start.elapsed(), "perft complete");
    }

    /// Runs on the main thread; input is queued until it finishes.
    fn handle_bench(&mut self, depth: u8) {
        let Some(searcher) = self.searcher.as_mut() else {
            warn!("bench received while searching, ignoring");
            return;
        };
        match run_bench(searcher, depth) {
            Ok(report) => println!("{report}"),
            Err(e) => warn!(error = %e, "bench position rejected"),
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if let Some(depth) = params.perft {
            self.handle_perft(depth);
            return;
        }
        let Some(mut searcher) = self.searcher.take() else {
            warn!("go received while searching, ignoring");
            return;
        };

        // A stop left over from the previous search must not end this one.
        self.stop.store(false, Ordering::Relaxed);

        let limits = params.limits();
        let mut position = self.position.clone();
        let tx = tx.clone();
        debug!(?limits, "starting search");

        std::thread::spawn(move || {
            let result = searcher.search_with_info(&mut position, &limits, |info| {
                println!("{}", info_line(info));
            });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, searcher }));
        });
    }

    fn finish_search(&mut self, done: SearchDone) {
        let mut searcher = done.searcher;
        let pending = std::mem::take(&mut self.pending);

        if let Some(mb) = pending.resize_mb {
            // A fresh allocation is already empty.
            searcher.resize_tt(mb);
        } else if pending.clear {
            searcher.flush();
        }
        if let Some(evaluator) = pending.evaluator {
            searcher.set_evaluator(evaluator);
        }

        self.searcher = Some(searcher);
        println!("{}", bestmove_line(&done.result));
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "nnue")]
fn load_evaluator(path: &str) -> Option<EvaluatorKind> {
    if path.is_empty() {
        return Some(EvaluatorKind::Classic);
    }
    match aspira_engine::Network::load(path) {
        Ok(net) => {
            info!(path, hidden = net.hidden(), "loaded network");
            Some(EvaluatorKind::Nnue(Arc::new(net)))
        }
        Err(e) => {
            warn!(error = %e, "keeping the current evaluator");
            println!("info string {e}");
            None
        }
    }
}

#[cfg(not(feature = "nnue"))]
fn load_evaluator(path: &str) -> Option<EvaluatorKind> {
    if !path.is_empty() {
        warn!(path, "built without nnue support, ignoring EvalFile");
    }
    None
}

/// `info ...` line for one completed iteration.
pub fn info_line(info: &SearchInfo) -> String {
    format!(
        "info depth {} seldepth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
        info.depth,
        info.seldepth,
        info.score,
        info.nodes,
        info.nps,
        info.time.as_millis(),
        info.hashfull,
        PvLine(&info.pv),
    )
}

/// `bestmove ...` line for a finished search; `0000` when there is no legal move.
pub fn bestmove_line(result: &SearchResult) -> String {
    match (result.best_move, result.ponder) {
        (None, _) => "bestmove 0000".to_string(),
        (Some(best), Some(ponder)) => format!("bestmove {best} ponder {ponder}"),
        (Some(best), None) => format!("bestmove {best}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aspira_engine::{Score, SearchLimits};

    use super::*;

    fn result_for(fen: &str, depth: u8) -> SearchResult {
        let mut pos: Position = fen.parse().unwrap();
        Searcher::default().search(&mut pos, &SearchLimits::fixed_depth(depth))
    }

    #[test]
    fn info_line_reports_every_field() {
        let pos = Position::startpos();
        let info = SearchInfo {
            depth: 7,
            seldepth: 11,
            score: Score::Cp(-23),
            nodes: 12_345,
            nps: 600_000,
            time: Duration::from_millis(20),
            hashfull: 3,
            pv: vec![pos.parse_uci_move("e2e4").unwrap(), pos.parse_uci_move("d2d4").unwrap()],
        };
        assert_eq!(
            info_line(&info),
            "info depth 7 seldepth 11 score cp -23 nodes 12345 nps 600000 time 20 hashfull 3 pv e2e4 d2d4"
        );
    }

    #[test]
    fn info_line_mate_score() {
        let info = SearchInfo {
            depth: 2,
            seldepth: 2,
            score: Score::Mate(-1),
            nodes: 1,
            nps: 1,
            time: Duration::ZERO,
            hashfull: 0,
            pv: Vec::new(),
        };
        assert!(info_line(&info).contains("score mate -1 "));
    }

    #[test]
    fn bestmove_without_legal_move_is_null() {
        let result = result_for("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 2);
        assert_eq!(bestmove_line(&result), "bestmove 0000");
    }

    #[test]
    fn bestmove_of_a_mate_in_one() {
        let result = result_for("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 3);
        assert_eq!(bestmove_line(&result), "bestmove a1a8");
    }

    #[test]
    fn bestmove_includes_ponder_when_known() {
        let result = result_for("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3", 4);
        let line = bestmove_line(&result);
        assert!(line.starts_with("bestmove "));
        if result.pv.len() > 1 {
            assert!(line.contains(" ponder "), "{line}");
        }
    }

    #[test]
    fn options_apply_while_idle() {
        let mut engine = UciEngine::new();
        engine.handle_setoption(UciOption::Hash(2));
        engine.handle_setoption(UciOption::ClearHash);
        engine.handle_setoption(UciOption::EvalFile(String::new()));
        assert!(!engine.is_searching());
        assert!(engine.pending.evaluator.is_none());
        assert!(!engine.pending.clear);
    }

    #[cfg(feature = "nnue")]
    #[test]
    fn missing_network_keeps_the_evaluator() {
        assert!(load_evaluator("/definitely/not/a/net.bin").is_none());
        assert!(matches!(load_evaluator(""), Some(EvaluatorKind::Classic)));
    }

    #[test]
    fn settings_are_deferred_while_searching() {
        let mut engine = UciEngine::new();
        let searcher = engine.searcher.take().unwrap();
        engine.handle_setoption(UciOption::Hash(4));
        engine.handle_ucinewgame();
        assert_eq!(engine.pending.resize_mb, Some(4));
        assert!(engine.pending.clear);

        let result = result_for("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 1);
        engine.finish_search(SearchDone { result, searcher });
        assert!(!engine.is_searching());
        assert!(engine.pending.resize_mb.is_none());
        assert!(!engine.pending.clear);
    }
}
