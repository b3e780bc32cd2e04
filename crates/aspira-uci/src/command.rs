//! UCI command parsing.

use std::time::Duration;

use aspira_core::Position;
use aspira_engine::{BENCH_DEPTH, SearchLimits};

use crate::error::UciError;

/// Bounds of the `Hash` option, in MiB.
pub const HASH_MIN_MB: usize = 1;
pub const HASH_MAX_MB: usize = 65_536;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches until `stop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u8>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search until `stop` (no time limit).
    pub infinite: bool,
    /// `go perft <depth>`: count leaves instead of searching.
    pub perft: Option<usize>,
}

impl GoParams {
    /// Search limits for these parameters.
    ///
    /// A `go` that names no limit at all is treated as infinite.
    pub fn limits(&self) -> SearchLimits {
        let unbounded = self.wtime.is_none()
            && self.btime.is_none()
            && self.movetime.is_none()
            && self.depth.is_none()
            && self.nodes.is_none();
        SearchLimits {
            wtime: self.wtime,
            btime: self.btime,
            winc: self.winc,
            binc: self.binc,
            movetime: self.movetime,
            movestogo: self.movestogo,
            depth: self.depth,
            nodes: self.nodes,
            infinite: self.infinite || unbounded,
        }
    }
}

/// A `setoption` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciOption {
    /// Transposition table size in MiB.
    Hash(usize),
    /// Empty the transposition table and ordering tables.
    ClearHash,
    /// Network file for the neural evaluator; empty selects the classic one.
    EvalFile(String),
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- a position with the listed moves already played.
    Position(Box<Position>),
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    /// `perft <depth>` -- per-move leaf counts of the current position.
    Perft(usize),
    /// `bench [depth]` -- fixed-depth search over the built-in positions.
    Bench(u8),
    /// `setoption name <id> [value <x>]`.
    SetOption(UciOption),
    /// `d` -- print the current position.
    Display,
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command (ignored).
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "d" => Ok(Command::Display),
        "position" => parse_position(rest),
        "go" => parse_go(rest),
        "setoption" => parse_setoption(rest),
        "perft" => Ok(Command::Perft(parse_int(rest.first(), "perft")?)),
        "bench" => match rest.first() {
            None => Ok(Command::Bench(BENCH_DEPTH)),
            token => Ok(Command::Bench(parse_int(token, "bench")?)),
        },
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
    let (setup, moves) = tokens.split_at(moves_at);

    let mut pos = match setup {
        ["startpos"] => Position::startpos(),
        ["fen", fields @ ..] => {
            let fen = fields.join(" ");
            Position::from_fen(&fen).map_err(|source| UciError::InvalidFen { fen, source })?
        }
        _ => return Err(UciError::MalformedPosition),
    };

    for text in moves.iter().skip(1) {
        let mv = pos.parse_uci_move(text)?;
        pos.play(mv);
    }

    Ok(Command::Position(Box::new(pos)))
}

/// Parse the `go` command arguments. Unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movestogo" => params.movestogo = Some(parse_int(value, "movestogo")?),
            "depth" => params.depth = Some(parse_int(value, "depth")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "nodes" => params.nodes = Some(parse_int(value, "nodes")?),
            "perft" => params.perft = Some(parse_int(value, "perft")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(params))
}

/// Parse `name <id...> [value <x...>]`. Option names are case-insensitive.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some((&"name", rest)) = tokens.split_first() else {
        return Err(UciError::MalformedOption);
    };
    let value_at = rest.iter().position(|&t| t == "value");
    let (name_tokens, value) = match value_at {
        Some(at) => (&rest[..at], rest[at + 1..].join(" ")),
        None => (rest, String::new()),
    };
    let name = name_tokens.join(" ");
    if name.is_empty() {
        return Err(UciError::MalformedOption);
    }

    let option = match name.to_ascii_lowercase().as_str() {
        "hash" => {
            let invalid = || UciError::InvalidOptionValue { name: name.clone(), value: value.clone() };
            let mb: usize = value.parse().map_err(|_| invalid())?;
            if !(HASH_MIN_MB..=HASH_MAX_MB).contains(&mb) {
                return Err(invalid());
            }
            UciOption::Hash(mb)
        }
        "clear hash" => UciOption::ClearHash,
        "evalfile" => {
            let path = if value == "<empty>" { String::new() } else { value };
            UciOption::EvalFile(path)
        }
        _ => return Err(UciError::UnknownOption { name }),
    };
    Ok(Command::SetOption(option))
}

fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    // GUIs occasionally send a negative clock after a flag; treat it as no time left.
    let value = token.ok_or_else(|| UciError::MissingGoValue { param: param.to_string() })?;
    let ms: i64 = value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue { param: param.to_string() })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn go(line: &str) -> GoParams {
        match parse_command(line).unwrap() {
            Command::Go(params) => params,
            other => panic!("expected Go, got {other:?}"),
        }
    }

    fn position(line: &str) -> Position {
        match parse_command(line).unwrap() {
            Command::Position(pos) => *pos,
            other => panic!("expected Position, got {other:?}"),
        }
    }

    fn option(line: &str) -> UciOption {
        match parse_command(line).unwrap() {
            Command::SetOption(opt) => opt,
            other => panic!("expected SetOption, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(parse_command("ucinewgame").unwrap(), Command::UciNewGame));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
        assert!(matches!(parse_command("d").unwrap(), Command::Display));
        assert!(matches!(parse_command("  isready  ").unwrap(), Command::IsReady));
    }

    #[test]
    fn parse_position_startpos() {
        assert_eq!(position("position startpos").to_fen(), Position::startpos().to_fen());
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let pos = position("position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(pos.to_fen(), "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2");
        assert_eq!(pos.history_len(), 3);
    }

    #[test]
    fn parse_position_fen() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        assert_eq!(position(&format!("position fen {fen}")).to_fen(), fen);
    }

    #[test]
    fn parse_position_fen_with_promotion() {
        let pos = position("position fen 4k3/P7/8/8/8/8/8/4K3 w - - 0 1 moves a7a8q");
        assert_eq!(pos.to_fen(), "Q3k3/8/8/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn parse_position_errors() {
        assert!(matches!(parse_command("position"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position moves e2e4"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position fen invalid"), Err(UciError::InvalidFen { .. })));
        assert!(matches!(
            parse_command("position startpos moves e2e5"),
            Err(UciError::InvalidMove { .. })
        ));
        assert!(matches!(
            parse_command("position startpos moves e2"),
            Err(UciError::InvalidMove { .. })
        ));
    }

    #[test]
    fn parse_go_depth() {
        assert_eq!(go("go depth 6").depth, Some(6));
    }

    #[test]
    fn parse_go_bare_is_infinite() {
        let params = go("go");
        assert_eq!(params, GoParams::default());
        assert!(params.limits().infinite);
    }

    #[test]
    fn parse_go_clock() {
        let params = go("go wtime 300000 btime 300000 winc 2000 binc 2000 movestogo 20");
        assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(params.btime, Some(Duration::from_millis(300_000)));
        assert_eq!(params.winc, Some(Duration::from_millis(2000)));
        assert_eq!(params.binc, Some(Duration::from_millis(2000)));
        assert_eq!(params.movestogo, Some(20));
        let limits = params.limits();
        assert!(!limits.infinite);
        assert_eq!(limits.wtime, params.wtime);
        assert_eq!(limits.movestogo, Some(20));
    }

    #[test]
    fn parse_go_negative_clock() {
        assert_eq!(go("go wtime -150 btime 1000").wtime, Some(Duration::ZERO));
    }

    #[test]
    fn parse_go_movetime_nodes_infinite() {
        assert_eq!(go("go movetime 5000").movetime, Some(Duration::from_millis(5000)));
        assert_eq!(go("go nodes 1000000").nodes, Some(1_000_000));
        assert!(go("go infinite").infinite);
        assert_eq!(go("go nodes 500").limits().nodes, Some(500));
    }

    #[test]
    fn parse_go_perft() {
        assert_eq!(go("go perft 3").perft, Some(3));
        assert!(matches!(parse_command("perft 4").unwrap(), Command::Perft(4)));
        assert!(parse_command("perft").is_err());
    }

    #[test]
    fn parse_bench() {
        assert!(matches!(parse_command("bench").unwrap(), Command::Bench(BENCH_DEPTH)));
        assert!(matches!(parse_command("bench 4").unwrap(), Command::Bench(4)));
        assert!(parse_command("bench deep").is_err());
    }

    #[test]
    fn parse_go_skips_unknown_tokens() {
        let params = go("go ponder searchmoves e2e4 depth 3");
        assert_eq!(params.depth, Some(3));
    }

    #[test]
    fn parse_go_value_errors() {
        assert!(matches!(parse_command("go wtime"), Err(UciError::MissingGoValue { .. })));
        assert!(matches!(parse_command("go depth abc"), Err(UciError::InvalidGoValue { .. })));
    }

    #[test]
    fn parse_setoption_hash() {
        assert_eq!(option("setoption name Hash value 64"), UciOption::Hash(64));
        assert_eq!(option("setoption name hash value 1"), UciOption::Hash(1));
        assert!(matches!(
            parse_command("setoption name Hash value 0"),
            Err(UciError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            parse_command("setoption name Hash value lots"),
            Err(UciError::InvalidOptionValue { .. })
        ));
    }

    #[test]
    fn parse_setoption_button_and_strings() {
        assert_eq!(option("setoption name Clear Hash"), UciOption::ClearHash);
        assert_eq!(
            option("setoption name EvalFile value /nets/my net.bin"),
            UciOption::EvalFile("/nets/my net.bin".to_string())
        );
        assert_eq!(option("setoption name EvalFile value <empty>"), UciOption::EvalFile(String::new()));
        assert_eq!(option("setoption name EvalFile"), UciOption::EvalFile(String::new()));
    }

    #[test]
    fn parse_setoption_errors() {
        assert!(matches!(parse_command("setoption"), Err(UciError::MalformedOption)));
        assert!(matches!(parse_command("setoption name"), Err(UciError::MalformedOption)));
        assert!(matches!(
            parse_command("setoption name Threads value 4"),
            Err(UciError::UnknownOption { .. })
        ));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert!(matches!(parse_command("foobar").unwrap(), Command::Unknown(_)));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
    }
}
