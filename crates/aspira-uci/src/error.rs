//! UCI protocol errors.

use aspira_core::{FenError, MoveParseError};

/// Errors that can occur during UCI protocol handling.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// Failed to parse a FEN string.
    #[error("invalid FEN \"{fen}\": {source}")]
    InvalidFen {
        fen: String,
        #[source]
        source: FenError,
    },

    /// A move in the `position` command is malformed or illegal.
    #[error("invalid move: {source}")]
    InvalidMove {
        #[from]
        source: MoveParseError,
    },

    /// A `go` parameter was given without its value.
    #[error("missing value for go {param}")]
    MissingGoValue { param: String },

    /// A `go` parameter value could not be parsed.
    #[error("invalid value for go {param}: {value}")]
    InvalidGoValue { param: String, value: String },

    /// `setoption` without a `name` clause.
    #[error("malformed setoption command")]
    MalformedOption,

    /// `setoption` named an option the engine does not have.
    #[error("unknown option: {name}")]
    UnknownOption { name: String },

    /// `setoption` gave a value outside the option's domain.
    #[error("invalid value for option {name}: {value}")]
    InvalidOptionValue { name: String, value: String },

    /// An I/O error occurred while reading from stdin.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
