//! Error types for parsing and dumping nginx configurations.
//!
//! Errors are split by stage:
//!
//! - [`LexerError`] — failures during tokenization (unterminated strings).
//! - [`ParseError`] — failures during parsing, including forwarded lexer
//!   errors, wrapper-construction failures, and include-resolution errors.
//! - [`DumpError`] — failures while serializing a config back to text.
//!
//! Positioned errors carry the 1-based line and column in the source.

use std::path::PathBuf;
use thiserror::Error;

/// An error that occurs during tokenization (lexing).
///
/// The lexer is sticky: at most one terminal error is recorded, and the
/// parser surfaces it with priority over any syntax error it caused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerError {
    /// A quoted string was opened but never closed before end-of-file.
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

/// An error that occurs during parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A tokenization error propagated from the lexer.
    #[error("{0}")]
    Lexer(#[from] LexerError),

    /// A directive name not present in the known-directive tables.
    #[error("unknown directive '{name}' on line {line}, column {column}")]
    UnknownDirective {
        name: String,
        line: usize,
        column: usize,
    },

    /// The parser found a token that cannot appear in this position.
    #[error("unexpected token {kind} ({literal}) on line {line}, column {column}")]
    UnexpectedToken {
        kind: String,
        literal: String,
        line: usize,
        column: usize,
    },

    /// The input ended inside an unclosed block.
    #[error("unexpected eof in block")]
    UnexpectedEofInBlock,

    /// An include path appeared on the active include-resolution stack.
    #[error("include cycle detected for {}", .path.display())]
    IncludeCycle { path: PathBuf },

    /// A typed-wrapper constructor rejected the directive shape.
    #[error("{0}")]
    Wrapper(#[from] WrapperError),

    /// The include pattern was not a valid glob.
    #[error("{0}")]
    Pattern(#[from] glob::PatternError),

    /// A glob match could not be read.
    #[error("{0}")]
    Glob(#[from] glob::GlobError),

    /// A file could not be read from disk.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A typed-wrapper constructor failure.
///
/// Wrappers validate directive shape after the parser has consumed the
/// terminator; any failure aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapperError {
    #[error("include directive type error")]
    IncludeType,

    #[error("include directive requires exactly 1 parameter, got {0}")]
    IncludeParameterCount(usize),

    #[error("include directive cannot have a block; missing semicolon?")]
    IncludeBlock,

    #[error("upstream directive type error")]
    UpstreamType,

    #[error("upstream directive requires a name parameter")]
    UpstreamName,

    #[error("upstream directive must have a block")]
    UpstreamBlock,

    #[error("server directive type error")]
    ServerType,

    #[error("server directive must have a block")]
    ServerBlock,

    #[error("upstream server directive requires an address parameter")]
    UpstreamServerAddress,

    #[error("location directive type error")]
    LocationType,

    #[error("location directive requires a match parameter")]
    LocationMatch,

    #[error("http directive type error")]
    HttpType,

    #[error("http directive must have a block")]
    HttpBlock,

    #[error("map directive requires exactly 2 parameters, got {0}")]
    MapParameterCount(usize),

    #[error("map directive must have a block")]
    MapBlock,

    #[error("limit_req_zone directive requires key and zone parameters")]
    LimitReqZoneParameters,

    #[error("lua block directive must have a lua block")]
    LuaBlock,
}

/// An error that occurs while dumping a config back to source text.
#[derive(Debug, Error)]
pub enum DumpError {
    /// A raw `include` directive was found where a typed include was
    /// required for recursive writing.
    #[error("include directive type mismatch")]
    IncludeTypeMismatch,

    /// The Lua formatter rejected the code.
    #[error("lua formatter error: {0}")]
    LuaFormat(String),

    /// The Lua formatter panicked; the unwind was caught and converted.
    #[error("lua formatter panic: {0}")]
    LuaFormatterPanic(String),

    /// A file could not be written.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A strict finder encountered an `upstream` directive that was never
/// wrapped into the typed upstream variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected directive type for upstream at index {index}")]
pub struct UnexpectedUpstreamTypeError {
    /// Position of the offending directive in the found list.
    pub index: usize,
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for dumper operations.
pub type DumpResult<T> = Result<T, DumpError>;
