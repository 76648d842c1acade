use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Extract just the filename from the path
        let filename = self
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_else(|| self.file.to_str().unwrap_or("<unknown>"));
        write!(f, "File: {} line {}", filename, self.line)
    }
}

struct MaybeLocation<'a>(&'a Option<Location>);

impl fmt::Display for MaybeLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(loc) => write!(f, "\n{}", loc),
            None => Ok(()),
        }
    }
}

/// Failures of the host: reading files, lexing, parsing, configuration.
///
/// These never become language values on their own; `load` wraps them into an
/// `Error` value and the binary prints them.
#[derive(Debug, Error)]
pub enum LangError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lex error: {}{}", .0, MaybeLocation(.1))]
    Lexer(String, Option<Location>),
    #[error("Parse error: {}{}", .0, MaybeLocation(.1))]
    Parser(String, Option<Location>),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type LangResult<T> = Result<T, LangError>;

/// Failures raised while evaluating. Each one is reported to the program as
/// a `Value::Error` carrying the rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Unbound Symbol '{0}'")]
    UnboundSymbol(String),
    #[error(
        "Function '{func}' passed incorrect type for argument {index}. Got {got}, Expected {expected}."
    )]
    WrongType {
        func: &'static str,
        index: usize,
        got: &'static str,
        expected: &'static str,
    },
    #[error("Function '{func}' passed incorrect number of arguments. Got {got}, Expected {expected}.")]
    ArityMismatch {
        func: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("Function '{func}' passed {{}} for argument {index}.")]
    EmptyList { func: &'static str, index: usize },
    #[error("Function '{func}' cannot define non-symbol. Got {got}, Expected Symbol.")]
    NonSymbol {
        func: &'static str,
        got: &'static str,
    },
    /// A lambda formal that is not a symbol.
    #[error("Cannot define non-symbol. Got {got}, Expected Symbol.")]
    NonSymbolFormal { got: &'static str },
    /// The operator position of a compound form held something other than a
    /// function.
    #[error("S-Expression starts with incorrect type. Got {got}, Expected Function.")]
    NotAFunction { got: &'static str },
    #[error("Function passed too many arguments. Got {given}, Expected {expected}.")]
    TooManyArguments { given: usize, expected: usize },
    #[error("Function format invalid. Symbol '&' not followed by single symbol.")]
    InvalidVariadic,
    #[error("Division By Zero!")]
    DivisionByZero,
    #[error("invalid number")]
    InvalidNumber(String),
    #[error("Could not load Library {0}")]
    LoadFailed(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

pub fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .chars()
        .filter(|&c| c == '\n')
        .count()
        + 1
}
