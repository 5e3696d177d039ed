//! Error type shared by the lexer and the evaluator.
//!
//! Lexing and execution stop at the first problem and hand back an
//! [`Error`] through the crate's [`Result`] alias. The parser and resolver
//! do not use this type: they report into [`Diagnostics`](crate::Diagnostics)
//! so that one pass can surface several problems.
//!
//! # Examples
//!
//! ```rust
//! use lox_syntax::error::{error, Error, Result};
//!
//! fn check_divisor(d: f64) -> Result<f64> {
//!     if d == 0.0 {
//!         error("Division by zero.")
//!     } else {
//!         Ok(d)
//!     }
//! }
//!
//! let located = Error::with_span("Unterminated string.", 3, 9);
//! assert_eq!(located.to_string(), "Unterminated string. at 3:9");
//! assert!(check_divisor(0.0).is_err());
//! ```

use thiserror::Error;

use crate::token::Token;

/// An error raised while scanning or running Lox code.
///
/// # Fields
///
/// - `msg`: human-readable description
/// - `line`: optional 1-based line in the source
/// - `col`: optional 1-based column in the source
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{msg}{}", span_suffix(.line, .col))]
pub struct Error {
    pub msg: String,
    pub line: Option<usize>,
    pub col: Option<usize>,
}

fn span_suffix(line: &Option<usize>, col: &Option<usize>) -> String {
    match (line, col) {
        (Some(l), Some(c)) => format!(" at {}:{}", l, c),
        _ => String::new(),
    }
}

impl Error {
    /// Creates an error without source location.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            line: None,
            col: None,
        }
    }

    /// Creates an error at a 1-based line and column.
    pub fn with_span(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            msg: msg.into(),
            line: Some(line),
            col: Some(col),
        }
    }

    /// Creates an error located at `token`.
    pub fn at_token(token: &Token, msg: impl Into<String>) -> Self {
        Self::with_span(msg, token.line, token.col)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for Lox operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Shorthand for `Err(Error::with_span(msg, line, col))`.
pub fn error_at<T>(line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::with_span(msg, line, col))
}
