//! Diagnostic sink shared by the parser and the resolver.
//!
//! Reporting never alters control flow: the parser decides separately
//! whether to unwind, the resolver always keeps going.

use std::fmt;

use crate::token::Token;

/// One reported problem, already formatted in the Lox style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub col: Option<usize>,
    /// `" at 'x'"`, `" at end"` or empty for line-only reports.
    pub location: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.location, self.message)
    }
}

/// Ordered collection of diagnostics for one run of the front end.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem located at `token`.
    pub fn report(&mut self, token: &Token, message: impl Into<String>) {
        let location = if token.is_eof() {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        self.push(Diagnostic {
            line: token.line,
            col: Some(token.col),
            location,
            message: message.into(),
        });
    }

    /// Records a problem known only by line.
    pub fn report_line(&mut self, line: usize, message: impl Into<String>) {
        self.push(Diagnostic {
            line,
            col: None,
            location: String::new(),
            message: message.into(),
        });
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "reported");
        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Messages only, in report order.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.message.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
