//! Lox resolver: binds variable references to lexical-scope depths before execution.

pub mod resolver;

pub use resolver::{DepthTable, Resolver};

use lox_syntax::ast::Stmt;
use lox_syntax::diagnostic::Diagnostics;

/// Runs a fresh [`Resolver`] over `statements`.
pub fn resolve(statements: &[Stmt], table: &mut dyn DepthTable, diagnostics: &mut Diagnostics) {
    Resolver::new(table, diagnostics).resolve(statements);
}
