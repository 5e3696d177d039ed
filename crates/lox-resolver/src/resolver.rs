//! Static scope resolution.
//!
//! One pass over the tree before execution. Every local variable reference
//! and assignment gets the number of scopes between it and its declaration
//! written to a [`DepthTable`]; scope mistakes are reported as diagnostics
//! and never stop the pass.

use std::collections::HashMap;

use lox_syntax::ast::{Expr, ExprId, FunctionDecl, Stmt};
use lox_syntax::diagnostic::Diagnostics;
use lox_syntax::token::Token;

/// Side-table that receives binding depths, keyed by node identity.
pub trait DepthTable {
    fn record(&mut self, id: ExprId, depth: usize);
}

impl DepthTable for HashMap<ExprId, usize> {
    fn record(&mut self, id: ExprId, depth: usize) {
        self.insert(id, depth);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarKind {
    Local,
    // parameters and function names: born initialized, never "unused"
    Parameter,
}

#[derive(Debug)]
struct VarState {
    token: Token,
    kind: VarKind,
    initialized: bool,
    read: bool,
}

impl VarState {
    fn local(token: &Token) -> Self {
        Self {
            token: token.clone(),
            kind: VarKind::Local,
            initialized: false,
            read: false,
        }
    }

    fn parameter(token: &Token) -> Self {
        Self {
            token: token.clone(),
            kind: VarKind::Parameter,
            initialized: true,
            read: false,
        }
    }

    fn is_unused(&self) -> bool {
        self.kind == VarKind::Local && !self.read
    }
}

type Scope = HashMap<String, VarState>;

pub struct Resolver<'a> {
    table: &'a mut dyn DepthTable,
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<Scope>,
    current_function: FunctionKind,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a mut dyn DepthTable, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            table,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionKind::None,
        }
    }

    /// Resolves a program. The scope stack is dropped with the resolver.
    pub fn resolve(mut self, statements: &[Stmt]) {
        self.resolve_stmts(statements);
    }

    /// Resolves a lone expression at top level.
    pub fn resolve_expression(mut self, expr: &Expr) {
        self.resolve_expr(expr);
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                self.declare(name, VarState::local(name));
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.mark_initialized(name);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name, VarState::parameter(&decl.name));
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.diagnostics
                        .report(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Unary { operand, .. } => self.resolve_expr(operand),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Variable { id, name } => {
                if self.is_uninitialized_here(name) {
                    self.diagnostics
                        .report(name, "Can't read local variable in its own initializer.");
                }
                self.resolve_local(*id, name, true);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                // a write is not a use
                self.resolve_local(*id, name, false);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Sequence(elements) => {
                for e in elements {
                    self.resolve_expr(e);
                }
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing = std::mem::replace(&mut self.current_function, kind);
        self.begin_scope();
        for param in &decl.params {
            self.declare(param, VarState::parameter(param));
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();
        self.current_function = enclosing;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        let mut unused: Vec<&VarState> = scope.values().filter(|s| s.is_unused()).collect();
        unused.sort_by_key(|s| (s.token.line, s.token.col));
        for state in unused {
            self.diagnostics.report(&state.token, "Unused variable.");
        }
    }

    fn declare(&mut self, name: &Token, state: VarState) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.contains_key(&name.lexeme) {
            self.diagnostics
                .report(name, "Already a variable with this name in this scope.");
        }
        scope.insert(name.lexeme.clone(), state);
    }

    fn mark_initialized(&mut self, name: &Token) {
        if let Some(state) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            state.initialized = true;
        }
    }

    fn is_uninitialized_here(&self, name: &Token) -> bool {
        self.scopes
            .last()
            .and_then(|scope| scope.get(&name.lexeme))
            .is_some_and(|state| !state.initialized)
    }

    /// Innermost-first search; an unmatched name is left for the globals.
    fn resolve_local(&mut self, id: ExprId, name: &Token, read: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(state) = scope.get_mut(&name.lexeme) {
                tracing::trace!(name = %name.lexeme, line = name.line, depth, "resolved local");
                self.table.record(id, depth);
                if read {
                    state.read = true;
                }
                return;
            }
        }
        tracing::trace!(name = %name.lexeme, line = name.line, "left unresolved as global");
    }
}
