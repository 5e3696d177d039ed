//! Main interpreter engine.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use lox_resolver::DepthTable;
use lox_syntax::ast::*;
use lox_syntax::error::{Error, Result};
use lox_syntax::token::{Token, TokenKind};

use crate::env::{EnvId, Environments};
use crate::flow::Flow;
use crate::function::{natives, Callable, Function};
use crate::value::Value;

/// Deepest `execute`/`evaluate` nesting before reporting a stack overflow.
///
/// Sized so that [`STACK_SIZE`] leaves well over 16 KiB of native stack per
/// level, debug builds included.
pub const MAX_NESTING: usize = 2048;

/// Native stack a thread needs to run the interpreter up to [`MAX_NESTING`].
pub const STACK_SIZE: usize = 64 * 1024 * 1024;

/// Tree-walking evaluator.
///
/// Recursion is bounded by [`MAX_NESTING`]; run it on a thread with at
/// least [`STACK_SIZE`] of stack so the bound is reached before the native
/// stack runs out.
pub struct Interpreter {
    environments: Environments,
    /// Frame the current statement runs in
    environment: EnvId,
    /// Binding depths written by the resolver
    locals: HashMap<ExprId, usize>,
    /// Current `execute`/`evaluate` recursion depth
    depth: usize,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthTable for Interpreter {
    fn record(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` writes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let environments = Environments::new();
        let environment = environments.globals();
        let mut interp = Self {
            environments,
            environment,
            locals: HashMap::new(),
            depth: 0,
            out,
        };
        interp.define_natives();
        interp
    }

    fn define_natives(&mut self) {
        let globals = self.environments.globals();
        for native in natives() {
            let name = native.name;
            self.environments
                .define(globals, name, Value::Native(Rc::new(native)));
        }
        self.environment = globals;
    }

    /// Drops all globals, frames and resolved depths.
    pub fn reset(&mut self) {
        self.environments = Environments::new();
        self.locals.clear();
        self.depth = 0;
        self.define_natives();
    }

    pub fn globals_snapshot(&self) -> Vec<(String, Value)> {
        self.environments.vars_snapshot(self.environments.globals())
    }

    /// Live environment frames, globals included.
    pub fn frame_count(&self) -> usize {
        self.environments.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.locals.len()
    }

    pub(crate) fn environments_mut(&mut self) -> &mut Environments {
        &mut self.environments
    }

    /// Runs resolved top-level statements.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }
        self.out
            .flush()
            .map_err(|e| Error::new(format!("IO error: {}", e)))
    }

    /// Evaluates a resolved expression at top level.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value> {
        self.evaluate(expr)
    }

    /// Runs `statements` in `env`, then restores the current frame.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], env: EnvId) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, env);
        let mut outcome = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }
        self.environment = previous;
        self.environments.release(env);
        outcome
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(Error::new("Stack overflow."));
        }
        self.depth += 1;
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        self.enter()?;
        let flow = self.execute_stmt(stmt);
        self.depth -= 1;
        flow
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        self.enter()?;
        let value = self.evaluate_expr(expr);
        self.depth -= 1;
        value
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(|e| Error::new(format!("IO error: {}", e)))?;
                Ok(Flow::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.environments
                    .define(self.environment, name.lexeme.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Block(statements) => {
                let env = self.environments.new_frame(Some(self.environment));
                self.execute_block(statements, env)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(v) = self.execute(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                self.environments.capture(self.environment);
                let function = Function::new(Rc::clone(decl), self.environment);
                self.environments.define(
                    self.environment,
                    decl.name.lexeme.clone(),
                    Value::Function(Rc::new(function)),
                );
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(Value::from(lit)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { operator, operand } => {
                let right = self.evaluate(operand)?;
                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(Error::at_token(operator, "Operand must be a number.")),
                    },
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(unknown_operator(operator)),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                binary(operator, l, r)
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let l = self.evaluate(left)?;
                let short_circuit = match operator.kind {
                    TokenKind::Or => l.is_truthy(),
                    _ => !l.is_truthy(),
                };
                if short_circuit {
                    Ok(l)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Variable { id, name } => self.look_up_variable(*id, name),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&depth) => {
                        self.environments
                            .assign_at(self.environment, depth, name, value.clone())?
                    }
                    None => {
                        let globals = self.environments.globals();
                        self.environments.assign(globals, name, value.clone())?
                    }
                }
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }
                self.call_value(&callee, paren, args)
            }
            Expr::Sequence(elements) => {
                let mut last = Value::Nil;
                for e in elements {
                    last = self.evaluate(e)?;
                }
                Ok(last)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&depth) => self.environments.get_at(self.environment, depth, name),
            None => self.environments.get(self.environments.globals(), name),
        }
    }

    fn call_value(&mut self, callee: &Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        let (callable, name): (&dyn Callable, &str) = match callee {
            Value::Function(f) => (f.as_ref(), f.name()),
            Value::Native(n) => (n.as_ref(), n.name),
            _ => return Err(Error::at_token(paren, "Can only call functions.")),
        };
        if args.len() != callable.arity() {
            return Err(Error::at_token(
                paren,
                format!("Expected {} arguments but got {}.", callable.arity(), args.len()),
            ));
        }
        tracing::trace!(function = name, arity = args.len(), line = paren.line, "call");
        match callable.call(self, args) {
            // the innermost call site locates errors raised without a span
            Err(e) if e.line.is_none() => Err(Error::at_token(paren, e.msg)),
            other => other,
        }
    }
}

fn binary(operator: &Token, l: Value, r: Value) -> Result<Value> {
    use TokenKind::*;
    match (operator.kind, l, r) {
        (EqEq, a, b) => Ok(Value::Bool(a == b)),
        (NotEq, a, b) => Ok(Value::Bool(a != b)),
        (Plus, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Plus, Value::Str(a), Value::Str(b)) => Ok(Value::Str(Rc::from(format!("{}{}", a, b)))),
        (Plus, _, _) => Err(Error::at_token(
            operator,
            "Operands must be two numbers or two strings.",
        )),
        (kind, Value::Number(a), Value::Number(b)) => match kind {
            Minus => Ok(Value::Number(a - b)),
            Star => Ok(Value::Number(a * b)),
            Slash => Ok(Value::Number(a / b)),
            Greater => Ok(Value::Bool(a > b)),
            GreaterEq => Ok(Value::Bool(a >= b)),
            Less => Ok(Value::Bool(a < b)),
            LessEq => Ok(Value::Bool(a <= b)),
            _ => Err(unknown_operator(operator)),
        },
        (Minus | Star | Slash | Greater | GreaterEq | Less | LessEq, _, _) => {
            Err(Error::at_token(operator, "Operands must be numbers."))
        }
        _ => Err(unknown_operator(operator)),
    }
}

fn unknown_operator(operator: &Token) -> Error {
    Error::at_token(operator, format!("Unknown operator '{}'.", operator.lexeme))
}
