//! Recursive-descent parser.
//!
//! Precedence, lowest first: sequence (`,`), assignment, `or`, `and`,
//! equality, comparison, term, factor, unary, call, primary. Every binary
//! level goes through [`Parser::fold_left`].

use std::rc::Rc;

use lox_syntax::ast::{Expr, FunctionDecl, Stmt};
use lox_syntax::diagnostic::Diagnostics;
use lox_syntax::token::{Literal, Token, TokenKind};

use TokenKind::*;

const MAX_ARITY: usize = 255;

/// Deepest nesting of statements, groupings, prefix operators and
/// assignments before the input is rejected.
pub const MAX_NESTING: usize = 256;

/// Unwind marker. The message has already gone to the diagnostic sink.
#[derive(Debug)]
struct ParseError;

type ParseResult<T> = std::result::Result<T, ParseError>;

type Production<'d> = fn(&mut Parser<'d>) -> ParseResult<Expr>;

pub struct Parser<'d> {
    tokens: Vec<Token>,
    current: usize,
    /// Open recursive productions, bounded by [`MAX_NESTING`]
    depth: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> Parser<'d> {
    /// `tokens` should end with `Eof`; one is appended if missing.
    pub fn new(mut tokens: Vec<Token>, diagnostics: &'d mut Diagnostics) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col + t.lexeme.len()));
            tokens.push(Token::new(Eof, "", None, line, col));
        }
        Self {
            tokens,
            current: 0,
            depth: 0,
            diagnostics,
        }
    }

    /// Parses exactly one expression.
    ///
    /// On the first syntax error the message is reported and `None` comes
    /// back; no partial tree is ever returned.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        let result = self.expression().and_then(|expr| {
            if self.is_at_end() {
                Ok(expr)
            } else {
                Err(self.error_at_current("Expect end of expression."))
            }
        });
        result.ok()
    }

    /// Parses a whole program.
    ///
    /// A syntax error drops only the declaration it occurred in; parsing
    /// resumes at the next statement boundary. Check the diagnostics before
    /// running the result.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    // === Statements ===

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(&[Fun]) {
            self.function()
        } else if self.matches(&[Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn function(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Ident, "Expect function name.")?;
        self.consume(LParen, "Expect '(' after function name.")?;
        let mut params = Vec::new();
        if !self.check(RParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    self.report_current("Can't have more than 255 parameters.");
                }
                params.push(self.consume(Ident, "Expect parameter name.")?);
                if !self.matches(&[Comma]) {
                    break;
                }
            }
        }
        self.consume(RParen, "Expect ')' after parameters.")?;
        self.consume(LBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Ident, "Expect variable name.")?;
        let initializer = if self.matches(&[Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> ParseResult<Stmt> {
        if self.matches(&[For]) {
            self.for_statement()
        } else if self.matches(&[If]) {
            self.if_statement()
        } else if self.matches(&[Print]) {
            let value = self.expression()?;
            self.consume(Semicolon, "Expect ';' after value.")?;
            Ok(Stmt::Print(value))
        } else if self.matches(&[Return]) {
            self.return_statement()
        } else if self.matches(&[While]) {
            self.while_statement()
        } else if self.matches(&[LBrace]) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// Desugars into `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(LParen, "Expect '(' after 'for'.")?;
        let initializer = if self.matches(&[Semicolon]) {
            None
        } else if self.matches(&[Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };
        let condition = if self.check(Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(Semicolon, "Expect ';' after loop condition.")?;
        let increment = if self.check(RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(RParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(Literal::Bool(true))),
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }
        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(LParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(RParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(LParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(RBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(RBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // === Expressions ===

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::sequence)
    }

    fn sequence(&mut self) -> ParseResult<Expr> {
        let first = self.assignment()?;
        if !self.check(Comma) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while self.matches(&[Comma]) {
            elements.push(self.assignment()?);
        }
        Ok(Expr::Sequence(elements))
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;
        if !self.matches(&[Equal]) {
            return Ok(expr);
        }
        let equals = self.previous().clone();
        let value = self.nested(Self::assignment)?;
        match expr {
            Expr::Variable { name, .. } => Ok(Expr::assign(name, value)),
            other => {
                self.diagnostics.report(&equals, "Invalid assignment target.");
                Ok(other)
            }
        }
    }

    fn or(&mut self) -> ParseResult<Expr> {
        self.fold_left(Self::and, &[Or], Expr::logical)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        self.fold_left(Self::equality, &[And], Expr::logical)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.fold_left(Self::comparison, &[NotEq, EqEq], Expr::binary)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.fold_left(Self::term, &[Greater, GreaterEq, Less, LessEq], Expr::binary)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.fold_left(Self::factor, &[Minus, Plus], Expr::binary)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.fold_left(Self::unary, &[Slash, Star], Expr::binary)
    }

    /// One left-associative precedence level: `operand (op operand)*`.
    fn fold_left(
        &mut self,
        operand: Production<'d>,
        operators: &[TokenKind],
        node: fn(Expr, Token, Expr) -> Expr,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;
        while self.matches(operators) {
            let operator = self.previous().clone();
            let right = operand(self)?;
            expr = node(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches(&[Bang, Minus]) {
            let operator = self.previous().clone();
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::unary(operator, operand));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.matches(&[LParen]) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(RParen) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    self.report_current("Can't have more than 255 arguments.");
                }
                arguments.push(self.assignment()?);
                if !self.matches(&[Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(RParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(&[False]) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }
        if self.matches(&[True]) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }
        if self.matches(&[Nil]) {
            return Ok(Expr::Literal(Literal::Nil));
        }
        if self.matches(&[Number, String]) {
            let literal = self.previous().literal.clone().unwrap_or(Literal::Nil);
            return Ok(Expr::Literal(literal));
        }
        if self.matches(&[Ident]) {
            return Ok(Expr::variable(self.previous().clone()));
        }
        if self.matches(&[LParen]) {
            let expr = self.expression()?;
            self.consume(RParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }
        Err(self.error_at_current("Expect expression."))
    }

    /// Runs `production` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, production: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at_current("Too deeply nested."));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    // === Cursor ===

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|&k| self.check(k)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        Err(self.error_at_current(message))
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn report_current(&mut self, message: &str) {
        self.diagnostics.report(&self.tokens[self.current], message);
    }

    fn error_at_current(&mut self, message: &str) -> ParseError {
        self.report_current(message);
        ParseError
    }

    /// Discards tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == Semicolon {
                break;
            }
            match self.peek().kind {
                Class | Fun | Var | For | If | While | Print | Return => break,
                _ => {
                    self.advance();
                }
            }
        }
        tracing::debug!(
            line = self.peek().line,
            token = %self.peek(),
            "resynchronized after syntax error"
        );
    }
}
