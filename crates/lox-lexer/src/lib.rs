//! Lox lexer: converts source text into tokens.
use lox_syntax::error::{error_at, Error, Result};
use lox_syntax::token::{Literal, Token, TokenKind};

/// Character scanner that produces tokens with positions.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    // start of the token being scanned
    start: usize,
    start_line: usize,
    start_col: usize,
}

impl Lexer {
    /// Create a new lexer over the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            start: 0,
            start_line: 1,
            start_col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }
    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }
    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> String {
        self.src[self.start..self.pos].iter().collect()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        self.make_literal(kind, None)
    }

    fn make_literal(&self, kind: TokenKind, literal: Option<Literal>) -> Token {
        Token::new(kind, self.lexeme(), literal, self.start_line, self.start_col)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && self.peek_next() == Some('/') {
                while let Some(c2) = self.peek() {
                    if c2 == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text = self.lexeme();
        let val: f64 = text.parse().map_err(|_| {
            Error::with_span(
                format!("Invalid number '{}'.", text),
                self.start_line,
                self.start_col,
            )
        })?;
        Ok(self.make_literal(TokenKind::Number, Some(Literal::Number(val))))
    }

    fn read_ident_or_keyword(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = self.lexeme();
        match TokenKind::keyword(&text) {
            Some(kind) => self.make_token(kind),
            None => self.make_token(TokenKind::Ident),
        }
    }

    fn read_string(&mut self) -> Result<Token> {
        let mut s = String::new();
        while let Some(c) = self.advance() {
            if c == '"' {
                return Ok(self.make_literal(TokenKind::String, Some(Literal::Str(s))));
            }
            s.push(c);
        }
        error_at(self.start_line, self.start_col, "Unterminated string.")
    }

    /// Tokenize the entire input into a vector of tokens ending with Eof.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            self.start = self.pos;
            self.start_line = self.line;
            self.start_col = self.col;
            let c = match self.advance() {
                None => {
                    tokens.push(Token::new(TokenKind::Eof, "", None, self.line, self.col));
                    break;
                }
                Some(c) => c,
            };
            let tk = match c {
                '(' => self.make_token(TokenKind::LParen),
                ')' => self.make_token(TokenKind::RParen),
                '{' => self.make_token(TokenKind::LBrace),
                '}' => self.make_token(TokenKind::RBrace),
                ',' => self.make_token(TokenKind::Comma),
                '.' => self.make_token(TokenKind::Dot),
                ';' => self.make_token(TokenKind::Semicolon),
                '-' => self.make_token(TokenKind::Minus),
                '+' => self.make_token(TokenKind::Plus),
                '/' => self.make_token(TokenKind::Slash),
                '*' => self.make_token(TokenKind::Star),
                '!' => {
                    let kind = if self.advance_if('=') { TokenKind::NotEq } else { TokenKind::Bang };
                    self.make_token(kind)
                }
                '=' => {
                    let kind = if self.advance_if('=') { TokenKind::EqEq } else { TokenKind::Equal };
                    self.make_token(kind)
                }
                '<' => {
                    let kind = if self.advance_if('=') { TokenKind::LessEq } else { TokenKind::Less };
                    self.make_token(kind)
                }
                '>' => {
                    let kind = if self.advance_if('=') {
                        TokenKind::GreaterEq
                    } else {
                        TokenKind::Greater
                    };
                    self.make_token(kind)
                }
                '"' => self.read_string()?,
                c if c.is_ascii_digit() => self.read_number()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.read_ident_or_keyword(),
                other => {
                    return error_at(
                        self.start_line,
                        self.start_col,
                        format!("Unexpected character '{}'.", other),
                    );
                }
            };
            tokens.push(tk);
        }
        Ok(tokens)
    }
}
