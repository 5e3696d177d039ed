//! Token definitions for the Lox language.
//!
//! Tokens are the smallest meaningful units of Lox source code. The lexer
//! produces them in order, terminated by a single [`TokenKind::Eof`], and
//! the parser only ever reads them.
//!
//! # Token Categories
//!
//! - **Identifiers**: variable and function names (`counter`, `fib`)
//! - **Literals**: numbers and strings (`42`, `3.5`, `"hello"`)
//! - **Keywords**: reserved words (`fun`, `var`, `while`, `nil`)
//! - **Operators**: arithmetic, comparison and negation (`+`, `>=`, `!`)
//! - **Punctuation**: structural elements (`(`, `{`, `,`, `;`)
//! - **Special**: end-of-input marker
//!
//! # Examples
//!
//! ```rust
//! use lox_syntax::{Literal, Token, TokenKind};
//!
//! let number = Token::new(TokenKind::Number, "42", Some(Literal::Number(42.0)), 1, 1);
//! assert_eq!(number.lexeme, "42");
//!
//! let keyword = Token::new(TokenKind::Fun, "fun", None, 2, 1);
//! assert!(keyword.literal.is_none());
//! ```

use std::fmt;

/// Token types that can be produced by the Lox lexer.
///
/// The kind carries no payload: the source text lives in [`Token::lexeme`]
/// and a decoded literal value, if any, in [`Token::literal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Punctuation ===
    /// Left parenthesis `(`
    LParen,
    /// Right parenthesis `)`
    RParen,
    /// Left brace `{`
    LBrace,
    /// Right brace `}`
    RBrace,
    /// Comma `,` - separates arguments and sequence elements
    Comma,
    /// Dot `.`
    Dot,
    /// Semicolon `;` - terminates statements
    Semicolon,

    // === Operators ===
    /// Subtraction or negation `-`
    Minus,
    /// Addition or concatenation `+`
    Plus,
    /// Division `/`
    Slash,
    /// Multiplication `*`
    Star,
    /// Logical NOT `!`
    Bang,
    /// Inequality `!=`
    NotEq,
    /// Assignment `=`
    Equal,
    /// Equality `==`
    EqEq,
    /// Greater-than `>`
    Greater,
    /// Greater-than-or-equal `>=`
    GreaterEq,
    /// Less-than `<`
    Less,
    /// Less-than-or-equal `<=`
    LessEq,

    // === Literals ===
    /// An identifier (variable or function name)
    Ident,
    /// A string literal
    String,
    /// A numeric literal (always a double)
    Number,

    // === Keywords ===
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    /// End-of-input marker - always the last token
    Eof,
}

impl TokenKind {
    /// Maps a reserved word to its keyword kind.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => return None,
        };
        Some(kind)
    }
}

/// A literal value decoded by the lexer or written into the tree by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{}", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Nil => write!(f, "nil"),
        }
    }
}

/// A token with its source text and location.
///
/// # Fields
///
/// - `kind`: the syntactic category
/// - `lexeme`: the exact source text (empty for [`TokenKind::Eof`])
/// - `literal`: decoded value for number and string tokens
/// - `line` / `col`: 1-based position of the first character
///
/// Position information is what diagnostics point at:
///
/// ```text
/// [line 3] Error at 'a': Can't read local variable in its own initializer.
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        line: usize,
        col: usize,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal,
            line,
            col,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "end of input")
        } else {
            write!(f, "'{}'", self.lexeme)
        }
    }
}
