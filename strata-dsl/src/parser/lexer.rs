//! Lexer for the geology DSL
//!
//! Tokenizes statements of the form `KEYWORD ID [ key: value; ... ]`.
//!
//! Key features:
//! - Whitespace, including newlines, is insignificant
//! - `[ ]` delimit statement bodies, `;` separates fields, `,` separates list items
//! - "..." for quoted strings
//! - `100Ma` style numeric literals; the unit suffix is checked by the builder
//! - # for comments (collected apart from the tokens)

use crate::parser::grammar::StatementKind;
use logos::{Logos, Span};
use serde::Serialize;
use std::fmt;

/// Byte range in the source, used for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl Location {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest location covering both `self` and `other`
    pub fn join(self, other: Location) -> Location {
        Location {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A value with its location in the source.
///
/// Equality compares the value only, so two trees parsed from differently
/// formatted text compare equal when they say the same thing.
#[derive(Debug, Clone, Serialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Token types for the geology DSL
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    #[regex(r"#[^\n]*")]
    Comment,

    // ============================================================
    // Keywords
    // ============================================================
    #[token("ROCK")]
    Rock,

    #[token("DEPOSITION")]
    Deposition,

    #[token("EROSION")]
    Erosion,

    #[token("INTRUSION")]
    Intrusion,

    // ============================================================
    // Structural
    // ============================================================
    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    // ============================================================
    // Values
    // ============================================================
    /// Quoted string literal: "..."
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len()-1])
    })]
    String(String),

    /// A quote that is never closed on its line
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,

    /// Numeric literal with an optional unit suffix: `35`, `2.5Ga`, `500ka`
    #[regex(r"[0-9]+(\.[0-9]+)?[A-Za-z]*", |lex| lex.slice().to_string())]
    Number(String),

    /// Identifier: statement ids, field names, enum values
    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*", |lex| lex.slice().to_string())]
    Identifier(String),
}

impl Token {
    /// The statement kind introduced by this token, if it is a keyword
    pub fn statement_kind(&self) -> Option<StatementKind> {
        match self {
            Token::Rock => Some(StatementKind::Rock),
            Token::Deposition => Some(StatementKind::Deposition),
            Token::Erosion => Some(StatementKind::Erosion),
            Token::Intrusion => Some(StatementKind::Intrusion),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.statement_kind().is_some()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Rock => write!(f, "keyword `ROCK`"),
            Token::Deposition => write!(f, "keyword `DEPOSITION`"),
            Token::Erosion => write!(f, "keyword `EROSION`"),
            Token::Intrusion => write!(f, "keyword `INTRUSION`"),
            Token::BracketOpen => write!(f, "`[`"),
            Token::BracketClose => write!(f, "`]`"),
            Token::Colon => write!(f, "`:`"),
            Token::Semicolon => write!(f, "`;`"),
            Token::Comma => write!(f, "`,`"),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Number(s) => write!(f, "number `{}`", s),
            Token::Identifier(s) => write!(f, "identifier `{}`", s),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Unescape a string literal
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Lexer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character(s) '{text}'")]
    UnexpectedChar { text: String, span: Location },

    #[error("Unterminated string literal")]
    UnterminatedString { span: Location },
}

impl LexError {
    pub fn span(&self) -> Location {
        match self {
            LexError::UnexpectedChar { span, .. } | LexError::UnterminatedString { span } => *span,
        }
    }
}

/// Tokens plus every lexical error found along the way
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Spanned<Token>>,
    pub errors: Vec<LexError>,
    /// `#` comments, which the parser never sees
    pub comments: Vec<Location>,
}

/// Tokenize a DSL source string.
///
/// Lexing never stops early: unmatched characters are reported (adjacent ones
/// coalesced into a single error) and skipped.
pub fn tokenize(source: &str) -> Lexed {
    let lexer = Token::lexer(source);
    let mut lexed = Lexed::default();

    for (result, span) in lexer.spanned() {
        match result {
            Ok(Token::Whitespace) => continue,
            Ok(Token::Comment) => lexed.comments.push(span.into()),
            Ok(Token::UnterminatedString) => {
                lexed.errors.push(LexError::UnterminatedString { span: span.into() });
            }
            Ok(token) => {
                lexed.tokens.push(Spanned::new(token, span));
            }
            Err(_) => {
                if let Some(LexError::UnexpectedChar { text, span: last }) = lexed.errors.last_mut() {
                    if last.end == span.start {
                        last.end = span.end;
                        text.push_str(&source[span.clone()]);
                        continue;
                    }
                }
                lexed.errors.push(LexError::UnexpectedChar {
                    text: source[span.clone()].to_string(),
                    span: span.into(),
                });
            }
        }
    }

    lexed
}
