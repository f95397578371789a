//! Concrete parse tree
//!
//! The parser produces statements with untyped `key: value` fields. Field
//! names and value shapes are checked later by the builder, so a document
//! with unknown fields or bad enum values still parses.

use crate::parser::grammar::StatementKind;
use crate::parser::lexer::{Location, Spanned};

#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    pub statements: Vec<StatementNode>,
}

/// `KEYWORD ID [ field; field ]`
#[derive(Debug, Clone)]
pub struct StatementNode {
    pub kind: StatementKind,
    pub id: Spanned<String>,
    pub fields: Vec<FieldNode>,
    pub span: Location,
    /// Set when a syntax error cut the body short; `fields` holds what was
    /// parsed before the error.
    pub recovered: bool,
}

/// `key: atom, atom, ...`
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub key: Spanned<String>,
    pub values: Vec<Spanned<Atom>>,
    pub span: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Identifier(String),
    String(String),
    /// Raw numeric literal including any unit suffix
    Number(String),
}

impl Atom {
    pub fn describe(&self) -> String {
        match self {
            Atom::Identifier(s) => format!("identifier `{}`", s),
            Atom::String(s) => format!("string \"{}\"", s),
            Atom::Number(s) => format!("number `{}`", s),
        }
    }
}
