//! Parser module for the geology DSL
//!
//! Text goes through the lexer and the recovering parser into a
//! [`ParseTree`], which the builder checks against the statement schema to
//! produce a typed [`Document`].

pub mod ast;
pub mod builder;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod tree;

pub use ast::*;
pub use builder::{build, BuildError, BuildOptions, Built, Declaration};
pub use grammar::{StatementKind, GRAMMAR};
pub use lexer::{tokenize, LexError, Location, Spanned, Token};
pub use parser::{parse, ParseError, ParseOutput, Parser};
pub use tree::ParseTree;
