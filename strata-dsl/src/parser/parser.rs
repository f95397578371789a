//! Geology DSL Parser
//!
//! Recursive descent parser that converts tokens into a parse tree.
//!
//! ```text
//! document  := statement*
//! statement := KEYWORD IDENT '[' ( field ( ';' field )* ';'? )? ']'
//! field     := IDENT ':' atom ( ',' atom )*
//! atom      := IDENT | STRING | NUMBER
//! ```
//!
//! A syntax error inside a statement does not stop the parse. The error is
//! recorded, the statement keeps the fields read so far, and parsing resumes
//! at the closing `]` or the next statement keyword.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::parser::grammar::{keyword_list, StatementKind};
use crate::parser::lexer::{tokenize, LexError, Location, Spanned, Token};
use crate::parser::tree::{Atom, FieldNode, ParseTree, StatementNode};
use thiserror::Error;

/// Parser error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("Unexpected {found}, expected {expected}")]
    UnexpectedToken {
        span: Location,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { span: Location, expected: String },
}

impl ParseError {
    pub fn span(&self) -> Location {
        match self {
            ParseError::Lex(e) => e.span(),
            ParseError::UnexpectedToken { span, .. } | ParseError::UnexpectedEof { span, .. } => *span,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::error(DiagnosticKind::Syntax, err.to_string(), err.span())
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parse tree plus every syntax error encountered
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub tree: ParseTree,
    pub errors: Vec<ParseError>,
}

/// Parser state
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    eof: Location,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a new parser from source code
    pub fn new(source: &str) -> Self {
        let lexed = tokenize(source);
        Self {
            tokens: lexed.tokens,
            pos: 0,
            eof: Location::new(source.len(), source.len()),
            errors: lexed.errors.into_iter().map(ParseError::Lex).collect(),
        }
    }

    /// Parse the entire document
    pub fn parse(mut self) -> ParseOutput {
        let mut tree = ParseTree::default();

        while let Some(token) = self.peek() {
            match token.statement_kind() {
                Some(kind) => {
                    if let Some(statement) = self.parse_statement(kind) {
                        tree.statements.push(statement);
                    }
                }
                None => {
                    let err = self.unexpected(&format!("a statement keyword ({})", keyword_list()));
                    self.errors.push(err);
                    self.skip_to_keyword();
                }
            }
        }

        tracing::debug!(
            statements = tree.statements.len(),
            errors = self.errors.len(),
            "parsed document"
        );

        ParseOutput { tree, errors: self.errors }
    }

    // ========================================
    // Statements
    // ========================================

    fn parse_statement(&mut self, kind: StatementKind) -> Option<StatementNode> {
        let start = self.current_span();
        self.advance();

        let id = match self.expect_identifier(&format!("an identifier after {}", kind.keyword())) {
            Ok(id) => id,
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                return None;
            }
        };

        let mut node = StatementNode {
            kind,
            id,
            fields: Vec::new(),
            span: start,
            recovered: false,
        };

        match self.parse_body(&mut node.fields) {
            Ok(end) => node.span = start.join(end),
            Err(e) => {
                self.errors.push(e);
                node.recovered = true;
                node.span = start.join(self.synchronize());
            }
        }

        Some(node)
    }

    /// Parse `[ ... ]`, returning the span of the closing bracket
    fn parse_body(&mut self, fields: &mut Vec<FieldNode>) -> ParseResult<Location> {
        self.expect(Token::BracketOpen, "`[`")?;

        loop {
            if self.check(&Token::BracketClose) {
                let end = self.current_span();
                self.advance();
                return Ok(end);
            }

            fields.push(self.parse_field()?);

            match self.peek() {
                Some(Token::Semicolon) => {
                    self.advance();
                }
                Some(Token::BracketClose) => {}
                _ => return Err(self.unexpected("`;` or `]`")),
            }
        }
    }

    fn parse_field(&mut self) -> ParseResult<FieldNode> {
        let key = self.expect_identifier("a field name or `]`")?;
        self.expect(Token::Colon, "`:`")?;

        let mut values = vec![self.parse_atom()?];
        while self.check(&Token::Comma) {
            self.advance();
            values.push(self.parse_atom()?);
        }

        let end = values.last().map(|v| v.span).unwrap_or(key.span);
        let span = key.span.join(end);
        Ok(FieldNode { key, values, span })
    }

    fn parse_atom(&mut self) -> ParseResult<Spanned<Atom>> {
        let span = self.current_span();
        let atom = match self.peek() {
            Some(Token::Identifier(s)) => Atom::Identifier(s.clone()),
            Some(Token::String(s)) => Atom::String(s.clone()),
            Some(Token::Number(s)) => Atom::Number(s.clone()),
            _ => return Err(self.unexpected("a value")),
        };
        self.advance();
        Ok(Spanned::new(atom, span))
    }

    // ========================================
    // Recovery
    // ========================================

    /// Skip to just past the next `]`, stopping early at a statement keyword.
    /// Returns the span of the last token consumed.
    fn synchronize(&mut self) -> Location {
        let mut last = self.previous_span();
        while let Some(token) = self.peek() {
            if token.is_keyword() {
                break;
            }
            let closes = matches!(token, Token::BracketClose);
            last = self.current_span();
            self.advance();
            if closes {
                break;
            }
        }
        last
    }

    fn skip_to_keyword(&mut self) {
        while let Some(token) = self.peek() {
            if token.is_keyword() {
                break;
            }
            self.advance();
        }
    }

    // ========================================
    // Token utilities
    // ========================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.value)
    }

    fn advance(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].value.clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    fn check(&self, token: &Token) -> bool {
        match self.peek() {
            Some(current) => std::mem::discriminant(current) == std::mem::discriminant(token),
            None => false,
        }
    }

    fn expect(&mut self, expected: Token, description: &str) -> ParseResult<()> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn expect_identifier(&mut self, description: &str) -> ParseResult<Spanned<String>> {
        if let Some(Token::Identifier(s)) = self.peek().cloned() {
            let span = self.current_span();
            self.advance();
            Ok(Spanned::new(s, span))
        } else {
            Err(self.unexpected(description))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                span: self.current_span(),
                expected: expected.to_string(),
                found: found.to_string(),
            },
            None => ParseError::UnexpectedEof {
                span: self.eof,
                expected: expected.to_string(),
            },
        }
    }

    fn current_span(&self) -> Location {
        self.tokens.get(self.pos).map(|s| s.span).unwrap_or(self.eof)
    }

    fn previous_span(&self) -> Location {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|s| s.span)
            .unwrap_or(self.eof)
    }
}

/// Parse a DSL source string into a parse tree
pub fn parse(source: &str) -> ParseOutput {
    Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let output = parse("");
        assert!(output.tree.statements.is_empty());
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_parse_rock() {
        let output = parse(r#"ROCK R1 [ name: "Sandstone"; type: sedimentary; age: 100Ma ]"#);
        assert!(output.errors.is_empty());
        let statement = &output.tree.statements[0];
        assert_eq!(statement.kind, StatementKind::Rock);
        assert_eq!(statement.id.value, "R1");
        assert_eq!(statement.fields.len(), 3);
        assert_eq!(statement.fields[2].key.value, "age");
        assert_eq!(statement.fields[2].values[0].value, Atom::Number("100Ma".to_string()));
        assert!(!statement.recovered);
    }

    #[test]
    fn test_parse_list_and_trailing_semicolon() {
        let output = parse("EROSION E1 [ after: D1, D2; ]");
        assert!(output.errors.is_empty());
        let field = &output.tree.statements[0].fields[0];
        assert_eq!(field.values.len(), 2);
        assert_eq!(field.values[1].value, Atom::Identifier("D2".to_string()));
    }

    #[test]
    fn test_parse_empty_body() {
        let output = parse("EROSION E1 [ ]");
        assert!(output.errors.is_empty());
        assert!(output.tree.statements[0].fields.is_empty());
    }

    #[test]
    fn test_missing_semicolon_recovers() {
        let output = parse(
            r#"
            ROCK R1 [ name: "Sandstone" type: sedimentary ]
            ROCK R2 [ name: "Shale"; type: sedimentary ]
            "#,
        );
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(
            &output.errors[0],
            ParseError::UnexpectedToken { found, .. } if found == "identifier `type`"
        ));
        assert_eq!(output.tree.statements.len(), 2);
        let first = &output.tree.statements[0];
        assert!(first.recovered);
        assert_eq!(first.fields.len(), 1);
        assert!(!output.tree.statements[1].recovered);
    }

    #[test]
    fn test_missing_close_bracket_stops_at_keyword() {
        let output = parse(
            r#"
            DEPOSITION D1 [ rock: R1
            DEPOSITION D2 [ rock: R1 ]
            "#,
        );
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.tree.statements.len(), 2);
        assert_eq!(output.tree.statements[1].id.value, "D2");
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let output = parse(
            r#"
            ROCK R1 [ name "x" ]
            ROCK [ name: "y" ]
            EROSION E1 [ time: ]
            "#,
        );
        assert_eq!(output.errors.len(), 3);
        // the statement without an id is dropped
        assert_eq!(output.tree.statements.len(), 2);
    }

    #[test]
    fn test_stray_tokens_between_statements() {
        let output = parse("foo bar ; EROSION E1 [ ]");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.tree.statements.len(), 1);
    }

    #[test]
    fn test_unexpected_eof() {
        let source = "ROCK R1 [ name: \"x\";";
        let output = parse(source);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(
            output.errors[0],
            ParseError::UnexpectedEof {
                span: Location::new(source.len(), source.len()),
                expected: "a field name or `]`".to_string(),
            }
        );
    }

    #[test]
    fn test_lex_errors_are_reported() {
        let output = parse("EROSION E1 [ time: 5Ma ] %");
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(output.errors[0], ParseError::Lex(_)));
        assert_eq!(output.tree.statements.len(), 1);
    }

    #[test]
    fn test_statement_span() {
        let source = "  EROSION E1 [ ]";
        let output = parse(source);
        assert_eq!(output.tree.statements[0].span, Location::new(2, source.len()));
    }
}
