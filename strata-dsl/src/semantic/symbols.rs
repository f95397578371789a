//! Symbol table and reference resolution
//!
//! Pass one records every declared id, reporting duplicates. Pass two checks
//! every `rock:` and `after:` reference against the table. Nothing here stops
//! later passes; unresolved references are simply absent from the graph.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::parser::ast::{Document, Event, Ident};
use crate::parser::builder::Declaration;
use crate::parser::grammar::StatementKind;
use crate::parser::lexer::{Location, Spanned};
use crate::semantic::suggest::{suggest, SuggestOptions};
use std::collections::HashMap;
use thiserror::Error;

/// Reference resolution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("Duplicate ID '{id}' in {kind} statement")]
    DuplicateId {
        id: Ident,
        kind: StatementKind,
        span: Location,
        first: Location,
    },

    #[error("Undefined rock '{target}' in {kind} {from}")]
    UndefinedRock {
        kind: StatementKind,
        from: Ident,
        target: Ident,
        span: Location,
        hint: Option<String>,
    },

    #[error("Undefined event '{target}' in 'after' of {kind} {from}")]
    UndefinedEvent {
        kind: StatementKind,
        from: Ident,
        target: Ident,
        span: Location,
        hint: Option<String>,
    },

    #[error("'{target}' in 'rock' of {kind} {from} is a {found} event, not a rock")]
    NotARock {
        kind: StatementKind,
        from: Ident,
        target: Ident,
        found: StatementKind,
        span: Location,
        target_span: Location,
    },

    #[error("'{target}' in 'after' of {kind} {from} is a rock, not an event")]
    NotAnEvent {
        kind: StatementKind,
        from: Ident,
        target: Ident,
        span: Location,
        target_span: Location,
    },

    #[error("{kind} {id} lists itself in 'after'")]
    SelfReference {
        kind: StatementKind,
        id: Ident,
        span: Location,
    },
}

impl ResolveError {
    pub fn span(&self) -> Location {
        match self {
            ResolveError::DuplicateId { span, .. }
            | ResolveError::UndefinedRock { span, .. }
            | ResolveError::UndefinedEvent { span, .. }
            | ResolveError::NotARock { span, .. }
            | ResolveError::NotAnEvent { span, .. }
            | ResolveError::SelfReference { span, .. } => *span,
        }
    }
}

impl From<ResolveError> for Diagnostic {
    fn from(err: ResolveError) -> Self {
        let span = err.span();
        let message = err.to_string();
        let diagnostic = Diagnostic::error(DiagnosticKind::Resolution, message, span);
        match err {
            ResolveError::DuplicateId { first, .. } => diagnostic.with_label("first defined", first),
            ResolveError::UndefinedRock { hint, .. } | ResolveError::UndefinedEvent { hint, .. } => {
                diagnostic.with_hint(hint)
            }
            ResolveError::NotARock { target_span, .. } | ResolveError::NotAnEvent { target_span, .. } => {
                diagnostic.with_label("defined", target_span)
            }
            ResolveError::SelfReference { .. } => diagnostic,
        }
    }
}

/// A declared identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: StatementKind,
    /// Span of the defining id
    pub span: Location,
    /// Whether the statement made it into the document
    pub built: bool,
}

impl Symbol {
    pub fn is_event(&self) -> bool {
        self.kind.is_event()
    }
}

/// Every declared id, first definition wins
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<Ident, Symbol>,
    order: Vec<Ident>,
}

impl SymbolTable {
    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn rock(&self, id: &str) -> Option<&Symbol> {
        self.get(id).filter(|s| s.kind == StatementKind::Rock)
    }

    pub fn event(&self, id: &str) -> Option<&Symbol> {
        self.get(id).filter(|s| s.is_event())
    }

    /// Whether this id occurrence is the one the table resolves to
    pub fn is_canonical(&self, id: &Spanned<Ident>) -> bool {
        self.get(&id.value).is_some_and(|s| s.span == id.span)
    }

    /// Ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.order.iter().filter_map(|id| self.symbols.get(id).map(|s| (id.as_str(), s)))
    }

    pub fn rock_ids(&self) -> impl Iterator<Item = &str> {
        self.ids().filter(|(_, s)| !s.is_event()).map(|(id, _)| id)
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.ids().filter(|(_, s)| s.is_event()).map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn declare(&mut self, declaration: &Declaration) -> Result<(), ResolveError> {
        if let Some(existing) = self.symbols.get(&declaration.id.value) {
            return Err(ResolveError::DuplicateId {
                id: declaration.id.value.clone(),
                kind: declaration.kind,
                span: declaration.id.span,
                first: existing.span,
            });
        }
        self.symbols.insert(
            declaration.id.value.clone(),
            Symbol {
                kind: declaration.kind,
                span: declaration.id.span,
                built: declaration.built,
            },
        );
        self.order.push(declaration.id.value.clone());
        Ok(())
    }
}

/// Symbol table plus the errors found building and querying it
#[derive(Debug, Default)]
pub struct Resolution {
    pub table: SymbolTable,
    pub errors: Vec<ResolveError>,
}

/// Build the symbol table and check every cross-reference in `document`
pub fn resolve(declarations: &[Declaration], document: &Document, options: &SuggestOptions) -> Resolution {
    let mut resolution = Resolution::default();

    for declaration in declarations {
        if let Err(err) = resolution.table.declare(declaration) {
            resolution.errors.push(err);
        }
    }

    for event in document.events() {
        check_rock_reference(&resolution.table, event, options, &mut resolution.errors);
        check_after_references(&resolution.table, event, options, &mut resolution.errors);
    }

    tracing::debug!(
        symbols = resolution.table.len(),
        errors = resolution.errors.len(),
        "resolved references"
    );

    resolution
}

fn check_rock_reference(table: &SymbolTable, event: &Event, options: &SuggestOptions, errors: &mut Vec<ResolveError>) {
    let Some(rock) = event.rock() else {
        return;
    };
    let kind = event.kind.statement_kind();

    match table.get(&rock.value) {
        Some(symbol) if symbol.kind == StatementKind::Rock => {}
        Some(symbol) => errors.push(ResolveError::NotARock {
            kind,
            from: event.id.value.clone(),
            target: rock.value.clone(),
            found: symbol.kind,
            span: rock.span,
            target_span: symbol.span,
        }),
        None => errors.push(ResolveError::UndefinedRock {
            kind,
            from: event.id.value.clone(),
            target: rock.value.clone(),
            span: rock.span,
            hint: suggest(&rock.value, table.rock_ids(), "rocks", options),
        }),
    }
}

fn check_after_references(
    table: &SymbolTable,
    event: &Event,
    options: &SuggestOptions,
    errors: &mut Vec<ResolveError>,
) {
    let kind = event.kind.statement_kind();

    for target in &event.after {
        if target.value == event.id.value {
            errors.push(ResolveError::SelfReference {
                kind,
                id: event.id.value.clone(),
                span: target.span,
            });
            continue;
        }

        match table.get(&target.value) {
            Some(symbol) if symbol.is_event() => {}
            Some(symbol) => errors.push(ResolveError::NotAnEvent {
                kind,
                from: event.id.value.clone(),
                target: target.value.clone(),
                span: target.span,
                target_span: symbol.span,
            }),
            None => errors.push(ResolveError::UndefinedEvent {
                kind,
                from: event.id.value.clone(),
                target: target.value.clone(),
                span: target.span,
                hint: suggest(&target.value, table.event_ids(), "events", options),
            }),
        }
    }
}
