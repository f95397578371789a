//! Builds the typed [`Document`] from a parse tree
//!
//! Field names are checked against the statement table in
//! [`grammar`](crate::parser::grammar). A statement whose required fields are
//! missing or invalid is left out of the document, but it is still recorded
//! as a [`Declaration`] so later passes know its id exists.

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parser::ast::*;
use crate::parser::grammar::{self, FieldShape, FieldSpec, StatementKind};
use crate::parser::lexer::{Location, Spanned};
use crate::parser::tree::{Atom, FieldNode, ParseTree, StatementNode};
use std::collections::HashMap;
use thiserror::Error;

/// Structural errors found while building the AST
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("{kind} '{id}' is missing required field '{field}'")]
    MissingField {
        kind: StatementKind,
        id: String,
        field: &'static str,
        span: Location,
    },

    #[error("{kind} '{id}' has unknown field '{field}' (expected one of: {expected})")]
    UnknownField {
        kind: StatementKind,
        id: String,
        field: String,
        expected: String,
        span: Location,
    },

    #[error("{kind} '{id}' sets field '{field}' more than once")]
    DuplicateField {
        kind: StatementKind,
        id: String,
        field: String,
        span: Location,
        first: Location,
    },

    #[error("Field '{field}' of {kind} '{id}' expects {expected}, found {found}")]
    InvalidValue {
        kind: StatementKind,
        id: String,
        field: &'static str,
        expected: &'static str,
        found: String,
        span: Location,
    },

    #[error("Unknown {field} '{value}' in {kind} '{id}' (expected one of: {accepted})")]
    UnknownVariant {
        kind: StatementKind,
        id: String,
        field: &'static str,
        value: String,
        accepted: String,
        span: Location,
    },

    #[error("Time '{value}' in {kind} '{id}' has no unit; write it as {value}Ma, {value}ka, or {value}Ga")]
    MissingTimeUnit {
        kind: StatementKind,
        id: String,
        value: String,
        span: Location,
    },

    #[error("Unknown time unit '{unit}' in {kind} '{id}' (expected Ma, ka, or Ga)")]
    UnknownTimeUnit {
        kind: StatementKind,
        id: String,
        unit: String,
        span: Location,
    },

    #[error("Time '{value}' in {kind} '{id}' is out of range")]
    TimeOutOfRange {
        kind: StatementKind,
        id: String,
        value: String,
        span: Location,
    },

    #[error("{kind} '{id}' lists '{target}' more than once in 'after'")]
    DuplicateAfter {
        kind: StatementKind,
        id: String,
        target: String,
        span: Location,
        first: Location,
    },
}

impl BuildError {
    pub fn span(&self) -> Location {
        match self {
            BuildError::MissingField { span, .. }
            | BuildError::UnknownField { span, .. }
            | BuildError::DuplicateField { span, .. }
            | BuildError::InvalidValue { span, .. }
            | BuildError::UnknownVariant { span, .. }
            | BuildError::MissingTimeUnit { span, .. }
            | BuildError::UnknownTimeUnit { span, .. }
            | BuildError::TimeOutOfRange { span, .. }
            | BuildError::DuplicateAfter { span, .. } => *span,
        }
    }
}

impl From<BuildError> for Diagnostic {
    fn from(err: BuildError) -> Self {
        let span = err.span();
        let message = err.to_string();
        match err {
            BuildError::UnknownField { .. } => Diagnostic::warning(DiagnosticKind::Build, message, span),
            BuildError::DuplicateField { first, .. } | BuildError::DuplicateAfter { first, .. } => {
                Diagnostic::error(DiagnosticKind::Build, message, span).with_label("first given", first)
            }
            _ => Diagnostic::error(DiagnosticKind::Build, message, span),
        }
    }
}

/// Builder settings
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Unknown fields become errors instead of warnings
    pub strict_fields: bool,
}

/// An id introduced by a statement, whether or not the statement was built
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: StatementKind,
    pub id: Spanned<Ident>,
    pub built: bool,
}

/// Builder output
#[derive(Debug, Default)]
pub struct Built {
    pub document: Document,
    pub declarations: Vec<Declaration>,
    pub diagnostics: Diagnostics,
}

/// Convert a parse tree into a document
pub fn build(tree: &ParseTree, options: BuildOptions) -> Built {
    let mut built = Built::default();

    for node in &tree.statements {
        let mut ctx = StatementBuilder {
            node,
            options,
            diagnostics: &mut built.diagnostics,
        };
        let statement = ctx.build();
        built.declarations.push(Declaration {
            kind: node.kind,
            id: node.id.clone(),
            built: statement.is_some(),
        });
        if let Some(statement) = statement {
            built.document.statements.push(Spanned::new(statement, node.span));
        }
    }

    tracing::debug!(
        statements = built.document.statements.len(),
        declared = built.declarations.len(),
        diagnostics = built.diagnostics.len(),
        "built document"
    );

    built
}

struct StatementBuilder<'a> {
    node: &'a StatementNode,
    options: BuildOptions,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> StatementBuilder<'a> {
    fn build(&mut self) -> Option<Statement> {
        let fields = self.collect_fields();
        let kind = self.node.kind;

        match kind {
            StatementKind::Rock => {
                let name = self.required(&fields, grammar::NAME).and_then(|f| self.string(f));
                let rock_type = self.required(&fields, grammar::TYPE).and_then(|f| {
                    self.variant(f, grammar::TYPE, RockType::from_name, &RockType::ALL.map(RockType::as_str))
                });
                let age = fields.get(grammar::AGE).copied().and_then(|f| self.time(f));
                Some(Statement::Rock(RockDefinition {
                    id: self.node.id.clone(),
                    name: name?,
                    rock_type: rock_type?,
                    age,
                }))
            }
            StatementKind::Deposition | StatementKind::Erosion | StatementKind::Intrusion => {
                let rock = match kind {
                    StatementKind::Erosion => None,
                    _ => Some(self.required(&fields, grammar::ROCK).and_then(|f| self.identifier(f))),
                };
                let style = fields.get(grammar::STYLE).copied().and_then(|f| {
                    self.variant(
                        f,
                        grammar::STYLE,
                        IntrusionStyle::from_name,
                        &IntrusionStyle::ALL.map(IntrusionStyle::as_str),
                    )
                });
                let time = fields.get(grammar::TIME).copied().and_then(|f| self.time(f));
                let after = fields.get(grammar::AFTER).copied().map(|f| self.after(f)).unwrap_or_default();

                let kind = match kind {
                    StatementKind::Deposition => EventKind::Deposition { rock: rock.flatten()? },
                    StatementKind::Intrusion => EventKind::Intrusion { rock: rock.flatten()?, style },
                    _ => EventKind::Erosion,
                };
                Some(Statement::Event(Event {
                    id: self.node.id.clone(),
                    kind,
                    time,
                    after,
                }))
            }
        }
    }

    /// Index fields by name, reporting unknown and repeated ones
    fn collect_fields(&mut self) -> HashMap<&'static str, &'a FieldNode> {
        let node: &'a StatementNode = self.node;
        let spec = node.kind.spec();
        let mut fields: HashMap<&'static str, &'a FieldNode> = HashMap::new();

        for field in &node.fields {
            let Some(field_spec) = spec.field(&field.key.value) else {
                let mut diagnostic: Diagnostic = BuildError::UnknownField {
                    kind: self.node.kind,
                    id: self.id(),
                    field: field.key.value.clone(),
                    expected: spec.field_names(),
                    span: field.key.span,
                }
                .into();
                if self.options.strict_fields {
                    diagnostic.severity = crate::diagnostic::Severity::Error;
                }
                self.diagnostics.push(diagnostic);
                continue;
            };

            if let Some(first) = fields.get(field_spec.name) {
                self.diagnostics.push(BuildError::DuplicateField {
                    kind: self.node.kind,
                    id: self.id(),
                    field: field.key.value.clone(),
                    span: field.key.span,
                    first: first.key.span,
                });
                continue;
            }
            fields.insert(field_spec.name, field);
        }

        fields
    }

    fn required(&mut self, fields: &HashMap<&'static str, &'a FieldNode>, name: &'static str) -> Option<&'a FieldNode> {
        let field = fields.get(name).copied();
        // a recovered statement is already covered by its syntax error
        if field.is_none() && !self.node.recovered {
            self.diagnostics.push(BuildError::MissingField {
                kind: self.node.kind,
                id: self.id(),
                field: name,
                span: self.node.id.span,
            });
        }
        field
    }

    fn single(&mut self, field: &'a FieldNode) -> Option<&'a Spanned<Atom>> {
        match field.values.as_slice() {
            [value] => Some(value),
            _ => {
                let shape = self.shape(field);
                self.invalid(field, shape, format!("{} values", field.values.len()), field.span);
                None
            }
        }
    }

    fn string(&mut self, field: &'a FieldNode) -> Option<Spanned<String>> {
        let value = self.single(field)?;
        match &value.value {
            Atom::String(s) => Some(Spanned::new(s.clone(), value.span)),
            other => {
                self.invalid(field, FieldShape::String, other.describe(), value.span);
                None
            }
        }
    }

    fn identifier(&mut self, field: &'a FieldNode) -> Option<Spanned<Ident>> {
        let value = self.single(field)?;
        match &value.value {
            Atom::Identifier(s) => Some(Spanned::new(s.clone(), value.span)),
            other => {
                self.invalid(field, FieldShape::Identifier, other.describe(), value.span);
                None
            }
        }
    }

    fn variant<T>(
        &mut self,
        field: &'a FieldNode,
        name: &'static str,
        lookup: impl Fn(&str) -> Option<T>,
        accepted: &[&str],
    ) -> Option<Spanned<T>> {
        let value = self.identifier(field)?;
        match lookup(&value.value) {
            Some(variant) => Some(Spanned::new(variant, value.span)),
            None => {
                self.diagnostics.push(BuildError::UnknownVariant {
                    kind: self.node.kind,
                    id: self.id(),
                    field: name,
                    value: value.value,
                    accepted: accepted.join(", "),
                    span: value.span,
                });
                None
            }
        }
    }

    /// Normalize a time literal. `"?"` is the unknown marker, other strings
    /// name an epoch, numbers need a unit suffix.
    fn time(&mut self, field: &'a FieldNode) -> Option<Spanned<TimeValue>> {
        let value = self.single(field)?;
        let time = match &value.value {
            Atom::String(s) if s.trim() == "?" => TimeValue::Unknown,
            Atom::String(s) if !s.trim().is_empty() => TimeValue::Epoch {
                name: s.trim().to_string(),
            },
            Atom::Number(raw) => self.absolute_time(raw, value.span)?,
            other => {
                self.invalid(field, FieldShape::Time, other.describe(), value.span);
                return None;
            }
        };
        Some(Spanned::new(time, value.span))
    }

    fn absolute_time(&mut self, raw: &str, span: Location) -> Option<TimeValue> {
        let split = raw.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(raw.len());
        let (digits, suffix) = raw.split_at(split);

        if suffix.is_empty() {
            self.diagnostics.push(BuildError::MissingTimeUnit {
                kind: self.node.kind,
                id: self.id(),
                value: digits.to_string(),
                span,
            });
            return None;
        }
        let Some(unit) = TimeUnit::from_suffix(suffix) else {
            self.diagnostics.push(BuildError::UnknownTimeUnit {
                kind: self.node.kind,
                id: self.id(),
                unit: suffix.to_string(),
                span,
            });
            return None;
        };
        match digits.parse::<f64>() {
            Ok(magnitude) if magnitude.is_finite() => Some(TimeValue::Absolute { magnitude, unit }),
            _ => {
                self.diagnostics.push(BuildError::TimeOutOfRange {
                    kind: self.node.kind,
                    id: self.id(),
                    value: raw.to_string(),
                    span,
                });
                None
            }
        }
    }

    /// `after:` targets, first occurrence wins
    fn after(&mut self, field: &'a FieldNode) -> Vec<Spanned<Ident>> {
        let mut targets: Vec<Spanned<Ident>> = Vec::with_capacity(field.values.len());
        for value in &field.values {
            let Atom::Identifier(target) = &value.value else {
                self.invalid(field, FieldShape::IdentifierList, value.value.describe(), value.span);
                continue;
            };
            if let Some(first) = targets.iter().find(|t| &t.value == target) {
                self.diagnostics.push(BuildError::DuplicateAfter {
                    kind: self.node.kind,
                    id: self.id(),
                    target: target.clone(),
                    span: value.span,
                    first: first.span,
                });
                continue;
            }
            targets.push(Spanned::new(target.clone(), value.span));
        }
        targets
    }

    fn shape(&self, field: &FieldNode) -> FieldShape {
        self.spec_of(field).map(|f| f.shape).unwrap_or(FieldShape::Identifier)
    }

    fn spec_of(&self, field: &FieldNode) -> Option<&'static FieldSpec> {
        self.node.kind.spec().field(&field.key.value)
    }

    fn invalid(&mut self, field: &FieldNode, shape: FieldShape, found: String, span: Location) {
        let name = self.spec_of(field).map(|f| f.name).unwrap_or("value");
        self.diagnostics.push(BuildError::InvalidValue {
            kind: self.node.kind,
            id: self.id(),
            field: name,
            expected: shape.describe(),
            found,
            span,
        });
    }

    fn id(&self) -> String {
        self.node.id.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    fn build_source(source: &str) -> Built {
        let output = parse(source);
        assert!(output.errors.is_empty(), "unexpected syntax errors: {:?}", output.errors);
        build(&output.tree, BuildOptions::default())
    }

    fn messages(built: &Built) -> Vec<String> {
        built.diagnostics.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_build_rock() {
        let built = build_source(r#"ROCK R1 [ name: "Sandstone"; type: sedimentary; age: 100Ma ]"#);
        assert!(built.diagnostics.is_empty());
        let rock = built.document.rocks().next().unwrap();
        assert_eq!(rock.id.value, "R1");
        assert_eq!(rock.name.value, "Sandstone");
        assert_eq!(rock.rock_type.value, RockType::Sedimentary);
        assert_eq!(
            rock.age.as_ref().map(|a| &a.value),
            Some(&TimeValue::Absolute { magnitude: 100.0, unit: TimeUnit::Ma })
        );
    }

    #[test]
    fn test_build_events() {
        let built = build_source(
            r#"
            ROCK R1 [ name: "Granite"; type: intrusive ]
            DEPOSITION D1 [ rock: R1; time: 100Ma ]
            EROSION E1 [ time: 50ka; after: D1 ]
            INTRUSION I1 [ rock: R1; style: stock; time: "?"; after: E1, D1 ]
            "#,
        );
        assert!(built.diagnostics.is_empty());
        let events: Vec<_> = built.document.events().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].rock().map(|r| r.value.as_str()), Some("R1"));
        assert_eq!(events[1].kind, EventKind::Erosion);
        assert_eq!(events[1].after[0].value, "D1");
        assert!(matches!(
            &events[2].kind,
            EventKind::Intrusion { style: Some(s), .. } if s.value == IntrusionStyle::Stock
        ));
        assert_eq!(events[2].time.as_ref().map(|t| &t.value), Some(&TimeValue::Unknown));
        assert_eq!(events[2].after.len(), 2);
    }

    #[test]
    fn test_epoch_time() {
        let built = build_source(r#"EROSION E1 [ time: "late Eocene" ]"#);
        let event = built.document.events().next().unwrap();
        assert_eq!(
            event.time.as_ref().map(|t| &t.value),
            Some(&TimeValue::Epoch { name: "late Eocene".to_string() })
        );
    }

    #[test]
    fn test_missing_required_field_declares_id() {
        let built = build_source("DEPOSITION D1 [ time: 10Ma ]");
        assert!(built.document.is_empty());
        assert_eq!(built.declarations.len(), 1);
        assert!(!built.declarations[0].built);
        assert_eq!(
            messages(&built),
            vec!["DEPOSITION 'D1' is missing required field 'rock'".to_string()]
        );
    }

    #[test]
    fn test_unknown_field_is_warning() {
        let built = build_source("EROSION E1 [ colour: red ]");
        assert_eq!(built.document.statements.len(), 1);
        assert!(!built.diagnostics.has_errors());
        assert_eq!(built.diagnostics.len(), 1);
    }

    #[test]
    fn test_strict_fields_upgrades_unknown_field() {
        let output = parse("EROSION E1 [ colour: red ]");
        let built = build(&output.tree, BuildOptions { strict_fields: true });
        assert!(built.diagnostics.has_errors());
    }

    #[test]
    fn test_time_without_unit() {
        let built = build_source("EROSION E1 [ time: 35 ]");
        // the event is still built, without a time
        let event = built.document.events().next().unwrap();
        assert!(event.time.is_none());
        assert_eq!(
            messages(&built),
            vec!["Time '35' in EROSION 'E1' has no unit; write it as 35Ma, 35ka, or 35Ga".to_string()]
        );
    }

    #[test]
    fn test_unknown_unit_and_variant() {
        let built = build_source(
            r#"
            ROCK R1 [ name: "x"; type: granite ]
            EROSION E1 [ time: 5My ]
            "#,
        );
        let messages = messages(&built);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Unknown type 'granite' in ROCK 'R1'"));
        assert!(messages[1].starts_with("Unknown time unit 'My'"));
        assert_eq!(built.document.rocks().count(), 0);
    }

    #[test]
    fn test_duplicate_field_and_after() {
        let built = build_source("EROSION E1 [ time: 5Ma; time: 6Ma; after: A, B, A ]");
        let event = built.document.events().next().unwrap();
        assert_eq!(
            event.time.as_ref().map(|t| &t.value),
            Some(&TimeValue::Absolute { magnitude: 5.0, unit: TimeUnit::Ma })
        );
        let after: Vec<_> = event.after.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(after, vec!["A", "B"]);
        assert_eq!(built.diagnostics.error_count_of(DiagnosticKind::Build), 2);
    }

    #[test]
    fn test_wrong_shape() {
        let built = build_source(r#"DEPOSITION D1 [ rock: R1, R2 ] ROCK R1 [ name: Sand; type: volcanic ]"#);
        assert!(built.document.is_empty());
        let messages = messages(&built);
        assert_eq!(
            messages[0],
            "Field 'rock' of DEPOSITION 'D1' expects a single identifier, found 2 values"
        );
        assert_eq!(
            messages[1],
            "Field 'name' of ROCK 'R1' expects a quoted string, found identifier `Sand`"
        );
    }

    #[test]
    fn test_recovered_statement_suppresses_missing_fields() {
        let output = parse(r#"ROCK R1 [ name: "Sandstone" type: sedimentary ]"#);
        assert_eq!(output.errors.len(), 1);
        let built = build(&output.tree, BuildOptions::default());
        assert!(built.diagnostics.is_empty());
        assert!(!built.declarations[0].built);
    }
}
