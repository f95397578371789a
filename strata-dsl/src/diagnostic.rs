//! Diagnostics collected across all passes
//!
//! Every pass reports into one [`Diagnostics`] collector. [`Diagnostics::finish`]
//! resolves line and column numbers, orders the list by source position (then
//! by pass), and splits errors from warnings.

use crate::parser::lexer::Location;
use crate::source::LineIndex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Which pass produced a diagnostic. Declaration order is pass order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Syntax,
    Build,
    Resolution,
    Cycle,
    Temporal,
}

/// A secondary location attached to a diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub message: String,
    pub span: Location,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Location>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: Location) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            hint: None,
            span: Some(span),
            line: None,
            column: None,
            labels: Vec::new(),
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: Location) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message, span)
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_label(mut self, message: impl Into<String>, span: Location) -> Self {
        self.labels.push(Label {
            message: message.into(),
            span,
            line: None,
            column: None,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn locate(&mut self, index: &LineIndex<'_>) {
        if let Some(span) = self.span {
            let (line, column) = index.line_col(span.start);
            self.line = Some(line);
            self.column = Some(column);
        }
        for label in &mut self.labels {
            let (line, column) = index.line_col(label.span.start);
            label.line = Some(line);
            label.column = Some(column);
            // plain-text consumers only see the message, so cite the location there too
            self.message
                .push_str(&format!(" ({} at line {}, column {})", label.message, line, column));
        }
    }
}

/// Ordered diagnostics, split by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors then warnings
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Collector shared by all passes
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.items.push(diagnostic.into());
    }

    pub fn extend<D: Into<Diagnostic>>(&mut self, diagnostics: impl IntoIterator<Item = D>) {
        self.items.extend(diagnostics.into_iter().map(Into::into));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn append(&mut self, mut other: Diagnostics) {
        self.items.append(&mut other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count_of(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.is_error() && d.kind == kind).count()
    }

    /// Resolve positions and order by source position, then pass.
    /// Diagnostics without a position sort last.
    pub fn finish(mut self, index: &LineIndex<'_>) -> Report {
        for diagnostic in &mut self.items {
            diagnostic.locate(index);
        }
        self.items.sort_by_key(|d| {
            (
                d.span.is_none(),
                d.span.map(|s| s.start).unwrap_or(usize::MAX),
                d.kind,
            )
        });
        let (errors, warnings) = self.items.into_iter().partition(Diagnostic::is_error);
        Report { errors, warnings }
    }
}
