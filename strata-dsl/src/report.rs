//! Terminal rendering of diagnostics with ariadne

use crate::diagnostic::{Diagnostic, Severity};
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use std::io::{self, Write};
use std::ops::Range;

/// Write every diagnostic as an annotated source excerpt
pub fn write_report<'a, W: Write>(
    mut out: W,
    name: &str,
    source: &str,
    diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    color: bool,
) -> io::Result<()> {
    for diagnostic in diagnostics {
        write_one(&mut out, name, source, diagnostic, color)?;
    }
    Ok(())
}

fn write_one<W: Write>(out: &mut W, name: &str, source: &str, diagnostic: &Diagnostic, color: bool) -> io::Result<()> {
    let (kind, primary) = match diagnostic.severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
    };
    let span = diagnostic.span.map(|s| widen(source, s.start..s.end)).unwrap_or(0..0);

    let mut report = Report::build(kind, (name, span.clone()))
        .with_config(Config::default().with_color(color).with_index_type(IndexType::Byte))
        .with_code(format!("{:?}", diagnostic.kind).to_lowercase())
        .with_message(&diagnostic.message);

    if diagnostic.span.is_some() {
        report = report.with_label(Label::new((name, span)).with_color(primary));
    }
    for label in &diagnostic.labels {
        report = report.with_label(
            Label::new((name, widen(source, label.span.start..label.span.end)))
                .with_message(&label.message)
                .with_color(Color::Blue),
        );
    }
    if let Some(hint) = &diagnostic.hint {
        report = report.with_help(hint);
    }

    report.finish().write((name, Source::from(source)), out)
}

/// Give zero-width spans a visible extent where the source allows it
fn widen(source: &str, span: Range<usize>) -> Range<usize> {
    let start = span.start.min(source.len());
    let end = span.end.min(source.len()).max(start);
    if start < end {
        return start..end;
    }
    match source[start..].chars().next() {
        Some(c) => start..start + c.len_utf8(),
        None => start..end,
    }
}
