//! Temporal consistency of `after:` edges
//!
//! Each edge is checked on its own: when both ends carry an absolute time,
//! the later event must be strictly younger. Unknown times and epoch names
//! agree with any order. Edges touching a node inside a cyclic component
//! have no defined order and are skipped.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::parser::ast::{Ident, TimeValue};
use crate::parser::lexer::Location;
use crate::semantic::graph::{EdgeKind, EventGraph};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "Temporal inconsistency: {event} ({event_time}) is after {dependency} ({dependency_time}) but is not younger"
)]
pub struct TemporalError {
    pub event: Ident,
    pub event_time: TimeValue,
    pub dependency: Ident,
    pub dependency_time: TimeValue,
    pub edge: EdgeKind,
    pub span: Location,
    /// Where the dependency's time is written
    pub dependency_span: Location,
}

impl From<TemporalError> for Diagnostic {
    fn from(err: TemporalError) -> Self {
        let hint = match err.edge {
            EdgeKind::Explicit => None,
            EdgeKind::Implicit => Some(format!(
                "{} is taken to follow {} because depositions are ordered by declaration",
                err.event, err.dependency
            )),
        };
        Diagnostic::error(DiagnosticKind::Temporal, err.to_string(), err.span)
            .with_hint(hint)
            .with_label(format!("{} time", err.dependency), err.dependency_span)
    }
}

/// Check every edge outside the graph's cyclic components
pub fn check(graph: &EventGraph) -> Vec<TemporalError> {
    let cyclic = graph.cyclic_nodes();
    let nodes = graph.nodes();
    let mut errors = Vec::new();

    for edge in graph.edges() {
        if cyclic.contains(&edge.from) || cyclic.contains(&edge.to) {
            continue;
        }
        let (later, earlier) = (&nodes[edge.from], &nodes[edge.to]);
        let (Some(later_years), Some(earlier_years)) = (later.years_before_present(), earlier.years_before_present())
        else {
            continue;
        };
        if later_years < earlier_years {
            continue;
        }

        // both times are present once the years are known
        let (Some(later_time), Some(earlier_time)) = (&later.time, &earlier.time) else {
            continue;
        };
        errors.push(TemporalError {
            event: later.id.clone(),
            event_time: later_time.value.clone(),
            dependency: earlier.id.clone(),
            dependency_time: earlier_time.value.clone(),
            edge: edge.kind,
            span: edge.span,
            dependency_span: earlier_time.span,
        });
    }

    tracing::debug!(
        edges = graph.edges().len(),
        skipped = cyclic.len(),
        errors = errors.len(),
        "checked temporal order"
    );

    errors
}
