//! Strata DSL parser and validator
//!
//! This crate parses the geology DSL (rock definitions plus deposition,
//! erosion, and intrusion events) and checks the result for dangling
//! references, circular `after:` chains, and contradictory absolute times.
//!
//! # Example
//!
//! ```rust
//! use strata_dsl::validate_dsl;
//!
//! let source = r#"
//!     ROCK R1 [ name: "Sandstone"; type: sedimentary; age: 100Ma ]
//!     DEPOSITION D1 [ rock: R1; time: 90Ma ]
//!     EROSION E1 [ time: 40Ma; after: D1 ]
//! "#;
//!
//! let result = validate_dsl(source).unwrap();
//! assert!(result.is_valid);
//! assert_eq!(result.rocks_count, 1);
//! ```

pub mod diagnostic;
pub mod parser;
pub mod report;
pub mod semantic;
pub mod serializer;
pub mod source;

pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Report, Severity};
pub use parser::{Document, Statement, StatementKind};
pub use report::write_report;
pub use semantic::{Cycle, EventGraph, SymbolTable};
pub use serializer::to_dsl;

use parser::builder::{build, BuildOptions, Built};
use parser::parser::{parse, ParseOutput};
use semantic::{GraphOptions, SuggestOptions};
use serde::Serialize;
use source::LineIndex;
use strata_core::config::ValidatorConfig;

/// Outcome of parsing and building, before semantic analysis
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub document: Document,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a full validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub rocks_count: usize,
    pub depositions_count: usize,
    pub erosions_count: usize,
    pub intrusions_count: usize,
}

/// Everything the passes produced, for callers that need more than the verdict
#[derive(Debug)]
pub struct Analysis {
    pub document: Document,
    pub symbols: SymbolTable,
    pub graph: EventGraph,
    pub cycles: Vec<Cycle>,
    pub report: Report,
}

impl From<Analysis> for ValidationResult {
    fn from(analysis: Analysis) -> Self {
        // a repeated id counts once, as the symbol table and graph see it
        let count = |kind| {
            analysis
                .document
                .statements
                .iter()
                .filter(|s| s.value.kind() == kind && analysis.symbols.is_canonical(s.value.id()))
                .count()
        };
        ValidationResult {
            is_valid: analysis.report.is_clean(),
            rocks_count: count(StatementKind::Rock),
            depositions_count: count(StatementKind::Deposition),
            erosions_count: count(StatementKind::Erosion),
            intrusions_count: count(StatementKind::Intrusion),
            errors: analysis.report.errors,
            warnings: analysis.report.warnings,
        }
    }
}

/// Runs the passes with one configuration. Holds no per-run state.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            strict_fields: self.config.strict_fields,
        }
    }

    fn suggest_options(&self) -> SuggestOptions {
        SuggestOptions {
            enabled: self.config.suggestions,
            max_suggestions: self.config.max_suggestions,
            max_distance: self.config.suggestion_distance,
        }
    }

    fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            implicit_deposition_order: self.config.implicit_deposition_order,
        }
    }

    fn front_end(&self, source: &str) -> (ParseOutput, Built, Diagnostics) {
        let output = parse(source);
        let mut built = build(&output.tree, self.build_options());

        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(output.errors.iter().cloned());
        diagnostics.append(std::mem::take(&mut built.diagnostics));
        (output, built, diagnostics)
    }

    /// Syntax and schema checks only
    pub fn parse(&self, source: &str) -> ParseResult {
        let (_, built, diagnostics) = self.front_end(source);
        let report = diagnostics.finish(&LineIndex::new(source));
        ParseResult {
            document: built.document,
            errors: report.errors,
            warnings: report.warnings,
        }
    }

    /// Run every pass. Malformed input is reported in the result; only
    /// internal invariant violations return `Err`.
    pub fn analyze(&self, source: &str) -> strata_core::Result<Analysis> {
        let (output, built, mut diagnostics) = self.front_end(source);

        // nothing usable came out of the parse
        if output.tree.statements.is_empty() && !output.errors.is_empty() {
            tracing::debug!("no statements parsed, skipping semantic analysis");
            return Ok(Analysis {
                document: built.document,
                symbols: SymbolTable::default(),
                graph: EventGraph::default(),
                cycles: Vec::new(),
                report: diagnostics.finish(&LineIndex::new(source)),
            });
        }

        let resolution = semantic::resolve(&built.declarations, &built.document, &self.suggest_options());
        diagnostics.extend(resolution.errors);

        let graph = EventGraph::build(&built.document, &resolution.table, self.graph_options())?;
        let cycles = graph.find_cycles();
        diagnostics.extend(&cycles);
        diagnostics.extend(semantic::check(&graph));

        let report = diagnostics.finish(&LineIndex::new(source));
        tracing::debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validation finished"
        );

        Ok(Analysis {
            document: built.document,
            symbols: resolution.table,
            graph,
            cycles,
            report,
        })
    }

    pub fn validate(&self, source: &str) -> strata_core::Result<ValidationResult> {
        self.analyze(source).map(ValidationResult::from)
    }
}

/// Parse and build `text` with the default configuration
pub fn parse_dsl(text: &str) -> ParseResult {
    Validator::default().parse(text)
}

/// Fully validate `text` with the default configuration
pub fn validate_dsl(text: &str) -> strata_core::Result<ValidationResult> {
    Validator::default().validate(text)
}
