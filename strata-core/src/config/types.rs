//! Configuration type definitions
//!
//! These types tune the semantic passes of the DSL validator. Every field has
//! a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Options for a validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Treat each deposition as occurring after the deposition declared
    /// immediately before it, in addition to explicit `after:` edges.
    pub implicit_deposition_order: bool,

    /// Report unknown statement fields as errors instead of warnings
    pub strict_fields: bool,

    /// Attach "did you mean" hints to unresolved references
    pub suggestions: bool,

    /// Maximum number of suggested identifiers per unresolved reference
    pub max_suggestions: usize,

    /// Maximum edit distance for a suggestion
    pub suggestion_distance: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            implicit_deposition_order: false,
            strict_fields: false,
            suggestions: true,
            max_suggestions: 3,
            suggestion_distance: 2,
        }
    }
}
