//! Error types for Strata

use thiserror::Error;

/// Result type for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Process-level failures.
///
/// Malformed DSL input is never reported through this type; it is an expected
/// outcome carried as diagnostics in the validation result.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}
