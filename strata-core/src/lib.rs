//! Strata Core Library
//!
//! Shared error handling and validator configuration for the Strata
//! geology DSL toolchain.

pub mod config;
pub mod error;

pub use config::{ConfigLoader, ValidatorConfig};
pub use error::{Error, Result};

/// Strata version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
