//! Validator configuration

mod loader;
mod types;

pub use loader::{ConfigLoader, CONFIG_ENV_VAR};
pub use types::ValidatorConfig;
