//! Configuration loader

use crate::config::ValidatorConfig;
use crate::error::{Error, Result};
use std::path::Path;

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "STRATA_CONFIG";

/// Configuration loader for various formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ValidatorConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        tracing::debug!(path = %path.display(), format = ext, "loading validator config");

        match ext {
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(Error::Config(format!("Unknown config format: {}", ext))),
        }
    }

    /// Load from an explicit path, else from `STRATA_CONFIG`, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<ValidatorConfig> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(value) if !value.is_empty() => Self::load(Path::new(&value)),
            _ => Ok(ValidatorConfig::default()),
        }
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<ValidatorConfig> {
        let config = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))?;
        Ok(Self::checked(config))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<ValidatorConfig> {
        let config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        Ok(Self::checked(config))
    }

    /// Settings that are accepted but probably not what was meant
    pub fn lint(config: &ValidatorConfig) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if config.suggestions && config.max_suggestions == 0 {
            warnings.push("suggestions enabled with max_suggestions = 0; no close matches will be offered");
        }
        warnings
    }

    fn checked(config: ValidatorConfig) -> ValidatorConfig {
        for warning in Self::lint(&config) {
            tracing::warn!("{}", warning);
        }
        config
    }
}
