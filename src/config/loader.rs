//! Configuration file loading.

use crate::config::{validate_config, Config};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a YAML file: read, parse, validate.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;

    let config: Config = serde_yaml::from_str(&contents)?;

    validate_config(&config).map_err(ConfigError::ValidationError)?;

    Ok(config)
}
