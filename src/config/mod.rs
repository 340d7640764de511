//! Configuration loading and validation.

mod loader;
mod types;
mod validation;

pub use loader::{load_config, ConfigError};
pub use types::{
    CheckConfig, CheckType, Config, GlobalConfig, LogFormat, ProberConfig, ServerConfig,
};
pub use validation::validate_config;
