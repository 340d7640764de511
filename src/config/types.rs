//! Configuration data types.

use crate::status::Signal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Probe endpoint server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Prober scheduling settings
    #[serde(default)]
    pub prober: ProberConfig,

    /// Dependency checks to run each cycle
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Json,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Probe endpoint server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Whether the HTTP probe endpoints are served
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind the probe server
    #[serde(default = "default_server_address")]
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_server_address(),
        }
    }
}

/// Prober scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProberConfig {
    /// How often to run a probe cycle
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Per-check timeout; defaults to the interval when unset
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl ProberConfig {
    /// Effective per-check timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(self.interval)
    }
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: None,
        }
    }
}

/// One configured dependency check.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckConfig {
    /// Stable identifier; also the dependency's diagnostics key
    pub id: String,

    /// Check kind
    #[serde(rename = "type", default)]
    pub check_type: CheckType,

    /// Address of the dependency
    pub address: SocketAddr,

    /// Request path (http checks only)
    #[serde(default = "default_check_path")]
    pub path: String,

    /// Expected response status (http checks only)
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,

    /// Composite signals this dependency affects; may be empty
    #[serde(default)]
    pub affects: Vec<Signal>,
}

/// Dependency check kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Tcp,
    Http,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_server_address() -> SocketAddr {
    "0.0.0.0:8099".parse().expect("valid default address")
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_check_path() -> String {
    "/".to_string()
}

fn default_expected_status() -> u16 {
    200
}
