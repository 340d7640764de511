//! Configuration validation.

use crate::config::{CheckType, Config};
use std::collections::HashSet;
use tracing::warn;

/// Validate a parsed configuration.
///
/// Duplicate check ids are allowed (their diagnostics entries overwrite each
/// other) but flagged with a warning.
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.prober.interval.is_zero() {
        return Err("prober.interval must be greater than zero".to_string());
    }
    if let Some(timeout) = config.prober.timeout {
        if timeout.is_zero() {
            return Err("prober.timeout must be greater than zero".to_string());
        }
    }

    let mut seen = HashSet::new();
    for check in &config.checks {
        if check.id.trim().is_empty() {
            return Err("check id must not be empty".to_string());
        }

        if check.check_type == CheckType::Http {
            if !check.path.starts_with('/') {
                return Err(format!(
                    "check '{}': path '{}' must start with '/'",
                    check.id, check.path
                ));
            }
            if !(100..=599).contains(&check.expected_status) {
                return Err(format!(
                    "check '{}': expected_status {} out of range",
                    check.id, check.expected_status
                ));
            }
        }

        if !seen.insert(check.id.as_str()) {
            warn!(id = %check.id, "duplicate check id, diagnostics entries will overwrite");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CheckConfig, ProberConfig};
    use crate::status::Signal;
    use std::time::Duration;

    fn check(id: &str) -> CheckConfig {
        CheckConfig {
            id: id.to_string(),
            check_type: CheckType::Tcp,
            address: "127.0.0.1:5432".parse().unwrap(),
            path: "/".to_string(),
            expected_status: 200,
            affects: vec![Signal::Ready],
        }
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config {
            prober: ProberConfig {
                interval: Duration::ZERO,
                timeout: None,
            },
            ..Config::default()
        };
        assert!(validate_config(&config).unwrap_err().contains("interval"));
    }

    #[test]
    fn test_empty_check_id_rejected() {
        let config = Config {
            checks: vec![check("  ")],
            ..Config::default()
        };
        assert!(validate_config(&config).unwrap_err().contains("id"));
    }

    #[test]
    fn test_http_check_path_must_be_absolute() {
        let mut bad = check("api");
        bad.check_type = CheckType::Http;
        bad.path = "healthz".to_string();
        let config = Config {
            checks: vec![bad],
            ..Config::default()
        };
        assert!(validate_config(&config).unwrap_err().contains("path"));
    }

    #[test]
    fn test_out_of_range_status_rejected() {
        let mut bad = check("api");
        bad.check_type = CheckType::Http;
        bad.expected_status = 42;
        let config = Config {
            checks: vec![bad],
            ..Config::default()
        };
        assert!(validate_config(&config)
            .unwrap_err()
            .contains("expected_status"));
    }

    #[test]
    fn test_duplicate_ids_allowed() {
        let config = Config {
            checks: vec![check("db"), check("db")],
            ..Config::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
