//! Built-in dependency checkers and config-to-probe wiring.

mod http;
mod tcp;

pub use http::HttpCheck;
pub use tcp::TcpCheck;

use crate::config::{CheckConfig, CheckType};
use crate::probe::{DepProbe, Probe};
use std::sync::Arc;

/// Build runnable probes from the configured checks.
pub fn build_probes(checks: &[CheckConfig]) -> Vec<Arc<dyn Probe>> {
    checks
        .iter()
        .map(|check| {
            let probe = match check.check_type {
                CheckType::Tcp => DepProbe::new(
                    check.id.clone(),
                    check.affects.clone(),
                    TcpCheck::new(check.address),
                ),
                CheckType::Http => DepProbe::new(
                    check.id.clone(),
                    check.affects.clone(),
                    HttpCheck::new(check.address, check.path.clone(), check.expected_status),
                ),
            };
            Arc::new(probe) as Arc<dyn Probe>
        })
        .collect()
}
