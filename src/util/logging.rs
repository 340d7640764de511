//! Tracing setup for the prober and health server.

use crate::config::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber used by probe cycles and the HTTP server.
///
/// `level` comes from the config file (or the `--log-level` override) and is
/// ignored when `RUST_LOG` is set in the environment. JSON output is the
/// default so probe outcomes can be shipped to a log pipeline; `pretty` is
/// meant for running locally.
pub fn init_logging(level: &str, format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Pretty => {
            registry.with(fmt::layer().pretty()).init();
        }
    }
}
