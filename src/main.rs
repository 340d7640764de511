//! probewatch - serves Kubernetes-style health probes backed by dependency
//! checks.
//!
//! Usage:
//!     probewatch --config <path>
//!
//! See --help for more options.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use probewatch::checks::build_probes;
use probewatch::config::{load_config, Config};
use probewatch::probe::{probe_once, Prober};
use probewatch::server::HealthServer;
use probewatch::status::{Signal, StateHandle};
use probewatch::util::{init_logging, ShutdownSignal};

/// Serves Kubernetes-style health probes backed by dependency checks.
#[derive(Parser, Debug)]
#[command(name = "probewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Run a single probe cycle, print the diagnostics and exit
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).with_context(|| {
        format!(
            "failed to load configuration from '{}'",
            cli.config.display()
        )
    })?;

    // CLI overrides config.
    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.global.log_level);

    init_logging(log_level, &config.global.log_format);

    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!("  Checks: {}", config.checks.len());
        for check in &config.checks {
            println!(
                "    - {} ({:?}) {} [{:?}]",
                check.id, check.check_type, check.address, check.affects
            );
        }
        return Ok(());
    }

    info!(
        config_path = %cli.config.display(),
        checks = config.checks.len(),
        interval_ms = config.prober.interval.as_millis(),
        "probewatch starting"
    );

    run(config, cli.once)
}

/// Run with the given configuration.
fn run(config: Config, once: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    if once {
        runtime.block_on(run_once(config))
    } else {
        runtime.block_on(run_async(config))
    }
}

/// One probe cycle, diagnostics on stdout, nonzero exit when any configured
/// signal is unhealthy.
async fn run_once(config: Config) -> Result<()> {
    let state = StateHandle::new();
    let probes = build_probes(&config.checks);

    if probes.is_empty() {
        println!("no checks configured");
        return Ok(());
    }

    probe_once(&state, config.prober.timeout(), &probes).await;

    let mut entries: Vec<(String, String)> = state.snapshot().into_iter().collect();
    entries.sort();
    for (key, value) in entries {
        println!("{key}: {value}");
    }

    let affected: Vec<Signal> = Signal::ALL
        .into_iter()
        .filter(|signal| config.checks.iter().any(|c| c.affects.contains(signal)))
        .collect();
    if affected.iter().any(|signal| state.not_ok(*signal)) {
        bail!("one or more composite signals are unhealthy");
    }
    Ok(())
}

/// Async entry point: prober plus HTTP probe endpoints until Ctrl+C.
async fn run_async(config: Config) -> Result<()> {
    let state = StateHandle::new();
    let probes = build_probes(&config.checks);
    let shutdown = ShutdownSignal::new();

    let mut server_task = None;
    if config.server.enabled {
        let server = HealthServer::bind(config.server.address, state.clone())
            .await
            .with_context(|| {
                format!("failed to bind health server on {}", config.server.address)
            })?;
        let shutdown_rx = shutdown.subscribe();
        server_task = Some(tokio::spawn(async move {
            server.run(shutdown_rx).await;
        }));
    }

    let prober_handle = Prober::new(state, config.prober.interval)
        .with_timeout(config.prober.timeout())
        .register_all(probes)
        .start();

    info!("probewatch is running");
    info!("press Ctrl+C to stop");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("received shutdown signal");
        }
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    }

    shutdown.shutdown();
    prober_handle.stopped().await;
    if let Some(task) = server_task {
        let _ = task.await;
    }

    info!("probewatch shut down complete");
    Ok(())
}
