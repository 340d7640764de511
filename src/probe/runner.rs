//! Probe cycle execution.
//!
//! One cycle fans out every registered probe onto its own task, bounds each
//! check with a per-check timeout, fans the outcomes back in over a channel
//! and folds them into the shared state: one diagnostics entry per
//! dependency, then one signal update per composite signal with at least one
//! contributing check.

use crate::probe::Probe;
use crate::status::{timestamped, Health, Signal, StateHandle};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outcome of one dependency check within a cycle.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub service_id: String,
    pub affects: Vec<Signal>,
    pub health: Health,
    pub observed_at: SystemTime,
}

/// Run all probes concurrently and collect exactly one outcome per probe.
///
/// Each check gets its own deadline of `timeout` from its launch; a check
/// that exceeds it is recorded as failed. There is no short-circuit: the
/// cycle waits for every outcome, so its duration is bounded by the slowest
/// check, itself bounded by `timeout`.
pub async fn run_cycle(timeout: Duration, probes: &[Arc<dyn Probe>]) -> Vec<CheckOutcome> {
    if probes.is_empty() {
        return Vec::new();
    }

    let total = probes.len();
    let (tx, mut rx) = mpsc::channel::<CheckOutcome>(total);

    for probe in probes {
        let probe = Arc::clone(probe);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, probe.check()).await;
            let observed_at = SystemTime::now();
            let health = match result {
                Ok(Ok(())) => Health::Ok,
                Ok(Err(e)) => {
                    debug!(service = probe.service_id(), error = %e, "dependency check failed");
                    Health::NotOk
                }
                Err(_) => {
                    warn!(
                        service = probe.service_id(),
                        timeout_ms = timeout.as_millis(),
                        "dependency check timed out"
                    );
                    Health::NotOk
                }
            };

            let outcome = CheckOutcome {
                service_id: probe.service_id().to_string(),
                affects: probe.affects().to_vec(),
                health,
                observed_at,
            };
            // The channel is sized to the probe count, so sends cannot block.
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(total);
    while outcomes.len() < total {
        match rx.recv().await {
            Some(outcome) => outcomes.push(outcome),
            None => break,
        }
    }
    outcomes
}

/// Run one cycle and push the results into `state`.
///
/// With zero probes the state is left untouched. Check failures never
/// propagate as errors; they surface as diagnostics and signal flips only.
pub async fn probe_once(state: &StateHandle, timeout: Duration, probes: &[Arc<dyn Probe>]) {
    if probes.is_empty() {
        return;
    }
    let outcomes = run_cycle(timeout, probes).await;
    apply_outcomes(state, &outcomes);
}

/// Fold cycle outcomes into the shared state.
///
/// A composite signal is updated only when at least one outcome affects it;
/// signals without contributors this cycle keep their previous value.
fn apply_outcomes(state: &StateHandle, outcomes: &[CheckOutcome]) {
    let mut startup_ok: Option<bool> = None;
    let mut ready_ok: Option<bool> = None;
    let mut live_ok: Option<bool> = None;

    for outcome in outcomes {
        state.append_diagnostic(
            &outcome.service_id,
            timestamped(outcome.health, outcome.observed_at),
        );

        let ok = outcome.health.is_ok();
        for signal in &outcome.affects {
            let tally = match signal {
                Signal::Startup => &mut startup_ok,
                Signal::Ready => &mut ready_ok,
                Signal::Live => &mut live_ok,
            };
            *tally = Some(tally.unwrap_or(true) && ok);
        }
    }

    for (signal, tally) in [
        (Signal::Startup, startup_ok),
        (Signal::Ready, ready_ok),
        (Signal::Live, live_ok),
    ] {
        if let Some(all_ok) = tally {
            state.set_signal(signal, !all_ok);
        }
    }
}
