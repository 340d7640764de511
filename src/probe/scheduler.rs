//! Periodic probe driver.
//!
//! Runs one cycle immediately at start, then one per tick. The cycle is
//! awaited inside the driver loop and missed ticks are skipped, so cycles
//! never overlap.

use crate::probe::{probe_once, Probe};
use crate::status::StateHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodic driver that re-probes all registered dependencies.
///
/// The interval doubles as the per-check timeout unless
/// [`with_timeout`](Prober::with_timeout) overrides it.
pub struct Prober {
    state: StateHandle,
    interval: Duration,
    timeout: Duration,
    probes: Vec<Arc<dyn Probe>>,
}

impl Prober {
    pub fn new(state: StateHandle, interval: Duration) -> Self {
        Self {
            state,
            interval,
            timeout: interval,
            probes: Vec::new(),
        }
    }

    /// Override the per-check timeout (defaults to the interval).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn register(mut self, probe: impl Probe + 'static) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    pub fn register_all(mut self, probes: Vec<Arc<dyn Probe>>) -> Self {
        self.probes.extend(probes);
        self
    }

    /// Start the driver task.
    ///
    /// With no probes registered this returns an inert handle and no task is
    /// spawned. Otherwise the first cycle runs immediately so a fresh process
    /// reflects real dependency state without waiting a full interval.
    pub fn start(self) -> ProberHandle {
        if self.probes.is_empty() {
            debug!("no probes registered, prober not started");
            return ProberHandle {
                shutdown: None,
                task: None,
            };
        }

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let Prober {
            state,
            interval,
            timeout,
            probes,
        } = self;

        let task = tokio::spawn(async move {
            info!(
                probes = probes.len(),
                interval_ms = interval.as_millis(),
                timeout_ms = timeout.as_millis(),
                "prober starting"
            );

            probe_once(&state, timeout, &probes).await;

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the initial cycle already
            // ran, so consume it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        probe_once(&state, timeout, &probes).await;
                    }

                    _ = shutdown_rx.recv() => {
                        info!("prober shutting down");
                        break;
                    }
                }
            }
        });

        ProberHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running prober.
///
/// Stopping only prevents future cycles from being scheduled; checks already
/// in flight finish on their own, bounded by the per-check timeout. One-shot:
/// a stopped prober cannot be restarted.
pub struct ProberHandle {
    shutdown: Option<broadcast::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ProberHandle {
    /// `false` for the inert handle returned when no probes were registered.
    pub fn is_active(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Request the driver to stop. Safe to call on an inert handle.
    pub fn stop(&self) {
        if let Some(tx) = &self.shutdown {
            let _ = tx.send(());
        }
    }

    /// Stop the driver and wait for it to exit.
    pub async fn stopped(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::DepProbe;
    use crate::status::Signal;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    #[tokio::test]
    async fn test_empty_prober_returns_inert_handle() {
        let state = StateHandle::new();
        let handle = Prober::new(state.clone(), Duration::from_millis(10)).start();

        assert!(!handle.is_active());
        handle.stop();
        handle.stopped().await;

        // No cycle ran, initial unhealthy state is untouched.
        assert!(state.not_ok(Signal::Ready));
    }

    #[tokio::test]
    async fn test_first_cycle_runs_immediately() {
        let state = StateHandle::new();
        let handle = Prober::new(state.clone(), Duration::from_secs(3600))
            .register(DepProbe::new("db", vec![Signal::Ready], || async { anyhow::Ok(()) }))
            .start();

        assert!(handle.is_active());
        // Well before the first tick the initial cycle must have landed.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!state.not_ok(Signal::Ready));

        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_cycles_repeat_and_track_dependency_recovery() {
        let state = StateHandle::new();
        let healthy = StdArc::new(AtomicBool::new(false));

        let flag = StdArc::clone(&healthy);
        let handle = Prober::new(state.clone(), Duration::from_millis(50))
            .register(DepProbe::new("db", vec![Signal::Ready], move || {
                let flag = StdArc::clone(&flag);
                async move {
                    if flag.load(Ordering::SeqCst) {
                        Ok(())
                    } else {
                        Err(anyhow!("still down"))
                    }
                }
            }))
            .start();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(state.not_ok(Signal::Ready));

        healthy.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!state.not_ok(Signal::Ready));

        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_stop_prevents_future_cycles() {
        let state = StateHandle::new();
        let cycles = StdArc::new(AtomicUsize::new(0));

        let counter = StdArc::clone(&cycles);
        let handle = Prober::new(state.clone(), Duration::from_millis(30))
            .register(DepProbe::new("db", vec![Signal::Ready], move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { anyhow::Ok(()) }
            }))
            .start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stopped().await;

        let after_stop = cycles.load(Ordering::SeqCst);
        assert!(after_stop >= 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cycles.load(Ordering::SeqCst), after_stop);
    }
}
