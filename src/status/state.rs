//! Shared probe state.
//!
//! Holds the three composite signal flags and the diagnostics map that the
//! reporting surfaces render. All mutation goes through a single exclusive
//! lock; readers get copies and never hold the lock across user code.

use crate::status::{Health, Signal};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;

/// Callback invoked after every composite signal mutation with the signal and
/// its new "not ok" value.
///
/// Listeners run with no state lock held and may re-enter the state freely,
/// including `set_signal`; a nested mutation's notification is delivered
/// after the current one. Delivery order always matches mutation order.
pub type StatusListener = Box<dyn Fn(Signal, bool) + Send>;

#[derive(Debug, Default)]
struct Inner {
    not_startup: bool,
    not_ready: bool,
    not_live: bool,
    diagnostics: HashMap<String, String>,
}

/// Thread-safe record of the three composite signals plus diagnostics.
///
/// A fresh state reports all three signals unhealthy: the service has not
/// proven anything until the first probe cycle completes.
pub struct ProbeState {
    inner: Mutex<Inner>,
    listener: Mutex<Option<StatusListener>>,
    pending: Mutex<VecDeque<(Signal, bool)>>,
}

impl ProbeState {
    pub fn new() -> Self {
        let state = Self {
            inner: Mutex::new(Inner::default()),
            listener: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
        };
        for signal in Signal::ALL {
            state.set_signal(signal, true);
        }
        state
    }

    /// Set a composite signal and record its diagnostics entry.
    pub fn set_signal(&self, signal: Signal, not_ok: bool) {
        let mut inner = self.inner.lock();
        match signal {
            Signal::Startup => inner.not_startup = not_ok,
            Signal::Ready => inner.not_ready = not_ok,
            Signal::Live => inner.not_live = not_ok,
        }
        let health = Health::from_ok(!not_ok);
        inner
            .diagnostics
            .insert(signal.diagnostics_key(), timestamped(health, SystemTime::now()));

        // Queued while the state lock is held so delivery order matches
        // mutation order. The pending queue's lock is only ever taken for a
        // push or pop, never around user code, so nesting it under the state
        // lock cannot deadlock.
        self.pending.lock().push_back((signal, not_ok));
        drop(inner);
        self.notify();
    }

    /// Deliver queued notifications.
    ///
    /// The listener lock doubles as the drain gate: whoever holds it pops
    /// the queue until empty, so a thread that loses the `try_lock` race can
    /// leave delivery to the current holder. No lock acquired here is ever
    /// waited on while the state lock is held, and the callback runs with
    /// only the listener lock held, which it never takes itself.
    fn notify(&self) {
        loop {
            {
                let Some(listener) = self.listener.try_lock() else {
                    return;
                };
                loop {
                    // Scoped so the queue lock is released before the
                    // callback runs; a re-entrant `set_signal` pushes onto
                    // the queue and must not find it held.
                    let next = self.pending.lock().pop_front();
                    let Some((signal, not_ok)) = next else { break };
                    if let Some(callback) = listener.as_ref() {
                        callback(signal, not_ok);
                    }
                }
            }
            // A notification pushed after the drain saw an empty queue but
            // before the listener lock was released would otherwise sit
            // undelivered until the next mutation.
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }

    /// Current "not ok" value of a composite signal.
    pub fn not_ok(&self, signal: Signal) -> bool {
        let inner = self.inner.lock();
        match signal {
            Signal::Startup => inner.not_startup,
            Signal::Ready => inner.not_ready,
            Signal::Live => inner.not_live,
        }
    }

    /// Insert or overwrite a diagnostics entry; last write for a key wins.
    pub fn append_diagnostic(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.lock().diagnostics.insert(key.into(), value.into());
    }

    /// Deep copy of the diagnostics map, safe to iterate without the lock.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.lock().diagnostics.clone()
    }

    /// Replace the change listener; `None` disables notification.
    pub fn set_listener(&self, listener: Option<StatusListener>) {
        *self.listener.lock() = listener;
        // A mutation racing with the swap may have skipped delivery because
        // this thread held the listener lock; pick up anything it queued.
        self.notify();
    }
}

impl Default for ProbeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a diagnostics value: `"<OK|NOT OK>: <RFC3339 timestamp>"`.
pub(crate) fn timestamped(health: Health, at: SystemTime) -> String {
    format!("{}: {}", health, humantime::format_rfc3339_seconds(at))
}

/// Handle to a possibly-absent [`ProbeState`].
///
/// Components hold this instead of `Arc<ProbeState>` so that health wiring
/// can happen before full initialization: every mutator on an absent handle
/// is a no-op and every reader returns the healthy/empty default.
#[derive(Clone)]
pub struct StateHandle(Option<Arc<ProbeState>>);

impl StateHandle {
    /// Handle backed by a fresh state (all signals unhealthy).
    pub fn new() -> Self {
        Self(Some(Arc::new(ProbeState::new())))
    }

    /// Handle with no backing state.
    pub fn absent() -> Self {
        Self(None)
    }

    pub fn set_signal(&self, signal: Signal, not_ok: bool) {
        if let Some(state) = &self.0 {
            state.set_signal(signal, not_ok);
        }
    }

    /// `false` (healthy) when the handle is absent.
    pub fn not_ok(&self, signal: Signal) -> bool {
        self.0.as_ref().is_some_and(|state| state.not_ok(signal))
    }

    pub fn append_diagnostic(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(state) = &self.0 {
            state.append_diagnostic(key, value);
        }
    }

    /// Empty when the handle is absent.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.0
            .as_ref()
            .map(|state| state.snapshot())
            .unwrap_or_default()
    }

    pub fn set_listener(&self, listener: Option<StatusListener>) {
        if let Some(state) = &self.0 {
            state.set_listener(listener);
        }
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Arc<ProbeState>> for StateHandle {
    fn from(state: Arc<ProbeState>) -> Self {
        Self(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn test_new_state_is_unhealthy() {
        let state = ProbeState::new();
        assert!(state.not_ok(Signal::Startup));
        assert!(state.not_ok(Signal::Ready));
        assert!(state.not_ok(Signal::Live));

        let snapshot = state.snapshot();
        for signal in Signal::ALL {
            let value = snapshot
                .get(&signal.diagnostics_key())
                .unwrap_or_else(|| panic!("missing entry for {signal}"));
            assert!(value.starts_with("NOT OK: "), "unexpected value {value}");
        }
    }

    #[test]
    fn test_set_signal_roundtrip() {
        let state = ProbeState::new();
        state.set_signal(Signal::Ready, false);
        assert!(!state.not_ok(Signal::Ready));
        assert!(state.not_ok(Signal::Live));

        let value = state.snapshot().get("probe->ready").cloned().unwrap();
        assert!(value.starts_with("OK: "), "unexpected value {value}");
    }

    #[test]
    fn test_append_diagnostic_last_write_wins() {
        let state = ProbeState::new();
        state.append_diagnostic("db", "OK: first");
        state.append_diagnostic("db", "NOT OK: second");
        assert_eq!(state.snapshot().get("db").map(String::as_str), Some("NOT OK: second"));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let state = ProbeState::new();
        state.append_diagnostic("db", "OK: now");
        let mut snapshot = state.snapshot();
        snapshot.insert("db".to_string(), "tampered".to_string());
        assert_eq!(state.snapshot().get("db").map(String::as_str), Some("OK: now"));
    }

    #[test]
    fn test_listener_sees_post_mutation_value() {
        let state = StdArc::new(ProbeState::new());
        let seen = StdArc::new(StdMutex::new(Vec::new()));

        let seen_by_listener = StdArc::clone(&seen);
        state.set_listener(Some(Box::new(move |signal, not_ok| {
            seen_by_listener.lock().unwrap().push((signal, not_ok));
        })));

        state.set_signal(Signal::Ready, false);
        state.set_signal(Signal::Live, true);

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(Signal::Ready, false), (Signal::Live, true)]);
    }

    #[test]
    fn test_listener_may_reenter_state_reads() {
        let state = StdArc::new(ProbeState::new());
        let observed = StdArc::new(AtomicUsize::new(0));

        let inner_state = StdArc::clone(&state);
        let observed_by_listener = StdArc::clone(&observed);
        state.set_listener(Some(Box::new(move |signal, _| {
            // Reads and diagnostic writes from the listener must not deadlock.
            let _ = inner_state.not_ok(signal);
            inner_state.append_diagnostic("listener", "fired");
            observed_by_listener.fetch_add(1, Ordering::SeqCst);
        })));

        state.set_signal(Signal::Startup, false);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert_eq!(
            state.snapshot().get("listener").map(String::as_str),
            Some("fired")
        );
    }

    #[test]
    fn test_listener_may_set_signals_reentrantly() {
        let state = StdArc::new(ProbeState::new());
        let seen = StdArc::new(StdMutex::new(Vec::new()));

        let inner_state = StdArc::clone(&state);
        let seen_by_listener = StdArc::clone(&seen);
        state.set_listener(Some(Box::new(move |signal, not_ok| {
            seen_by_listener.lock().unwrap().push((signal, not_ok));
            // A nested mutation's notification arrives after this one.
            if signal == Signal::Ready && !not_ok {
                inner_state.set_signal(Signal::Live, false);
            }
        })));

        state.set_signal(Signal::Ready, false);

        assert!(!state.not_ok(Signal::Live));
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(Signal::Ready, false), (Signal::Live, false)]);
    }

    #[test]
    fn test_concurrent_writers_with_reentrant_listener() {
        // Writers on several threads while the listener re-enters the state
        // must all run to completion; a lock ordering regression shows up
        // here as a recv timeout instead of a hang.
        let state = StdArc::new(ProbeState::new());

        let inner_state = StdArc::clone(&state);
        state.set_listener(Some(Box::new(move |signal, _| {
            let _ = inner_state.not_ok(signal);
            inner_state.append_diagnostic("listener", "fired");
        })));

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let mut writers = Vec::new();
        for id in 0..4 {
            let state = StdArc::clone(&state);
            let done = done_tx.clone();
            writers.push(std::thread::spawn(move || {
                for round in 0..200 {
                    let signal = Signal::ALL[(id + round) % Signal::ALL.len()];
                    state.set_signal(signal, round % 2 == 0);
                }
                done.send(id).unwrap();
            }));
        }
        drop(done_tx);

        for _ in 0..4 {
            done_rx
                .recv_timeout(std::time::Duration::from_secs(10))
                .expect("writer thread did not finish");
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }

    #[test]
    fn test_disabling_listener() {
        let state = ProbeState::new();
        let count = StdArc::new(AtomicUsize::new(0));

        let counted = StdArc::clone(&count);
        state.set_listener(Some(Box::new(move |_, _| {
            counted.fetch_add(1, Ordering::SeqCst);
        })));
        state.set_signal(Signal::Ready, false);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        state.set_listener(None);
        state.set_signal(Signal::Ready, true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_absent_handle_defaults() {
        let handle = StateHandle::absent();

        // Mutators are no-ops, readers return healthy/empty defaults.
        handle.set_signal(Signal::Ready, true);
        handle.append_diagnostic("db", "NOT OK: now");
        handle.set_listener(Some(Box::new(|_, _| {})));

        assert!(!handle.not_ok(Signal::Ready));
        assert!(handle.snapshot().is_empty());
    }

    #[test]
    fn test_handle_forwards_to_state() {
        let handle = StateHandle::new();
        assert!(handle.not_ok(Signal::Live));
        handle.set_signal(Signal::Live, false);
        assert!(!handle.not_ok(Signal::Live));
    }

    #[test]
    fn test_timestamped_format() {
        let value = timestamped(Health::Ok, std::time::UNIX_EPOCH);
        assert_eq!(value, "OK: 1970-01-01T00:00:00Z");
    }
}
