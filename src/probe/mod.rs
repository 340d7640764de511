//! Dependency probing: the check capability, the fan-out/fan-in cycle runner
//! and the periodic driver.

mod check;
mod runner;
mod scheduler;

pub use check::{Checker, DepProbe, Probe};
pub use runner::{probe_once, run_cycle, CheckOutcome};
pub use scheduler::{Prober, ProberHandle};
