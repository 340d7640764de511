//! Composite health signals and the shared probe state store.

mod signal;
mod state;

pub use signal::{Health, Signal};
pub use state::{ProbeState, StateHandle, StatusListener};

pub(crate) use state::timestamped;
