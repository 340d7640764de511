//! Composite signal and health verdict types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A composite health signal, one per Kubernetes probe kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Startup,
    Ready,
    Live,
}

impl Signal {
    /// All composite signals, in reporting order.
    pub const ALL: [Signal; 3] = [Signal::Startup, Signal::Ready, Signal::Live];

    /// Diagnostics key written whenever this signal changes.
    pub fn diagnostics_key(&self) -> String {
        format!("probe->{self}")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Startup => "startup",
            Signal::Ready => "ready",
            Signal::Live => "live",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health verdict as rendered into diagnostics values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Ok,
    NotOk,
}

impl Health {
    pub fn from_ok(ok: bool) -> Self {
        if ok { Health::Ok } else { Health::NotOk }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Health::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Ok => "OK",
            Health::NotOk => "NOT OK",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
