//! probewatch - Kubernetes-style health probing for services with external
//! dependencies.
//!
//! This crate provides:
//! - A thread-safe store for the startup/ready/live composite signals with a
//!   diagnostics map and change notification
//! - A fan-out/fan-in prober that checks all dependencies concurrently with a
//!   bounded per-check timeout
//! - A periodic driver with graceful stop
//! - HTTP probe endpoints with content negotiation
//! - Built-in TCP and HTTP dependency checkers

pub mod checks;
pub mod config;
pub mod probe;
pub mod server;
pub mod status;
pub mod util;

pub use config::Config;
