//! Dependency check capability.
//!
//! A [`Probe`] couples a stable service id and the composite signals it
//! affects with a [`Checker`], the single bounded check attempt. Closures
//! returning a future implement `Checker` directly, so a bare async fn can be
//! passed wherever a checker is expected.

use crate::status::Signal;
use anyhow::Result;
use futures::future::BoxFuture;
use std::future::Future;

/// One bounded check attempt against an external dependency.
///
/// The cycle runner enforces the deadline by dropping the returned future on
/// timeout, so implementations need no internal timeout of their own.
pub trait Checker: Send + Sync {
    fn check(&self) -> BoxFuture<'_, Result<()>>;
}

impl<F, Fut> Checker for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn check(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin((self)())
    }
}

/// A probed dependency: who it is, which composite signals it affects, and
/// how to check it.
pub trait Probe: Send + Sync {
    /// Stable identifier, used as the dependency's diagnostics key.
    fn service_id(&self) -> &str;

    /// Composite signals that flip when this dependency fails. May be empty,
    /// in which case failures only surface as a diagnostics entry.
    fn affects(&self) -> &[Signal];

    /// Runs one check attempt.
    fn check(&self) -> BoxFuture<'_, Result<()>>;
}

/// Concrete [`Probe`] backed by any [`Checker`].
pub struct DepProbe {
    id: String,
    affects: Vec<Signal>,
    checker: Option<Box<dyn Checker>>,
}

impl DepProbe {
    pub fn new(id: impl Into<String>, affects: Vec<Signal>, checker: impl Checker + 'static) -> Self {
        Self {
            id: id.into(),
            affects,
            checker: Some(Box::new(checker)),
        }
    }

    /// Probe without a checker; always reports success. Useful as a fixture
    /// and as the defensive default for unset checkers.
    pub fn inert(id: impl Into<String>, affects: Vec<Signal>) -> Self {
        Self {
            id: id.into(),
            affects,
            checker: None,
        }
    }
}

impl Probe for DepProbe {
    fn service_id(&self) -> &str {
        &self.id
    }

    fn affects(&self) -> &[Signal] {
        &self.affects
    }

    fn check(&self) -> BoxFuture<'_, Result<()>> {
        match &self.checker {
            Some(checker) => checker.check(),
            None => Box::pin(async { anyhow::Ok(()) }),
        }
    }
}
