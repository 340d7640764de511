//! TCP connect checker.

use crate::probe::Checker;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Succeeds when a TCP connection to the dependency can be established.
///
/// The connection is closed immediately; this only proves the dependency is
/// accepting connections.
#[derive(Debug, Clone)]
pub struct TcpCheck {
    address: SocketAddr,
}

impl TcpCheck {
    pub fn new(address: SocketAddr) -> Self {
        Self { address }
    }
}

impl Checker for TcpCheck {
    fn check(&self) -> BoxFuture<'_, Result<()>> {
        let address = self.address;
        Box::pin(async move {
            TcpStream::connect(address)
                .await
                .with_context(|| format!("connection to {address} failed"))?;
            Ok(())
        })
    }
}
