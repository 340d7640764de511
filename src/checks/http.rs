//! HTTP status checker.
//!
//! Issues a minimal HTTP/1.1 GET over a raw TCP stream and compares the
//! response status line against the expected code. Deliberately avoids a full
//! HTTP client: one request, read the status line, done.

use crate::probe::Checker;
use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Succeeds when `GET <path>` returns the expected status code.
#[derive(Debug, Clone)]
pub struct HttpCheck {
    address: SocketAddr,
    path: String,
    expected_status: u16,
}

impl HttpCheck {
    pub fn new(address: SocketAddr, path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            address,
            path: path.into(),
            expected_status,
        }
    }
}

impl Checker for HttpCheck {
    fn check(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut stream = TcpStream::connect(self.address)
                .await
                .with_context(|| format!("connection to {} failed", self.address))?;

            let request = format!(
                "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
                self.path, self.address
            );
            stream
                .write_all(request.as_bytes())
                .await
                .context("failed to send request")?;

            let mut buf = vec![0u8; 1024];
            let n = stream.read(&mut buf).await.context("failed to read response")?;
            if n == 0 {
                bail!("empty response");
            }

            let response = String::from_utf8_lossy(&buf[..n]);
            let status = parse_http_status(&response)?;
            if status != self.expected_status {
                bail!(
                    "unexpected status: {status} (expected {})",
                    self.expected_status
                );
            }
            Ok(())
        })
    }
}

/// Parse the status code out of an HTTP/1.x status line.
fn parse_http_status(response: &str) -> Result<u16> {
    // Format: "HTTP/1.1 200 OK\r\n..."
    let mut parts = response.split_whitespace();
    let (Some(_), Some(code)) = (parts.next(), parts.next()) else {
        bail!("invalid HTTP response");
    };

    code.parse().context("invalid status code")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_status() {
        assert_eq!(parse_http_status("HTTP/1.1 200 OK\r\n").unwrap(), 200);
        assert_eq!(parse_http_status("HTTP/1.0 404 Not Found\r\n").unwrap(), 404);
        assert_eq!(
            parse_http_status("HTTP/1.1 503 Service Unavailable").unwrap(),
            503
        );
    }

    #[test]
    fn test_parse_http_status_invalid() {
        assert!(parse_http_status("invalid").is_err());
        assert!(parse_http_status("").is_err());
    }

    async fn scripted_server(status_line: &'static str) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!("{status_line}\r\nContent-Length: 0\r\n\r\n");
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_http_check_matching_status() {
        let addr = scripted_server("HTTP/1.1 200 OK").await;
        let check = HttpCheck::new(addr, "/healthz", 200);
        assert!(check.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_http_check_unexpected_status() {
        let addr = scripted_server("HTTP/1.1 500 Internal Server Error").await;
        let check = HttpCheck::new(addr, "/healthz", 200);
        let err = check.check().await.unwrap_err();
        assert!(err.to_string().contains("unexpected status: 500"));
    }
}
