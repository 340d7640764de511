//! HTTP reporting surface for the probe endpoints.
//!
//! Serves `/-/startup`, `/-/ready` and `/-/live`: 200 while the signal is
//! healthy, 503 otherwise, with the full diagnostics snapshot as the body in
//! the negotiated content type.

mod negotiate;

pub use negotiate::{
    negotiate, ACCEPTED_CONTENT_TYPES, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON, CONTENT_TYPE_PLAIN,
    CONTENT_TYPE_XML,
};

use crate::status::{Signal, StateHandle};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub const PATH_STARTUP: &str = "/-/startup";
pub const PATH_READY: &str = "/-/ready";
pub const PATH_LIVE: &str = "/-/live";

/// HTTP server exposing the probe endpoints.
pub struct HealthServer {
    listener: TcpListener,
    state: StateHandle,
}

impl HealthServer {
    /// Bind the server socket.
    pub async fn bind(address: SocketAddr, state: StateHandle) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        info!(address = %listener.local_addr()?, "health server bound");
        Ok(Self { listener, state })
    }

    /// Actual bound address, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve probe requests until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let state = self.state.clone();

                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let state = state.clone();
                                    async move { handle_request(req, &state) }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!(error = %e, "probe connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept probe connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("health server shutting down");
                    break;
                }
            }
        }
    }
}

/// Route a probe request and render the response.
fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: &StateHandle,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if req.method() != Method::GET {
        return Ok(Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .body(Full::new(Bytes::from("Method not allowed\n")))
            .unwrap());
    }

    let signal = match req.uri().path() {
        PATH_STARTUP => Signal::Startup,
        PATH_READY => Signal::Ready,
        PATH_LIVE => Signal::Live,
        _ => {
            return Ok(Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("Not found\n")))
                .unwrap());
        }
    };

    let status = if state.not_ok(signal) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let accept = req.headers().get(ACCEPT).and_then(|v| v.to_str().ok());
    let (content_type, body) = negotiate(accept, &state.snapshot());

    debug!(path = %req.uri().path(), status = %status, content_type, "probe request");

    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(ACCEPT, ACCEPTED_CONTENT_TYPES)
        .body(Full::new(body))
        .unwrap())
}
