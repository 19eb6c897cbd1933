//! HTTP/1.1 server implementation

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE, SERVER};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use sessiongate_core::auth::{unix_now, RevocationRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::handlers::handle_request;
use crate::state::AppState;

pub type ResponseBody = Full<Bytes>;

pub struct SessionGateServer {
    state: AppState,
    sweep_interval: Duration,
}

impl SessionGateServer {
    pub fn new(state: AppState, sweep_interval: Duration) -> Self {
        Self {
            state,
            sweep_interval,
        }
    }

    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("sessiongate server listening on {}", listener.local_addr()?);
        self.serve_listener(listener).await
    }

    /// Accept connections on an already bound listener until accept fails
    pub async fn serve_listener(self, listener: TcpListener) -> anyhow::Result<()> {
        let sweeper = spawn_revocation_sweeper(self.state.registry.clone(), self.sweep_interval);

        let result = loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => break Err(e.into()),
            };
            debug!("New connection from {}", remote_addr);

            let state = self.state.clone();
            tokio::spawn(async move {
                if let Err(err) = Self::handle_connection(stream, state).await {
                    error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        };

        sweeper.abort();
        result
    }

    async fn handle_connection(stream: TcpStream, state: AppState) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, state).await }
        });

        http1::Builder::new().serve_connection(io, service).await
    }
}

/// Periodically evict revocations whose tokens have expired on their own
pub fn spawn_revocation_sweeper(
    registry: Arc<RevocationRegistry>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = registry.purge_expired(unix_now());
            if purged > 0 {
                info!(purged, remaining = registry.len(), "evicted expired revocations");
            } else {
                debug!(remaining = registry.len(), "revocation sweep found nothing to evict");
            }
        }
    })
}

/// JSON response with the standard headers
pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        SERVER,
        HeaderValue::from_static(concat!("sessiongate/", env!("CARGO_PKG_VERSION"))),
    );
    response
}
