//! Admin API server.

use crate::admin_api::router::route_request;
use crate::sync::ControlPlaneSynchronizer;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Pause after a failed accept (fd exhaustion and the like)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Admin API server for the control plane
pub struct AdminApiServer {
    addr: SocketAddr,
    sync: Arc<ControlPlaneSynchronizer>,
}

impl AdminApiServer {
    pub fn new(addr: SocketAddr, sync: Arc<ControlPlaneSynchronizer>) -> Self {
        Self { addr, sync }
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener. Accept errors are logged and
    /// retried; only a broken listener address ends the loop.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        let local = listener.local_addr()?;
        info!(
            engine_connected = self.sync.engine().is_connected(),
            "Mockplane Admin API listening on http://{}", local
        );

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) => {
                    warn!("Admin API accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let sync = Arc::clone(&self.sync);
        tokio::spawn(async move {
            let service = service_fn(move |req| route_request(req, Arc::clone(&sync)));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(%peer, "Admin API connection error: {}", e);
            }
        });
    }
}
