//! Axum-backed [`Server`](crate::Server).

use async_trait::async_trait;
use axum::Router;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::traits::Server;

/// Serves a router on `host:http_port`. Every request gets a tracing span.
///
/// Clones share the bound address, so a clone kept before
/// [`ServerExt::spawn`](crate::ServerExt::spawn) can observe it.
#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    // Some while accepting connections
    local_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: router.layer(TraceLayer::new_for_http()),
            local_addr: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    fn is_running(&self) -> bool {
        self.local_addr.read().is_some()
    }

    async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let requested = self.config.http_addr()?;
        let listener = tokio::net::TcpListener::bind(requested)
            .await
            .map_err(|e| ServerError::bind(requested.to_string(), e))?;

        let bound = listener.local_addr()?;
        *self.local_addr.write() = Some(bound);
        info!(addr = %bound, "Listening for HTTP requests");

        let served = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        *self.local_addr.write() = None;
        match served {
            Ok(()) => {
                info!(addr = %bound, "HTTP server stopped");
                Ok(())
            }
            Err(e) => {
                warn!(addr = %bound, error = %e, "HTTP server exited with error");
                Err(e.into())
            }
        }
    }
}
