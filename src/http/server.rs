//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router that funnels every request into the proxy engine
//! - Serve a plain HTTP listener or a TLS-terminating one
//! - Graceful shutdown on Ctrl+C

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body, extract::State, http::Request, response::Response, routing::any, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::net::tls;
use crate::proxy::ProxyEngine;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ProxyEngine>,
}

/// HTTP server that dispatches every accepted request through the engine.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(engine: Arc<ProxyEngine>) -> Self {
        let state = AppState { engine };
        let router = Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Serve plain HTTP on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "proxy listening");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("proxy stopped");
        Ok(())
    }

    /// Serve the same dispatch loop over TLS with the given certificate
    /// material.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        cert_path: &Path,
        key_path: &Path,
    ) -> Result<(), std::io::Error> {
        let config = tls::load_tls_config(cert_path, key_path).await?;
        tracing::info!(address = %addr, "proxy listening (tls)");

        axum_server::bind_rustls(addr, config)
            .serve(self.router.into_make_service())
            .await
    }
}

/// Every request, any method, any path: one trip through the engine.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.engine.serve(request).await
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
