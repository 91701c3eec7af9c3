//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the echo handler
//! - Wire up middleware (request ID, tracing, limits, timeout, client info)
//! - Serve over plain TCP or TLS
//! - Swap in a new resolver when the forwarding policy is reloaded

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::any,
    Json, Router,
};
use axum_server::Handle;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::forwarding::{ForwardingError, ForwardingResolver};
use crate::http::client_info::{client_info_middleware, ClientInfo, ClientInfoState};
use crate::http::request::{
    propagate_request_id_layer, request_span, set_request_id_layer, RequestIdExt,
};
use crate::net::tls::load_tls_config;

/// How long in-flight TLS connections get to finish on shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid forwarding policy: {0}")]
    Forwarding(#[from] ForwardingError),

    #[error("TLS is not configured for this listener")]
    TlsNotConfigured,
}

/// Body returned by the echo handler.
#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,
    pub client: ClientInfo,
}

/// HTTP server that exposes resolved client identity.
pub struct HttpServer {
    config: ServiceConfig,
    resolver: Arc<ArcSwap<ForwardingResolver>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let resolver = ForwardingResolver::new(config.forwarding)?;
        Ok(Self {
            config,
            resolver: Arc::new(ArcSwap::from_pointee(resolver)),
        })
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared handle to the live resolver.
    pub fn resolver(&self) -> Arc<ArcSwap<ForwardingResolver>> {
        Arc::clone(&self.resolver)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(&self, connection_tls: bool) -> Router {
        let client_state = ClientInfoState::new(self.resolver(), connection_tls);

        Router::new()
            .route("/", any(echo_handler))
            .route("/{*path}", any(echo_handler))
            .layer(middleware::from_fn_with_state(client_state, client_info_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(self.config.listener.max_concurrent_requests))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
            .layer(set_request_id_layer())
    }

    /// Run the server over plain TCP until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        spawn_reloader(self.resolver(), config_updates);

        let app = self
            .build_router(false)
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS, using the listener's certificate config.
    pub async fn run_tls(
        self,
        config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let tls = self
            .config
            .listener
            .tls
            .as_ref()
            .ok_or(ServerError::TlsNotConfigured)?;
        let rustls_config = load_tls_config(tls).await?;
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        tracing::info!(address = %addr, tls = true, "HTTP server starting");

        spawn_reloader(self.resolver(), config_updates);

        let handle = Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        let app = self
            .build_router(true)
            .into_make_service_with_connect_info::<SocketAddr>();

        axum_server::bind_rustls(addr, rustls_config)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Apply forwarding policy changes from reloaded configs.
///
/// Other settings only take effect after a restart.
fn spawn_reloader(
    resolver: Arc<ArcSwap<ForwardingResolver>>,
    mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
) {
    tokio::spawn(async move {
        while let Some(config) = config_updates.recv().await {
            match ForwardingResolver::new(config.forwarding) {
                Ok(new_resolver) => {
                    tracing::info!(policy = ?new_resolver.policy(), "Forwarding policy reloaded");
                    resolver.store(Arc::new(new_resolver));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Rejected reloaded forwarding policy");
                }
            }
        }
    });
}

/// Echo the resolved client identity back as JSON.
async fn echo_handler(client: ClientInfo, request: Request<Body>) -> Json<EchoResponse> {
    Json(EchoResponse {
        request_id: request.request_id().map(str::to_string),
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        client,
    })
}
