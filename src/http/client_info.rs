//! Client identity middleware.
//!
//! Resolves the real client address and scheme once per request and
//! attaches them as a [`ClientInfo`] extension, so handlers never see the
//! proxy's own peer address.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::forwarding::{AddressSource, ForwardingResolver, RemoteAddress};
use crate::http::request::RequestIdExt;
use crate::observability::metrics;

/// Effective client identity of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    /// Resolved client address.
    pub address: RemoteAddress,
    /// Whether the client's own hop used TLS.
    pub secure: bool,
    /// Which header supplied `address`.
    pub source: AddressSource,
}

/// State for the client info middleware.
#[derive(Clone)]
pub struct ClientInfoState {
    /// Current resolver; replaced wholesale on config reload.
    pub resolver: Arc<ArcSwap<ForwardingResolver>>,
    /// Whether this listener terminates TLS.
    pub connection_tls: bool,
}

impl ClientInfoState {
    pub fn new(resolver: Arc<ArcSwap<ForwardingResolver>>, connection_tls: bool) -> Self {
        Self {
            resolver,
            connection_tls,
        }
    }

    /// Resolve the identity of a request arriving from `peer`.
    pub fn resolve<B>(&self, request: &Request<B>, peer: SocketAddr) -> ClientInfo {
        let resolver = self.resolver.load();
        let connection = RemoteAddress::from(peer);
        let (address, source) =
            resolver.resolve_remote_address_with_source(request.headers(), &connection);
        let secure = resolver.resolve_scheme(request.headers(), self.connection_tls);
        ClientInfo {
            address,
            secure,
            source,
        }
    }
}

/// Middleware that inserts [`ClientInfo`] into request extensions.
pub async fn client_info_middleware(
    State(state): State<ClientInfoState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();

    let peer = match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => *addr,
        None => {
            tracing::warn!("Connection info missing, using unspecified peer address");
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        }
    };

    let info = state.resolve(&request, peer);

    tracing::debug!(
        request_id = request.request_id().unwrap_or("unknown"),
        peer = %peer,
        client = %info.address,
        source = %info.source,
        secure = info.secure,
        "Resolved client identity"
    );
    metrics::record_resolution(info.source);
    metrics::record_scheme(info.secure);

    request.extensions_mut().insert(info);
    let response = next.run(request).await;

    metrics::record_request(response.status().as_u16(), start);
    response
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<ClientInfo>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Client info middleware not installed",
        ))
    }
}
