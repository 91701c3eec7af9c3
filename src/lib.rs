//! Real client identity behind reverse proxies.
//!
//! Resolves the remote client address and effective TLS flag of a request
//! from the RFC 7239 `Forwarded` header and the `X-Forwarded-*` family, and
//! hosts that resolution in an Axum service.

pub mod config;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use forwarding::{AddressSource, ForwardingError, ForwardingPolicy, ForwardingResolver, RemoteAddress};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
