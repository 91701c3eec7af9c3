//! Client identity resolution behind reverse proxies.
//!
//! # Data Flow
//! ```text
//! request headers + connection peer + connection TLS flag
//!     → forwarded.rs   (RFC 7239 `Forwarded`, candidate F)
//!     → x_forwarded.rs (`X-Forwarded-For` / `-Port`, candidate X)
//!     → ForwardingResolver (policy decides between F, X and the peer)
//!     → resolved RemoteAddress, effective TLS flag
//! ```
//!
//! # Design Decisions
//! - Header content never produces an error; garbage degrades to the peer
//! - The resolver is immutable and shared across requests
//! - No trusted-proxy list: whatever the first hop claims is taken as-is
//!
//! See <https://tools.ietf.org/html/rfc7239> and
//! <https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/X-Forwarded-For>.

pub mod address;
pub mod forwarded;
pub mod headers;
pub mod x_forwarded;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use address::{Host, NodeAddress, RemoteAddress};
pub use forwarded::{parse_forwarded, ForwardedElement};
pub use headers::HeaderView;

use headers::{FORWARDED, X_FORWARDED_FOR};

const HTTPS: &str = "https";

/// Errors raised while building a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardingError {
    /// Neither header family is enabled.
    #[error("at least one forwarding header family must be supported")]
    NoHeaderFamily,
}

/// Which forwarding headers are trusted, and which wins when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingPolicy {
    /// Honour the RFC 7239 `Forwarded` header.
    pub support_forwarded: bool,

    /// Honour `X-Forwarded-For` / `X-Forwarded-Port`.
    pub support_x_forwarded: bool,

    /// Prefer `Forwarded` when both families yield an address.
    pub prefer_forwarded: bool,
}

impl Default for ForwardingPolicy {
    fn default() -> Self {
        Self {
            support_forwarded: true,
            support_x_forwarded: true,
            prefer_forwarded: false,
        }
    }
}

impl ForwardingPolicy {
    pub fn validate(&self) -> Result<(), ForwardingError> {
        if !self.support_forwarded && !self.support_x_forwarded {
            return Err(ForwardingError::NoHeaderFamily);
        }
        Ok(())
    }
}

/// Where a resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    Forwarded,
    XForwardedFor,
    Connection,
}

impl AddressSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSource::Forwarded => "forwarded",
            AddressSource::XForwardedFor => "x_forwarded_for",
            AddressSource::Connection => "connection",
        }
    }
}

impl std::fmt::Display for AddressSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the real client address and scheme from forwarding headers.
#[derive(Debug, Clone, Default)]
pub struct ForwardingResolver {
    policy: ForwardingPolicy,
}

impl ForwardingResolver {
    /// Create a resolver; fails if the policy enables no header family.
    pub fn new(policy: ForwardingPolicy) -> Result<Self, ForwardingError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ForwardingPolicy {
        &self.policy
    }

    /// Remote client address, or `connection` when headers do not name one.
    pub fn resolve_remote_address<H: HeaderView + ?Sized>(
        &self,
        headers: &H,
        connection: &RemoteAddress,
    ) -> RemoteAddress {
        self.resolve_remote_address_with_source(headers, connection).0
    }

    /// Like [`resolve_remote_address`](Self::resolve_remote_address), also
    /// reporting which header (if any) supplied the address.
    pub fn resolve_remote_address_with_source<H: HeaderView + ?Sized>(
        &self,
        headers: &H,
        connection: &RemoteAddress,
    ) -> (RemoteAddress, AddressSource) {
        if headers.is_empty() {
            return (connection.clone(), AddressSource::Connection);
        }

        let forwarded = if self.policy.support_forwarded && headers.contains(FORWARDED) {
            forwarded::first_client(headers.values_of(FORWARDED))
        } else {
            None
        };

        let x_forwarded = if self.policy.support_x_forwarded && headers.contains(X_FORWARDED_FOR) {
            x_forwarded::client_node(headers)
        } else {
            None
        };

        let (node, source) = match (forwarded, x_forwarded) {
            (Some(f), Some(_)) if self.policy.prefer_forwarded => (f, AddressSource::Forwarded),
            (_, Some(x)) => (x, AddressSource::XForwardedFor),
            (Some(f), None) => (f, AddressSource::Forwarded),
            (None, None) => return (connection.clone(), AddressSource::Connection),
        };

        (node.with_fallback_port(connection.port), source)
    }

    /// Whether the client's own hop used TLS.
    ///
    /// Only `X-Forwarded-Proto` is consulted; `Forwarded; proto=` is not.
    pub fn resolve_scheme<H: HeaderView + ?Sized>(&self, headers: &H, connection_was_tls: bool) -> bool {
        if headers.is_empty() {
            return connection_was_tls;
        }
        match x_forwarded::client_proto(headers) {
            Some(proto) => proto.eq_ignore_ascii_case(HTTPS),
            None => connection_was_tls,
        }
    }
}
