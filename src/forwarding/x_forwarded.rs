//! De-facto `X-Forwarded-*` header parsing.
//!
//! Each header is a comma-separated list, client-closest first. Only the
//! first member of the first header instance is ever consulted.

use crate::forwarding::address::{parse_node, parse_port, NodeAddress};
use crate::forwarding::headers::{HeaderView, X_FORWARDED_FOR, X_FORWARDED_PORT, X_FORWARDED_PROTO};

/// First list member of a header, trimmed. Empty members are absent.
pub fn first_token<'a>(values: &[&'a str]) -> Option<&'a str> {
    let token = values.first()?.split(',').next()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Client node from `X-Forwarded-For`, with its port taken from
/// `X-Forwarded-Port` when that header carries a valid one.
pub fn client_node<H: HeaderView + ?Sized>(headers: &H) -> Option<NodeAddress> {
    let mut node = first_token(&headers.values_of(X_FORWARDED_FOR)).and_then(parse_node)?;
    if let Some(port) = first_token(&headers.values_of(X_FORWARDED_PORT)).and_then(parse_port) {
        node.port = Some(port);
    }
    Some(node)
}

/// Client scheme from `X-Forwarded-Proto`.
///
/// `None` only when the header is absent or every instance is empty; a
/// blank first member is returned as `""`.
pub fn client_proto<H: HeaderView + ?Sized>(headers: &H) -> Option<&str> {
    let values = headers.values_of(X_FORWARDED_PROTO);
    if values.iter().all(|v| v.is_empty()) {
        return None;
    }
    values.first().copied().map(|v| v.split(',').next().unwrap_or_default().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarding::address::Host;

    #[test]
    fn first_token_only() {
        assert_eq!(first_token(&["203.0.113.5, 70.41.3.18"]), Some("203.0.113.5"));
        assert_eq!(first_token(&["a", "b"]), Some("a"));
        assert_eq!(first_token(&[" , 70.41.3.18"]), None);
        assert_eq!(first_token(&[]), None);
    }

    #[test]
    fn port_header_overrides_embedded_port() {
        let headers = [("x-forwarded-for", "10.0.0.1:1111"), ("x-forwarded-port", "2222")];
        assert_eq!(client_node(&headers[..]).unwrap().port, Some(2222));

        let headers = [("x-forwarded-for", "10.0.0.1:1111"), ("x-forwarded-port", "nope")];
        assert_eq!(client_node(&headers[..]).unwrap().port, Some(1111));
    }

    #[test]
    fn bracketed_ipv6_with_port_header() {
        let headers = [("X-Forwarded-For", "[2001:db8::1]"), ("X-Forwarded-Port", "8443")];
        let node = client_node(&headers[..]).unwrap();
        assert_eq!(node.host, Host::Ip("2001:db8::1".parse().unwrap()));
        assert_eq!(node.port, Some(8443));
    }

    #[test]
    fn port_alone_is_not_a_client() {
        let headers = [("x-forwarded-port", "443")];
        assert_eq!(client_node(&headers[..]), None);
    }

    #[test]
    fn proto_is_trimmed() {
        let headers = [("x-forwarded-proto", "  HTTPS , http")];
        assert_eq!(client_proto(&headers[..]), Some("HTTPS"));
        let headers = [("x-forwarded-proto", "")];
        assert_eq!(client_proto(&headers[..]), None);
    }

    #[test]
    fn blank_proto_member_is_not_absent() {
        let headers = [("x-forwarded-proto", " , https")];
        assert_eq!(client_proto(&headers[..]), Some(""));
        let headers = [("x-forwarded-proto", "   ")];
        assert_eq!(client_proto(&headers[..]), Some(""));
        let headers = [("x-forwarded-proto", ""), ("x-forwarded-proto", "https")];
        assert_eq!(client_proto(&headers[..]), Some(""));
        let headers = [("x-forwarded-proto", ""), ("x-forwarded-proto", "")];
        assert_eq!(client_proto(&headers[..]), None);
    }
}
