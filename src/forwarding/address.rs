//! Client address types and node parsing.
//!
//! # Responsibilities
//! - Represent a client host (IP literal or hostname) with a port
//! - Parse `host[:port]` nodes as found in `for=` and `X-Forwarded-For`
//! - Parse port tokens from `X-Forwarded-Port`
//!
//! # Design Decisions
//! - Parsing never fails loudly: malformed input yields `None`
//! - IPv6 literals may be bracketed; brackets are stripped
//! - RFC 7239 `unknown` and obfuscated (`_foo`) nodes are not addresses

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use serde::{Serialize, Serializer};

/// Host part of a client address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    /// IPv4 or IPv6 literal.
    Ip(IpAddr),
    /// Hostname as written by the proxy (never resolved).
    Name(String),
}

impl Host {
    /// Parse an unbracketed host token.
    fn parse(token: &str) -> Option<Self> {
        if token.is_empty() {
            return None;
        }
        if let Ok(ip) = token.parse::<IpAddr>() {
            return Some(Host::Ip(ip));
        }
        if is_hostname(token) {
            return Some(Host::Name(token.to_string()));
        }
        None
    }

    /// Returns the IP literal, if this host is one.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Host::Ip(ip) => Some(*ip),
            Host::Name(_) => None,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(ip) => write!(f, "{}", ip),
            Host::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        Host::Ip(ip)
    }
}

fn is_hostname(token: &str) -> bool {
    !token.starts_with('_')
        && !token.eq_ignore_ascii_case("unknown")
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_')
}

/// A host and port pair.
///
/// Used both for the physical connection peer and for the resolved client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteAddress {
    pub host: Host,
    pub port: u16,
}

impl RemoteAddress {
    pub fn new(host: Host, port: u16) -> Self {
        Self { host, port }
    }

    /// Convert to a socket address when the host is an IP literal.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.host.ip().map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl From<SocketAddr> for RemoteAddress {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: Host::Ip(addr.ip()),
            port: addr.port(),
        }
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Ip(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            host => write!(f, "{}:{}", host, self.port),
        }
    }
}

impl Serialize for RemoteAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parsed forwarding node whose port may still be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    pub host: Host,
    pub port: Option<u16>,
}

impl NodeAddress {
    /// Fill in the port, preferring this node's own.
    pub fn with_fallback_port(self, fallback: u16) -> RemoteAddress {
        RemoteAddress {
            host: self.host,
            port: self.port.unwrap_or(fallback),
        }
    }
}

/// Parse a port token. Anything but a decimal `u16` is absent.
pub fn parse_port(token: &str) -> Option<u16> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Parse a `host[:port]` node.
///
/// Accepts `1.2.3.4`, `1.2.3.4:80`, `example.com:80`, `[::1]`, `[::1]:80`
/// and bare IPv6 literals. A malformed port drops only the port; a malformed
/// host drops the whole node.
pub fn parse_node(token: &str) -> Option<NodeAddress> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(rest) = token.strip_prefix('[') {
        let close = rest.find(']')?;
        let ip: Ipv6Addr = rest[..close].parse().ok()?;
        let tail = &rest[close + 1..];
        let port = if tail.is_empty() {
            None
        } else {
            parse_port(tail.strip_prefix(':')?)
        };
        return Some(NodeAddress {
            host: Host::Ip(IpAddr::V6(ip)),
            port,
        });
    }

    if token.contains(']') {
        return None;
    }

    if let Ok(ip) = token.parse::<IpAddr>() {
        return Some(NodeAddress {
            host: Host::Ip(ip),
            port: None,
        });
    }

    match token.split_once(':') {
        // More than one colon without brackets and not a valid IPv6 literal.
        Some((_, port)) if port.contains(':') => None,
        Some((host, port)) => Some(NodeAddress {
            host: Host::parse(host.trim())?,
            port: parse_port(port),
        }),
        None => Some(NodeAddress {
            host: Host::parse(token)?,
            port: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> Host {
        Host::Ip(IpAddr::V4(Ipv4Addr::new(a, b, c, d)))
    }

    #[test]
    fn parses_ipv4_with_and_without_port() {
        assert_eq!(
            parse_node("203.0.113.5"),
            Some(NodeAddress { host: v4(203, 0, 113, 5), port: None })
        );
        assert_eq!(
            parse_node(" 203.0.113.5:4711 "),
            Some(NodeAddress { host: v4(203, 0, 113, 5), port: Some(4711) })
        );
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let ip: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(
            parse_node("[2001:db8::1]"),
            Some(NodeAddress { host: Host::Ip(ip), port: None })
        );
        assert_eq!(
            parse_node("[2001:db8::1]:8443"),
            Some(NodeAddress { host: Host::Ip(ip), port: Some(8443) })
        );
    }

    #[test]
    fn parses_bare_ipv6_without_mistaking_colons_for_port() {
        let node = parse_node("2001:db8:85a3::8a2e:370:7348").unwrap();
        assert_eq!(node.host, Host::Ip("2001:db8:85a3::8a2e:370:7348".parse().unwrap()));
        assert_eq!(node.port, None);
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        assert_eq!(parse_node("[2001:db8::1"), None);
        assert_eq!(parse_node("2001:db8::1]"), None);
        assert_eq!(parse_node("[2001:db8::1]8080"), None);
        assert_eq!(parse_node("[1.2.3.4]"), None);
    }

    #[test]
    fn bad_port_keeps_host() {
        assert_eq!(
            parse_node("10.0.0.1:http"),
            Some(NodeAddress { host: v4(10, 0, 0, 1), port: None })
        );
        assert_eq!(
            parse_node("[::1]:99999").map(|n| n.port),
            Some(None)
        );
    }

    #[test]
    fn hostnames_are_accepted() {
        assert_eq!(
            parse_node("client.example.com:8080"),
            Some(NodeAddress {
                host: Host::Name("client.example.com".into()),
                port: Some(8080),
            })
        );
    }

    #[test]
    fn unknown_and_obfuscated_nodes_are_absent() {
        assert_eq!(parse_node("unknown"), None);
        assert_eq!(parse_node("UNKNOWN:80"), None);
        assert_eq!(parse_node("_hidden"), None);
        assert_eq!(parse_node("_hidden:_port"), None);
        assert_eq!(parse_node("   "), None);
        assert_eq!(parse_node("not a host"), None);
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port("8443"), Some(8443));
        assert_eq!(parse_port(" 0 "), Some(0));
        assert_eq!(parse_port("65535"), Some(65535));
        assert_eq!(parse_port("65536"), None);
        assert_eq!(parse_port("-1"), None);
        assert_eq!(parse_port("+80"), None);
        assert_eq!(parse_port("abc"), None);
        assert_eq!(parse_port(""), None);
    }

    #[test]
    fn display_brackets_ipv6() {
        let addr = RemoteAddress::from("[::1]:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(addr.to_string(), "[::1]:8080");
        let addr = RemoteAddress::new(Host::Name("proxy.local".into()), 80);
        assert_eq!(addr.to_string(), "proxy.local:80");
        assert_eq!(addr.to_socket_addr(), None);
    }
}
