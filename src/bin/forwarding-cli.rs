use std::net::SocketAddr;

use clap::Parser;
use serde::Serialize;

use forwarding_resolver::forwarding::{AddressSource, ForwardingPolicy, ForwardingResolver, RemoteAddress};

#[derive(Parser)]
#[command(name = "forwarding-cli")]
#[command(about = "Resolve a client identity from forwarding headers", long_about = None)]
struct Cli {
    /// Physical peer address of the connection.
    #[arg(short, long, default_value = "127.0.0.1:80")]
    peer: SocketAddr,

    /// Treat the physical connection as TLS.
    #[arg(long)]
    tls: bool,

    /// Request header as "Name: value"; may be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Ignore the RFC 7239 Forwarded header.
    #[arg(long)]
    no_forwarded: bool,

    /// Ignore X-Forwarded-For / X-Forwarded-Port.
    #[arg(long)]
    no_x_forwarded: bool,

    /// Prefer Forwarded over X-Forwarded-For when both are present.
    #[arg(long)]
    prefer_forwarded: bool,
}

#[derive(Serialize)]
struct Resolution {
    address: RemoteAddress,
    secure: bool,
    source: AddressSource,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name must not be empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let resolver = ForwardingResolver::new(ForwardingPolicy {
        support_forwarded: !cli.no_forwarded,
        support_x_forwarded: !cli.no_x_forwarded,
        prefer_forwarded: cli.prefer_forwarded,
    })?;

    let connection = RemoteAddress::from(cli.peer);
    let (address, source) = resolver.resolve_remote_address_with_source(&cli.headers, &connection);
    let secure = resolver.resolve_scheme(&cli.headers, cli.tls);

    let resolution = Resolution {
        address,
        secure,
        source,
    };
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_value() {
        assert_eq!(
            parse_header("X-Forwarded-For: 203.0.113.5, 70.41.3.18"),
            Ok(("X-Forwarded-For".to_string(), "203.0.113.5, 70.41.3.18".to_string()))
        );
        // Only the first colon separates; the rest belongs to the value.
        assert_eq!(
            parse_header("Forwarded:for=\"[::1]:4711\""),
            Ok(("Forwarded".to_string(), "for=\"[::1]:4711\"".to_string()))
        );
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_header("X-Forwarded-For 203.0.113.5").is_err());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(parse_header("  : 203.0.113.5").is_err());
    }
}
