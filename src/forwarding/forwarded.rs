//! RFC 7239 `Forwarded` header parsing.
//!
//! # Grammar
//! ```text
//! Forwarded         = 1#forwarded-element
//! forwarded-element = [ forwarded-pair ] *( ";" [ forwarded-pair ] )
//! forwarded-pair    = token "=" value
//! value             = token / quoted-string
//! ```
//!
//! # Design Decisions
//! - Elements are client-closest first, one per hop
//! - Separators inside quoted strings do not split
//! - Parameter names are case-insensitive; the first occurrence wins
//! - Malformed pairs and unknown parameters are skipped, never rejected

use crate::forwarding::address::{parse_node, NodeAddress};

/// One hop of a `Forwarded` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedElement {
    /// Client side of the hop (`for=`), if it names a usable address.
    pub forwarded_for: Option<NodeAddress>,
    /// Proxy side of the hop (`by=`), unquoted but otherwise raw.
    pub by: Option<String>,
    /// Original `Host` request header (`host=`).
    pub host: Option<String>,
    /// Scheme used on the incoming side of the hop (`proto=`), lowercased.
    pub proto: Option<String>,
}

/// Parse one `Forwarded` header value into its hops.
pub fn parse_forwarded(value: &str) -> Vec<ForwardedElement> {
    split_unquoted(value, ',')
        .into_iter()
        .filter(|element| !element.trim().is_empty())
        .map(parse_element)
        .collect()
}

/// Client address of the first hop carrying a usable `for=`, across all
/// header instances in order.
pub fn first_client<'a, I>(values: I) -> Option<NodeAddress>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(parse_forwarded)
        .find_map(|element| element.forwarded_for)
}

fn parse_element(element: &str) -> ForwardedElement {
    let mut parsed = ForwardedElement::default();
    let (mut seen_for, mut seen_by, mut seen_host, mut seen_proto) = (false, false, false, false);

    for pair in split_unquoted(element, ';') {
        let Some((name, raw)) = pair.split_once('=') else {
            continue;
        };
        let value = unquote(raw);
        match name.trim().to_ascii_lowercase().as_str() {
            "for" if !seen_for => {
                seen_for = true;
                parsed.forwarded_for = value.as_deref().and_then(parse_node);
            }
            "by" if !seen_by => {
                seen_by = true;
                parsed.by = value;
            }
            "host" if !seen_host => {
                seen_host = true;
                parsed.host = value;
            }
            "proto" if !seen_proto => {
                seen_proto = true;
                parsed.proto = value.map(|v| v.to_ascii_lowercase());
            }
            _ => {}
        }
    }

    parsed
}

/// Split on `delimiter`, ignoring delimiters inside quoted strings.
fn split_unquoted(input: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Decode a token or quoted-string value. Empty or malformed values are absent.
fn unquote(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let Some(inner) = raw.strip_prefix('"') else {
        if raw.is_empty() || raw.contains('"') {
            return None;
        }
        return Some(raw.to_string());
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => {
                // Closing quote must end the value.
                return if chars.as_str().is_empty() && !out.trim().is_empty() {
                    Some(out)
                } else {
                    None
                };
            }
            c => out.push(c),
        }
    }

    // Unterminated quoted string.
    None
}
