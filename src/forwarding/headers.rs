//! Read-only access to request headers.
//!
//! The resolver only needs "is this header there" and "give me every value
//! of it", with case-insensitive names. Anything that can answer those two
//! questions can be resolved against.

use axum::http::HeaderMap;

/// RFC 7239 `Forwarded`.
pub const FORWARDED: &str = "forwarded";
/// De-facto client address list.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// De-facto client port list.
pub const X_FORWARDED_PORT: &str = "x-forwarded-port";
/// De-facto client scheme list.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Case-insensitive, read-only header multi-map.
pub trait HeaderView {
    /// All values for `name`, in the order they were received.
    fn values_of(&self, name: &str) -> Vec<&str>;

    /// True when no headers are present at all.
    fn is_empty(&self) -> bool;

    fn contains(&self, name: &str) -> bool {
        !self.values_of(name).is_empty()
    }
}

impl HeaderView for HeaderMap {
    fn values_of(&self, name: &str) -> Vec<&str> {
        // Values that are not visible ASCII read as empty, keeping their position.
        self.get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap_or_default())
            .collect()
    }

    fn is_empty(&self) -> bool {
        HeaderMap::is_empty(self)
    }

    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<K, V> HeaderView for [(K, V)]
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn values_of(&self, name: &str) -> Vec<&str> {
        self.iter()
            .filter(|(k, _)| k.as_ref().trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
            .collect()
    }

    fn is_empty(&self) -> bool {
        <[(K, V)]>::is_empty(self)
    }
}

impl<K, V> HeaderView for Vec<(K, V)>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn values_of(&self, name: &str) -> Vec<&str> {
        self.as_slice().values_of(name)
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

/// `None` stands for a request with no header map at all.
impl<T: HeaderView + ?Sized> HeaderView for Option<&T> {
    fn values_of(&self, name: &str) -> Vec<&str> {
        match self {
            Some(headers) => headers.values_of(name),
            None => Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.map_or(true, |headers| headers.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn header_map_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        let mixed_case = HeaderName::from_bytes(b"X-Forwarded-For").unwrap();
        headers.append(mixed_case, HeaderValue::from_static("1.1.1.1"));
        headers.append("x-forwarded-for", HeaderValue::from_static("2.2.2.2"));

        assert_eq!(headers.values_of(X_FORWARDED_FOR), vec!["1.1.1.1", "2.2.2.2"]);
        assert!(HeaderView::contains(&headers, X_FORWARDED_FOR));
        assert!(!HeaderView::contains(&headers, FORWARDED));
    }

    #[test]
    fn header_map_reads_opaque_values_as_empty() {
        let mut headers = HeaderMap::new();
        headers.append(FORWARDED, HeaderValue::from_bytes(b"for=\xff").unwrap());
        headers.append(FORWARDED, HeaderValue::from_static("for=1.2.3.4"));

        assert_eq!(headers.values_of(FORWARDED), vec!["", "for=1.2.3.4"]);
    }

    #[test]
    fn pair_slices() {
        let pairs = [("Forwarded", "for=1.2.3.4"), ("X-Forwarded-Port", "80")];
        assert_eq!(pairs[..].values_of(FORWARDED), vec!["for=1.2.3.4"]);
        assert_eq!(pairs[..].values_of(X_FORWARDED_PORT), vec!["80"]);
        assert!(pairs[..].values_of(X_FORWARDED_PROTO).is_empty());
    }

    #[test]
    fn absent_headers_are_empty() {
        let none: Option<&HeaderMap> = None;
        assert!(none.is_empty());
        assert!(none.values_of(FORWARDED).is_empty());
    }
}
