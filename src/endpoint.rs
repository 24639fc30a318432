//! Jetstream endpoint URLs
//!
//! Builds the WebSocket subscription URL: the public multi-region base URL
//! and the query string carrying the subscription filters.

use std::borrow::Cow;
use std::fmt;

/// Geography of a public Jetstream instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Geo {
    UsWest,
    UsEast,
}

impl fmt::Display for Geo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geo::UsWest => write!(f, "us-west"),
            Geo::UsEast => write!(f, "us-east"),
        }
    }
}

/// Return the public Jetstream URL for the given geography and instance.
pub fn public_base_url(geo: Geo, instance: u32) -> String {
    format!("wss://jetstream{instance}.{geo}.bsky.network/subscribe")
}

/// Return a subscription URL with the given query parameters.
///
/// Parameter order is part of the wire contract: one `wantedCollections`
/// pair per collection in input order, then one `wantedDids` pair per DID,
/// then `cursor` (omitted when zero), then `compress=true` (omitted when
/// disabled). Repeated values are kept as-is; the server treats repeated
/// parameters additively. With no parameters the base URL is returned
/// unchanged, without a trailing `?`.
pub fn query_url(
    base_url: &str,
    collections: &[String],
    dids: &[String],
    cursor: u64,
    compress: bool,
) -> String {
    let mut query = String::new();
    let mut push = |key: &str, value: &str| {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(key);
        query.push('=');
        query.push_str(&encode_value(value));
    };

    for collection in collections {
        push("wantedCollections", collection);
    }
    for did in dids {
        push("wantedDids", did);
    }
    if cursor != 0 {
        push("cursor", &cursor.to_string());
    }
    if compress {
        push("compress", "true");
    }

    if query.is_empty() {
        base_url.to_string()
    } else {
        format!("{base_url}?{query}")
    }
}

/// Percent-encode a query value, leaving characters that are legal in a
/// query string untouched. DIDs (`did:plc:...`) and collection NSIDs must
/// survive verbatim, so `:` is not escaped.
fn encode_value(value: &str) -> Cow<'_, str> {
    if value.bytes().all(is_query_safe) {
        return Cow::Borrowed(value);
    }

    let mut encoded = String::with_capacity(value.len() + 8);
    let mut buf = [0u8; 4];
    for ch in value.chars() {
        if ch.is_ascii() && is_query_safe(ch as u8) {
            encoded.push(ch);
        } else {
            encoded.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    Cow::Owned(encoded)
}

fn is_query_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b':' | b'@' | b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "wss://example.test/subscribe";

    #[test]
    fn test_public_base_url() {
        assert_eq!(
            public_base_url(Geo::UsWest, 2),
            "wss://jetstream2.us-west.bsky.network/subscribe"
        );
        assert_eq!(
            public_base_url(Geo::UsEast, 1),
            "wss://jetstream1.us-east.bsky.network/subscribe"
        );
    }

    #[test]
    fn test_geo_display() {
        assert_eq!(Geo::UsWest.to_string(), "us-west");
        assert_eq!(Geo::UsEast.to_string(), "us-east");
    }

    #[test]
    fn test_query_url_all_params() {
        let url = query_url(
            BASE,
            &["col1".to_string()],
            &["did1".to_string()],
            123,
            true,
        );
        assert_eq!(
            url,
            "wss://example.test/subscribe?wantedCollections=col1&wantedDids=did1&cursor=123&compress=true"
        );
    }

    #[test]
    fn test_query_url_omits_zero_cursor_and_disabled_compress() {
        let url = query_url(BASE, &["col1".to_string()], &[], 0, false);
        assert_eq!(url, "wss://example.test/subscribe?wantedCollections=col1");
        assert!(!url.contains("cursor="));
        assert!(!url.contains("compress="));
    }

    #[test]
    fn test_query_url_no_params_is_base_verbatim() {
        assert_eq!(query_url(BASE, &[], &[], 0, false), BASE);
    }

    #[test]
    fn test_query_url_preserves_dids_verbatim() {
        let url = query_url(BASE, &[], &["did:plc:alice".to_string()], 0, false);
        assert_eq!(
            url,
            "wss://example.test/subscribe?wantedDids=did:plc:alice"
        );
    }

    #[test]
    fn test_query_url_keeps_input_order_without_dedup() {
        let url = query_url(
            BASE,
            &["b".to_string(), "a".to_string(), "b".to_string()],
            &[],
            0,
            false,
        );
        assert_eq!(
            url,
            "wss://example.test/subscribe?wantedCollections=b&wantedCollections=a&wantedCollections=b"
        );
    }

    #[test]
    fn test_query_url_escapes_reserved_characters() {
        let url = query_url(BASE, &["a b&c=d".to_string()], &[], 0, false);
        assert_eq!(
            url,
            "wss://example.test/subscribe?wantedCollections=a%20b%26c%3Dd"
        );
    }
}
