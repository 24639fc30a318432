//! ATProto handle resolution
//!
//! Resolves a human-readable handle (e.g. `@alice.test`) to its stable DID.
//! Two strategies are tried in order, short-circuiting on the first hit:
//!
//! 1. DNS: a TXT record at `_atproto.<handle>` whose text carries a
//!    `did=` marker.
//! 2. Well-known: an HTTPS GET of `https://<handle>/.well-known/atproto-did`.
//!
//! "Not found" is an expected outcome and is kept distinct from transport
//! failures: a missing record or a non-2xx well-known response yields
//! `Ok(None)`, while anything else on the network path propagates as an
//! error. Resolution always happens before the stream opens, so an
//! unresolvable handle fails the run up front.

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError as DnsError, ResolveErrorKind};
use hickory_resolver::proto::rr::rdata::TXT;
use hickory_resolver::TokioAsyncResolver;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Marker prefix of the `_atproto` TXT record payload.
const DID_MARKER: &str = "did=";

/// Timeout for the well-known HTTPS fallback.
const WELL_KNOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while resolving a handle
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Both strategies were exhausted without finding a DID
    #[error("could not resolve handle '{handle}' to a DID")]
    HandleNotFound { handle: String },

    /// DNS lookup failed for a reason other than "no such record"
    #[error("DNS lookup failed: {0}")]
    Dns(#[from] DnsError),

    /// Well-known request failed for a reason other than "not found"
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Strip one leading `@` from a handle, if present. Idempotent.
pub fn raw_handle(handle: &str) -> &str {
    handle.strip_prefix('@').unwrap_or(handle)
}

/// Capability to resolve handles to DIDs.
///
/// The production implementation is [`HandleResolver`]; tests substitute a
/// stub so the subscription pipeline can run without the network.
#[async_trait]
pub trait ResolveHandle {
    /// Resolve a handle to a DID, returning `None` when no strategy finds one.
    async fn resolve(&self, handle: &str) -> Result<Option<String>, ResolveError>;

    /// Resolve a handle to a DID, failing when no strategy finds one.
    ///
    /// The error names the handle exactly as the caller supplied it,
    /// including any `@` prefix.
    async fn require_resolve(&self, handle: &str) -> Result<String, ResolveError> {
        match self.resolve(handle).await? {
            Some(did) => Ok(did),
            None => Err(ResolveError::HandleNotFound {
                handle: handle.to_string(),
            }),
        }
    }
}

/// DNS + well-known handle resolver
pub struct HandleResolver {
    dns: TokioAsyncResolver,
    http: Client,
}

impl HandleResolver {
    /// Create a resolver using the system DNS configuration.
    pub fn new() -> Result<Self, ResolveError> {
        let dns = TokioAsyncResolver::tokio_from_system_conf()?;
        let http = Client::builder()
            .timeout(WELL_KNOWN_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self { dns, http })
    }

    /// Resolve via the `_atproto.<handle>` TXT record.
    ///
    /// NXDOMAIN and empty answer sets are "not found", not errors.
    async fn resolve_dns(&self, handle: &str) -> Result<Option<String>, ResolveError> {
        let name = format!("_atproto.{handle}");
        let lookup = match self.dns.txt_lookup(name).await {
            Ok(lookup) => lookup,
            Err(err) => {
                return match err.kind() {
                    ResolveErrorKind::NoRecordsFound { .. } => Ok(None),
                    _ => Err(err.into()),
                }
            }
        };

        Ok(lookup.iter().find_map(did_from_txt))
    }

    /// Resolve via `https://<handle>/.well-known/atproto-did`.
    ///
    /// Connection failures, timeouts, and non-2xx statuses are "not found";
    /// the 2xx body, trimmed of whitespace, is the DID.
    async fn resolve_well_known(&self, handle: &str) -> Result<Option<String>, ResolveError> {
        let url = format!("https://{handle}/.well-known/atproto-did");
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if !response.status().is_success() {
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(Some(did_from_body(&body)))
    }
}

#[async_trait]
impl ResolveHandle for HandleResolver {
    async fn resolve(&self, handle: &str) -> Result<Option<String>, ResolveError> {
        let handle = raw_handle(handle);

        if let Some(did) = self.resolve_dns(handle).await? {
            tracing::debug!(handle, did = %did, "resolved via DNS");
            return Ok(Some(did));
        }

        let maybe_did = self.resolve_well_known(handle).await?;
        if let Some(did) = &maybe_did {
            tracing::debug!(handle, did = %did, "resolved via well-known");
        }
        Ok(maybe_did)
    }
}

/// The well-known response body is the DID, trimmed of surrounding whitespace.
fn did_from_body(body: &str) -> String {
    body.trim().to_string()
}

/// Extract a DID from one TXT record, joining its character-string segments.
fn did_from_txt(record: &TXT) -> Option<String> {
    let text: String = record
        .txt_data()
        .iter()
        .map(|segment| String::from_utf8_lossy(segment))
        .collect();
    text.strip_prefix(DID_MARKER).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_handle_strips_at_prefix() {
        assert_eq!(raw_handle("@foo.com"), "foo.com");
        assert_eq!(raw_handle("bar.com"), "bar.com");
    }

    #[test]
    fn test_raw_handle_is_idempotent() {
        assert_eq!(raw_handle(raw_handle("@foo.com")), "foo.com");
        assert_eq!(raw_handle(raw_handle("foo.com")), "foo.com");
    }

    #[test]
    fn test_did_from_txt() {
        let record = TXT::new(vec!["did=did:plc:12345".to_string()]);
        assert_eq!(did_from_txt(&record), Some("did:plc:12345".to_string()));
    }

    #[test]
    fn test_did_from_txt_ignores_unrelated_records() {
        let record = TXT::new(vec!["v=spf1 include:example.test ~all".to_string()]);
        assert_eq!(did_from_txt(&record), None);
    }

    #[test]
    fn test_did_from_txt_joins_segments() {
        let record = TXT::new(vec!["did=did:plc:".to_string(), "12345".to_string()]);
        assert_eq!(did_from_txt(&record), Some("did:plc:12345".to_string()));
    }

    #[test]
    fn test_did_from_body_trims_whitespace() {
        assert_eq!(did_from_body("  did:plc:67890  \n"), "did:plc:67890");
        assert_eq!(did_from_body("did:plc:67890"), "did:plc:67890");
    }

    struct StubResolver {
        did: Option<String>,
    }

    #[async_trait]
    impl ResolveHandle for StubResolver {
        async fn resolve(&self, _handle: &str) -> Result<Option<String>, ResolveError> {
            Ok(self.did.clone())
        }
    }

    #[tokio::test]
    async fn test_require_resolve_returns_did() {
        let resolver = StubResolver {
            did: Some("did:plc:alice".to_string()),
        };
        let did = resolver.require_resolve("@alice.test").await.unwrap();
        assert_eq!(did, "did:plc:alice");
    }

    #[tokio::test]
    async fn test_require_resolve_names_the_original_handle() {
        let resolver = StubResolver { did: None };
        let err = resolver.require_resolve("@missing.test").await.unwrap_err();
        match err {
            ResolveError::HandleNotFound { handle } => assert_eq!(handle, "@missing.test"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
