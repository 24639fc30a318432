//! Subscription session
//!
//! Ties the user-supplied filters to the resolver and URL builder. Handle
//! resolution happens here, before any connection attempt, so an
//! unresolvable handle fails the run without ever opening a stream.

use crate::endpoint;
use crate::resolver::{ResolveError, ResolveHandle};

/// The filters and options of one subscription run.
#[derive(Debug, Clone)]
pub struct Session {
    /// Base URL of the subscription endpoint (scheme + host + path)
    pub base_url: String,
    /// Collection NSIDs to subscribe to; empty means all
    pub collections: Vec<String>,
    /// DIDs to subscribe to; empty means all
    pub dids: Vec<String>,
    /// Handles to resolve into additional DIDs
    pub handles: Vec<String>,
    /// Cursor to start from; zero means "start now" and is never serialized
    pub cursor: u64,
    /// Whether to request dictionary-compressed frames
    pub compress: bool,
}

impl Session {
    /// Resolve handle filters and build the fully query-encoded URL.
    ///
    /// Resolved DIDs are appended after the explicit ones, in input order.
    pub async fn subscription_url<R>(&self, resolver: &R) -> Result<String, ResolveError>
    where
        R: ResolveHandle + Sync,
    {
        let mut dids = self.dids.clone();
        for handle in &self.handles {
            let did = resolver.require_resolve(handle).await?;
            tracing::info!(handle = %handle, did = %did, "resolved handle");
            dids.push(did);
        }

        Ok(endpoint::query_url(
            &self.base_url,
            &self.collections,
            &dids,
            self.cursor,
            self.compress,
        ))
    }
}
