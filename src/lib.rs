//! # Jetstream
//!
//! Command-line client for the Bluesky Jetstream firehose: subscribe to the
//! public event stream, optionally filtered by collection or account, and
//! print each event as one JSON line on standard output.
//!
//! ## Pipeline
//!
//! 1. Resolve any handle filters to DIDs ([`resolver`]) - before the stream
//!    opens, so an unresolvable handle fails the run up front.
//! 2. Build the subscription URL deterministically ([`endpoint`]).
//! 3. Provision a shared-dictionary zstd decoder if compression is
//!    requested ([`dictionary`]).
//! 4. Connect and relay frames until the server closes ([`stream`]).
//!
//! The client is a single-shot relay: no reconnect, no backoff, no retries.
//! Every failure either classifies as an expected "not found" during handle
//! resolution or is fatal and surfaces immediately.
//!
//! ## Modules
//!
//! - [`cli`]: Command-line argument surface
//! - [`endpoint`]: Subscription URL construction
//! - [`resolver`]: Handle-to-DID resolution (DNS TXT, then well-known)
//! - [`dictionary`]: Compression dictionary cache and frame decoding
//! - [`stream`]: WebSocket connection and the receive loop
//! - [`session`]: Orchestration of filters, resolution, and URL building
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jetstream::{EventStream, Geo, HandleResolver, Session, WsTransport};
//! use jetstream::stream::pump;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session {
//!         base_url: jetstream::public_base_url(Geo::UsWest, 1),
//!         collections: vec!["app.bsky.feed.post".to_string()],
//!         dids: vec![],
//!         handles: vec!["@alice.test".to_string()],
//!         cursor: 0,
//!         compress: false,
//!     };
//!
//!     let resolver = HandleResolver::new()?;
//!     let url = session.subscription_url(&resolver).await?;
//!
//!     let transport = WsTransport::connect(&url).await?;
//!     let mut stream = EventStream::new(transport, None);
//!     let mut stdout = std::io::stdout().lock();
//!     pump(&mut stream, &mut stdout).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod dictionary;
pub mod endpoint;
pub mod resolver;
pub mod session;
pub mod stream;

// Re-export top-level types for convenience
pub use cli::Cli;

pub use dictionary::{
    CachedRemoteDictionary, DecodeError, DictionaryError, DictionaryProvider, FrameDecoder,
};

pub use endpoint::{public_base_url, query_url, Geo};

pub use resolver::{raw_handle, HandleResolver, ResolveError, ResolveHandle};

pub use session::Session;

pub use stream::{pump, EventStream, Frame, StreamError, Transport, WsTransport};
