//! Jetstream CLI
//!
//! Connects to the firehose and relays events to standard output, one JSON
//! line per event. Logs go to stderr so stdout stays a clean data channel.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jetstream::cli::Cli;
use jetstream::dictionary::{CachedRemoteDictionary, DictionaryProvider, FrameDecoder};
use jetstream::resolver::HandleResolver;
use jetstream::stream::{pump, EventStream, WsTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "jetstream=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let session = cli.session();

    // Resolve handle filters and form the subscription URL.
    let resolver = HandleResolver::new().context("initializing handle resolver")?;
    let url = session
        .subscription_url(&resolver)
        .await
        .context("resolving subscription filters")?;

    // Build the frame decoder if compression is enabled.
    let decoder = if session.compress {
        let dictionary = CachedRemoteDictionary::new()?
            .dictionary()
            .await
            .context("provisioning zstd dictionary")?;
        Some(FrameDecoder::new(&dictionary))
    } else {
        None
    };

    tracing::info!(url = %url, "connecting");
    let transport = WsTransport::connect(&url)
        .await
        .context("connecting to jetstream")?;

    let mut stream = EventStream::new(transport, decoder);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let relayed = pump(&mut stream, &mut out)
        .await
        .context("streaming events")?;
    tracing::info!(relayed, "stream closed");

    Ok(())
}
