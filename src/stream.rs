//! WebSocket stream pump
//!
//! Owns the connection lifetime: `Connecting -> Streaming -> Closed`, with
//! no reconnect and no backoff. [`EventStream`] turns the raw frame
//! transport into a lazy, unbounded, non-restartable sequence of decoded
//! text lines; [`pump`] relays those lines to an output, one line per frame,
//! in receive order, until the peer closes the connection.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::io::Write;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::dictionary::{DecodeError, FrameDecoder};

/// One discrete message received over the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Plain UTF-8 text (uncompressed mode)
    Text(String),
    /// A self-contained dictionary-compressed unit (compressed mode)
    Binary(Vec<u8>),
}

/// Errors that can occur while streaming
#[derive(Debug, Error)]
pub enum StreamError {
    /// Handshake or mid-stream transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server sent a compressed frame but compression is not enabled
    #[error("received a binary frame but compression is not enabled")]
    UnexpectedBinary,

    /// A frame failed decompression or UTF-8 decoding
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Writing to the output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to receive frames from a subscription connection.
///
/// `Ok(None)` means the peer closed the stream; errors are fatal to the run.
#[async_trait]
pub trait Transport: Send {
    async fn next_frame(&mut self) -> Result<Option<Frame>, StreamError>;
}

/// Transport backed by a live WebSocket connection.
pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    /// Open a connection to a fully constructed subscription URL.
    pub async fn connect(url: &str) -> Result<Self, StreamError> {
        let (inner, response) = connect_async(url).await?;
        tracing::debug!(status = %response.status(), "WebSocket handshake complete");

        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn next_frame(&mut self) -> Result<Option<Frame>, StreamError> {
        while let Some(message) = self.inner.next().await {
            match message? {
                Message::Text(text) => return Ok(Some(Frame::Text(text))),
                Message::Binary(bytes) => return Ok(Some(Frame::Binary(bytes))),
                Message::Close(frame) => {
                    tracing::info!(?frame, "server closed the connection");
                    return Ok(None);
                }
                // Control frames; tungstenite answers pings itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }

        Ok(None)
    }
}

/// Lazy, unbounded sequence of decoded event lines.
///
/// Text frames pass through unchanged; binary frames are decompressed with
/// the session's [`FrameDecoder`]. The sequence ends only when the
/// underlying connection closes or errors.
pub struct EventStream<T> {
    transport: T,
    decoder: Option<FrameDecoder>,
}

impl<T: Transport> EventStream<T> {
    pub fn new(transport: T, decoder: Option<FrameDecoder>) -> Self {
        Self { transport, decoder }
    }

    /// Receive the next event line, or `None` when the stream ends.
    pub async fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        match self.transport.next_frame().await? {
            None => Ok(None),
            Some(Frame::Text(text)) => Ok(Some(text)),
            Some(Frame::Binary(bytes)) => match &self.decoder {
                Some(decoder) => Ok(Some(decoder.decode(&bytes)?)),
                None => Err(StreamError::UnexpectedBinary),
            },
        }
    }
}

/// Relay every event line to `out`, one line per frame, in receive order.
///
/// Returns the number of lines relayed once the stream ends. There is no
/// batching and no receive timeout; long idle stretches are normal for a
/// start-from-now subscription.
pub async fn pump<T: Transport, W: Write>(
    stream: &mut EventStream<T>,
    out: &mut W,
) -> Result<u64, StreamError> {
    let mut relayed = 0u64;

    while let Some(line) = stream.next_line().await? {
        writeln!(out, "{line}")?;
        relayed += 1;
    }

    Ok(relayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct StubTransport {
        frames: VecDeque<Frame>,
    }

    impl StubTransport {
        fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
            Self {
                frames: frames.into_iter().collect(),
            }
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn next_frame(&mut self) -> Result<Option<Frame>, StreamError> {
            Ok(self.frames.pop_front())
        }
    }

    #[tokio::test]
    async fn test_pump_relays_text_frames_in_order() {
        let transport = StubTransport::new([
            Frame::Text(r#"{"seq":1}"#.to_string()),
            Frame::Text(r#"{"seq":2}"#.to_string()),
        ]);
        let mut stream = EventStream::new(transport, None);
        let mut out = Vec::new();

        let relayed = pump(&mut stream, &mut out).await.unwrap();

        assert_eq!(relayed, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"seq\":1}\n{\"seq\":2}\n"
        );
    }

    #[tokio::test]
    async fn test_binary_frame_without_decoder_is_fatal() {
        let transport = StubTransport::new([Frame::Binary(vec![1, 2, 3])]);
        let mut stream = EventStream::new(transport, None);

        assert!(matches!(
            stream.next_line().await,
            Err(StreamError::UnexpectedBinary)
        ));
    }

    #[tokio::test]
    async fn test_binary_frames_are_decoded_with_the_dictionary() {
        let dict = br#"{"did":"did:plc:","#;
        let payload = r#"{"did":"did:plc:alice"}"#;
        let frame = zstd::bulk::Compressor::with_dictionary(3, dict)
            .unwrap()
            .compress(payload.as_bytes())
            .unwrap();

        let transport = StubTransport::new([Frame::Binary(frame)]);
        let mut stream = EventStream::new(transport, Some(FrameDecoder::new(dict)));
        let mut out = Vec::new();

        let relayed = pump(&mut stream, &mut out).await.unwrap();

        assert_eq!(relayed, 1);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{payload}\n"));
    }

    #[tokio::test]
    async fn test_empty_stream_relays_nothing() {
        let transport = StubTransport::new([]);
        let mut stream = EventStream::new(transport, None);
        let mut out = Vec::new();

        assert_eq!(pump(&mut stream, &mut out).await.unwrap(), 0);
        assert!(out.is_empty());
    }
}
