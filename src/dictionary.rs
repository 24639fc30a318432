//! Zstandard dictionary provisioning and frame decoding
//!
//! Jetstream compresses each event with a shared zstd dictionary so that
//! small, similar messages compress well independently of each other. The
//! dictionary is fetched once from the upstream repository and cached in a
//! per-platform cache directory; every run after that reads the cached copy.
//!
//! Each incoming frame is a standalone compressed unit: [`FrameDecoder`]
//! decodes one frame per call with no window state carried between frames.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use zstd::dict::DecoderDictionary;

/// Where the shared dictionary lives upstream.
const DICTIONARY_URL: &str =
    "https://raw.githubusercontent.com/bluesky-social/jetstream/main/pkg/models/zstd_dictionary";

/// Cached dictionary filename inside the cache directory.
const DICTIONARY_FILENAME: &str = "zstd_dict.bin";

/// Application namespace under the platform cache directory.
const CACHE_NAMESPACE: &str = "jetstream";

/// Errors that can occur while provisioning the dictionary
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The platform exposes no cache directory
    #[error("no cache directory available on this platform")]
    NoCacheDir,

    /// The one-time download failed
    #[error("dictionary download failed: {0}")]
    Download(#[from] reqwest::Error),

    /// Reading or writing the cached file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while decoding a compressed frame
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not a valid zstd unit for the shared dictionary
    #[error("zstd decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    /// The decompressed bytes are not UTF-8 text
    #[error("decompressed frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Capability to produce the shared compression dictionary.
///
/// The production implementation is [`CachedRemoteDictionary`]; tests point
/// it at a temp directory or substitute their own provider entirely.
#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    /// Return the dictionary bytes, fetching and caching them if needed.
    async fn dictionary(&self) -> Result<Vec<u8>, DictionaryError>;
}

/// Dictionary provider backed by the platform cache directory, filled from
/// the upstream repository on first use.
pub struct CachedRemoteDictionary {
    cache_dir: PathBuf,
    url: String,
}

impl CachedRemoteDictionary {
    /// Create a provider rooted at the default platform cache directory
    /// (`%LOCALAPPDATA%` on Windows, `$XDG_CACHE_HOME` or `~/.cache`
    /// elsewhere), namespaced under `jetstream`.
    pub fn new() -> Result<Self, DictionaryError> {
        let base = dirs::cache_dir().ok_or(DictionaryError::NoCacheDir)?;
        Ok(Self::with_cache_dir(base.join(CACHE_NAMESPACE)))
    }

    /// Create a provider rooted at an explicit cache directory.
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            url: DICTIONARY_URL.to_string(),
        }
    }

    /// Stream the dictionary from upstream into the cache file verbatim.
    async fn download(&self, path: &Path) -> Result<(), DictionaryError> {
        tracing::info!(url = %self.url, "downloading zstd dictionary");

        let response = reqwest::get(&self.url).await?.error_for_status()?;
        let mut body = response.bytes_stream();

        let mut file = tokio::fs::File::create(path).await?;
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl DictionaryProvider for CachedRemoteDictionary {
    async fn dictionary(&self) -> Result<Vec<u8>, DictionaryError> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let path = self.cache_dir.join(DICTIONARY_FILENAME);
        if path.exists() {
            tracing::debug!(path = %path.display(), "using cached zstd dictionary");
        } else {
            self.download(&path).await?;
        }

        Ok(tokio::fs::read(&path).await?)
    }
}

/// Decoder for dictionary-compressed frames.
///
/// Holds a prepared decoder dictionary; each [`decode`](Self::decode) call
/// decompresses one self-contained frame and decodes it as UTF-8.
pub struct FrameDecoder {
    dictionary: DecoderDictionary<'static>,
}

impl FrameDecoder {
    /// Prime a decoder with the shared dictionary bytes.
    pub fn new(dictionary: &[u8]) -> Self {
        Self {
            dictionary: DecoderDictionary::copy(dictionary),
        }
    }

    /// Decompress one frame fully and decode the result as UTF-8 text.
    pub fn decode(&self, frame: &[u8]) -> Result<String, DecodeError> {
        let mut decoder =
            zstd::stream::read::Decoder::with_prepared_dictionary(frame, &self.dictionary)?;
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;

        Ok(String::from_utf8(decoded)?)
    }
}
