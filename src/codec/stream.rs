//! The uniform decompression stream every stage reads through.
//!
//! [`CompressionInput`] is a single concrete wrapper over a raw byte stream
//! and a chosen [`CodecProvider`]; codec variants are values behind the
//! provider trait, not subclasses. The codec transform is applied lazily on
//! the first read, so malformed compressed data surfaces as an error at the
//! first `read` that touches the corrupt bytes rather than at construction.

use super::CodecProvider;
use std::io::Read;
use std::sync::Arc;

/// Handle for one logical sub-stream inside an archive codec's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name, when the archive format records one.
    pub name: Option<String>,
    /// Zero-based position of the entry within the archive.
    pub index: usize,
}

enum StreamState {
    /// Raw stream accepted, codec transform not applied yet.
    Raw(Box<dyn Read + Send>),
    /// Codec transform applied, stream readable.
    Wrapped(Box<dyn Read + Send>),
    /// Closed; reads fail with a defined error.
    Closed,
}

/// A raw input stream plus a codec, exposed as one logical decompressed
/// stream.
///
/// For the `none` codec every `read` is pure delegation to the underlying
/// raw stream, preserving its exact byte-count and buffer semantics.
pub struct CompressionInput {
    state: StreamState,
    provider: Arc<dyn CodecProvider>,
}

impl CompressionInput {
    /// Wrap `raw` with `provider`'s decompression transform.
    ///
    /// The transform is deferred until the first read; construction never
    /// touches the stream.
    pub fn new(raw: Box<dyn Read + Send>, provider: Arc<dyn CodecProvider>) -> Self {
        Self {
            state: StreamState::Raw(raw),
            provider,
        }
    }

    /// Advance to the next logical sub-stream.
    ///
    /// Codecs without multi-entry support expose their whole stream as one
    /// implicit entry and return `None` here on every call. That terminal
    /// state is idempotent, never an error.
    pub fn next_entry(&mut self) -> std::io::Result<Option<Entry>> {
        // No built-in codec is an archive format; providers reporting
        // `supports_entries` would drive entry iteration through their
        // wrapped reader.
        if !self.provider.supports_entries() {
            return Ok(None);
        }
        Ok(None)
    }

    /// Release the underlying raw stream and any codec-internal buffers.
    ///
    /// Idempotent: a second close is a no-op. Subsequent reads fail with an
    /// `io::Error` rather than undefined behavior.
    pub fn close(&mut self) {
        self.state = StreamState::Closed;
    }

    /// The codec this stream was built with.
    pub fn provider(&self) -> &Arc<dyn CodecProvider> {
        &self.provider
    }

    /// Registry name of the codec this stream was built with.
    pub fn codec_name(&self) -> String {
        self.provider.name().to_string()
    }

    fn wrapped(&mut self) -> std::io::Result<&mut Box<dyn Read + Send>> {
        if let StreamState::Raw(_) = self.state {
            let StreamState::Raw(raw) = std::mem::replace(&mut self.state, StreamState::Closed)
            else {
                unreachable!()
            };
            self.state = StreamState::Wrapped(self.provider.wrap_reader(raw)?);
        }
        match &mut self.state {
            StreamState::Wrapped(inner) => Ok(inner),
            StreamState::Closed => Err(std::io::Error::other(
                "read on closed compression input stream",
            )),
            StreamState::Raw(_) => unreachable!(),
        }
    }
}

impl Read for CompressionInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.wrapped()?.read(buf)
    }
}
