//! Built-in codec providers.

use super::CodecProvider;
use std::io::{Read, Write};

/// Passthrough codec for uncompressed data.
///
/// Always registered so uncompressed sources flow through the same
/// [`CompressionInput`](super::stream::CompressionInput) path as compressed
/// ones. `wrap_reader`/`wrap_writer` return the stream unchanged, preserving
/// the underlying stream's exact read/write semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneCodec;

impl CodecProvider for NoneCodec {
    fn name(&self) -> &str {
        "none"
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(reader)
    }

    fn wrap_writer(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn Write + Send>> {
        Ok(writer)
    }
}

#[cfg(feature = "compression-gzip")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CodecProvider for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
        use flate2::read::GzDecoder;
        Ok(Box::new(GzDecoder::new(reader)))
    }

    fn wrap_writer(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn Write + Send>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-zstd")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CodecProvider for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read + Send>)
    }

    fn wrap_writer(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn Write + Send>> {
        zstd::stream::write::Encoder::new(writer, 3)
            .map(|e| Box::new(e.auto_finish()) as Box<dyn Write + Send>)
    }
}

#[cfg(feature = "compression-bzip2")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CodecProvider for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
        use bzip2::read::BzDecoder;
        Ok(Box::new(BzDecoder::new(reader)))
    }

    fn wrap_writer(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn Write + Send>> {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;
        Ok(Box::new(BzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-xz")]
#[derive(Debug, Clone, Copy, Default)]
pub struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CodecProvider for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
        use xz2::read::XzDecoder;
        Ok(Box::new(XzDecoder::new(reader)))
    }

    fn wrap_writer(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn Write + Send>> {
        use xz2::write::XzEncoder;
        Ok(Box::new(XzEncoder::new(writer, 6)))
    }
}
