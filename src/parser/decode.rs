//! Incremental character decoding over the decompression stream.
//!
//! Raw bytes are pulled in `buffer_size` chunks and pushed through an
//! `encoding_rs` incremental decoder. The decoder retains incomplete
//! multi-byte sequences between chunks, so a UTF-16 code unit or UTF-8
//! sequence split across two physical reads is never corrupted or
//! misdetected as a delimiter.

use crate::codec::stream::CompressionInput;
use crate::error::{Error, Result};
use encoding_rs::{CoderResult, Decoder, Encoding};
use std::io::Read;

/// Chunked byte-to-text reader: `CompressionInput` plus decoder state.
pub struct TranscodingReader {
    input: CompressionInput,
    decoder: Decoder,
    raw_buf: Vec<u8>,
    codec_name: String,
    eof: bool,
}

impl TranscodingReader {
    /// Resolve `encoding` by WHATWG label (e.g. `"UTF-8"`, `"UTF-16LE"`,
    /// `"windows-1252"`) and build a reader pulling `buffer_size` raw bytes
    /// per chunk.
    ///
    /// # Errors
    /// [`Error::Configuration`] for an unknown encoding label or a zero
    /// buffer size.
    pub fn new(input: CompressionInput, encoding: &str, buffer_size: usize) -> Result<Self> {
        let encoding = Encoding::for_label(encoding.as_bytes())
            .ok_or_else(|| Error::Configuration(format!("unknown character encoding '{encoding}'")))?;
        if buffer_size == 0 {
            return Err(Error::Configuration("buffer size must be non-zero".into()));
        }
        let codec_name = input.codec_name();
        Ok(Self {
            input,
            decoder: encoding.new_decoder(),
            raw_buf: vec![0; buffer_size],
            codec_name,
            eof: false,
        })
    }

    /// Decode the next chunk of text, or `None` once the stream and the
    /// decoder's trailing state are both exhausted.
    ///
    /// # Errors
    /// [`Error::Codec`] when the underlying stream fails, carrying the
    /// codec name.
    pub fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            if self.eof {
                return Ok(None);
            }
            let n = self
                .input
                .read(&mut self.raw_buf)
                .map_err(|e| Error::codec(&self.codec_name, e))?;
            let last = n == 0;
            if last {
                self.eof = true;
            }
            let bytes = &self.raw_buf[..n];
            let mut out = String::with_capacity(
                self.decoder
                    .max_utf8_buffer_length(bytes.len())
                    .unwrap_or(bytes.len() * 3 + 16),
            );
            let (result, _read, had_errors) = self.decoder.decode_to_string(bytes, &mut out, last);
            debug_assert!(matches!(result, CoderResult::InputEmpty));
            if had_errors {
                tracing::warn!(
                    codec = %self.codec_name,
                    "malformed byte sequence replaced during decode"
                );
            }
            if !out.is_empty() {
                return Ok(Some(out));
            }
            // A chunk can decode to nothing (e.g. it ends inside a
            // multi-byte sequence); keep pulling until text or EOF.
        }
    }

    /// Close the underlying decompression stream.
    pub fn close(&mut self) {
        self.input.close();
    }
}
