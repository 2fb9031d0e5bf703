//! Pluggable compression support for transparent stream ingestion.
//!
//! The system is built around two pieces:
//! - [`CodecProvider`] — a pluggable compression algorithm implementation
//! - [`CodecRegistry`] — a name-keyed lookup table of providers
//!
//! "No compression" is itself a codec ([`providers::NoneCodec`]) rather than
//! a special case, so every consumer reads through one code path regardless
//! of whether the source is compressed.
//!
//! ## Built-in codecs
//!
//! When enabled via feature flags, the following codecs are available next
//! to the always-present `none` codec:
//! - **gzip** — via `flate2` (feature: `compression-gzip`)
//! - **zstd** — via `zstd` (feature: `compression-zstd`)
//! - **bzip2** — via `bzip2` (feature: `compression-bzip2`)
//! - **xz** — via `xz2` (feature: `compression-xz`)
//!
//! ## Registry discipline
//!
//! The registry is an explicitly constructed, immutable-after-startup lookup
//! table handed to components by reference (`Arc<CodecRegistry>`), not a
//! process-global singleton. Populate it single-threaded at startup; after
//! that, concurrent `lookup`/`names` calls are plain `&self` reads and need
//! no locking.

pub mod providers;
pub mod stream;

use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::sync::Arc;

/// Pluggable compression codec.
///
/// Implementations must be `Send + Sync`: one provider instance is shared
/// across every stage thread that resolves it from the registry.
pub trait CodecProvider: Send + Sync {
    /// Unique registry key, e.g. `"none"`, `"gzip"`. Lookup is
    /// case-insensitive.
    fn name(&self) -> &str;

    /// Whether streams of this codec contain multiple logical entries
    /// (archive formats). Single-stream codecs report `false` and their
    /// wrapped streams expose exactly one implicit entry.
    fn supports_entries(&self) -> bool {
        false
    }

    /// Wrap a raw reader with decompression.
    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>>;

    /// Wrap a raw writer with compression (output side of the descriptor).
    fn wrap_writer(&self, writer: Box<dyn Write + Send>)
    -> std::io::Result<Box<dyn Write + Send>>;
}

impl std::fmt::Debug for dyn CodecProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Name-keyed lookup table of codec providers.
///
/// Construct once at startup (typically via [`CodecRegistry::builtin`]),
/// register any plugin-supplied providers, then share behind `Arc`.
#[derive(Default)]
pub struct CodecRegistry {
    providers: Vec<Arc<dyn CodecProvider>>,
}

impl CodecRegistry {
    /// An empty registry with no providers, not even `none`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the `none` codec plus every feature-enabled
    /// built-in codec.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        let builtins: Vec<Arc<dyn CodecProvider>> = vec![
            Arc::new(providers::NoneCodec),
            #[cfg(feature = "compression-gzip")]
            Arc::new(providers::GzipCodec),
            #[cfg(feature = "compression-zstd")]
            Arc::new(providers::ZstdCodec),
            #[cfg(feature = "compression-bzip2")]
            Arc::new(providers::Bzip2Codec),
            #[cfg(feature = "compression-xz")]
            Arc::new(providers::XzCodec),
        ];
        for provider in builtins {
            // Built-in names are distinct; register cannot fail here.
            let _ = registry.register(provider);
        }
        registry
    }

    /// Register a provider under its own name.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateCodec`] if a provider with the same name
    /// (ignoring case) already exists.
    pub fn register(&mut self, provider: Arc<dyn CodecProvider>) -> Result<()> {
        let name = provider.name();
        if self
            .providers
            .iter()
            .any(|p| p.name().eq_ignore_ascii_case(name))
        {
            return Err(Error::DuplicateCodec {
                name: name.to_string(),
            });
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Resolve a provider by name, ignoring case.
    ///
    /// # Errors
    /// Returns [`Error::UnknownCodec`] if no provider matches.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn CodecProvider>> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| Error::UnknownCodec {
                name: name.to_string(),
            })
    }

    /// Canonical provider names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}
