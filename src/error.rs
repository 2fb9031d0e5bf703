//! Error taxonomy for the rowflow engine.
//!
//! Errors are split along the lines a pipeline orchestrator cares about:
//! configuration problems are detected at stage init and prevent the stage
//! from starting, codec problems surface lazily on the first read that
//! touches corrupt bytes, and conversion problems are per-field and only
//! fatal when the parser runs in strict mode.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by the rowflow core.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid stage or parser configuration, detected at init.
    /// The stage never proceeds to processing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Corrupt or unsupported compressed data, detected lazily on read.
    #[error("codec '{codec}' error: {source}")]
    Codec {
        /// Registry name of the codec that failed.
        codec: String,
        #[source]
        source: std::io::Error,
    },

    /// A cell's text does not satisfy its declared type/format.
    ///
    /// Recoverable per field under non-strict parsing (the engine
    /// substitutes the default or null); fatal under strict parsing.
    #[error("line {line}: cannot convert '{value}' for field '{field}': {reason}")]
    Conversion {
        /// 1-based line number of the offending row.
        line: u64,
        /// Field name from the schema.
        field: String,
        /// Raw cell text after trimming.
        value: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// Duplicate or otherwise invalid field definitions, detected at
    /// schema construction.
    #[error("schema error: {0}")]
    Schema(String),

    /// Lookup of a codec name that was never registered.
    #[error("unknown compression codec '{name}'")]
    UnknownCodec { name: String },

    /// Registration of a codec name that already exists.
    #[error("compression codec '{name}' is already registered")]
    DuplicateCodec { name: String },

    /// A row observer rejected a produced row. Fatal to the stage.
    #[error("row observer failed: {0}")]
    Observer(String),

    /// Row delivery was cut short: the stage was stopped while blocked on a
    /// full queue, or the consumer side of a queue went away.
    #[error("row delivery interrupted: {0}")]
    Interrupted(String),

    /// Underlying I/O failure outside any codec transform.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an I/O error with the name of the codec whose stream produced it.
    pub(crate) fn codec(name: &str, source: std::io::Error) -> Self {
        Error::Codec {
            codec: name.to_string(),
            source,
        }
    }
}
