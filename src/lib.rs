//! # Rowflow
//!
//! A **row-oriented streaming ETL core** for Rust: delimited text ingestion,
//! transparent decompression, and a composable stage/queue pipeline
//! contract, inspired by classic row-based ETL engines.
//!
//! ## Key Features
//!
//! - **Streaming CSV parser** - a buffered tokenizer state machine that
//!   handles configurable delimiters and enclosures, doubled-quote escapes,
//!   embedded line breaks inside quoted values, and CRLF/LF/CR terminators,
//!   without ever loading the file into memory
//! - **Encoding-aware** - incremental decoding of UTF-8, UTF-16LE/BE,
//!   windows-1252 and anything else `encoding_rs` knows, safe across buffer
//!   chunk boundaries
//! - **Pluggable decompression** - "no compression" is just another codec,
//!   so every stage reads through one [`CompressionInput`] path; gzip, zstd,
//!   bzip2 and xz ship behind feature flags
//! - **Typed rows** - field schemas convert cell text to string, integer,
//!   number, date, boolean, or binary values with per-field trim policies,
//!   format masks, and defaults
//! - **Stage contract** - init/process/dispose lifecycle, bounded row
//!   queues with backpressure, synchronous row observers, cooperative stop
//!
//! ## Quick Start
//!
//! ```no_run
//! use rowflow::*;
//! use std::sync::Arc;
//! # fn main() -> anyhow::Result<()> {
//!
//! // Codec lookup table, built once at startup and shared by reference.
//! let registry = Arc::new(CodecRegistry::builtin());
//!
//! let config = CsvInputConfig {
//!     path: "orders.csv.gz".into(),
//!     parser: CsvParserConfig { delimiter: ';', ..Default::default() },
//!     compression: "gzip".into(),
//!     fields: vec![
//!         FieldDescriptor::new("id", FieldType::Integer),
//!         FieldDescriptor::new("total", FieldType::Number),
//!     ],
//! };
//!
//! let (producer, consumer) = queue::bounded(1024);
//! let mut stage = CsvInputStage::new(config, registry);
//! stage.add_output(producer);
//!
//! let stop = StopSignal::new();
//! let handle = spawn_stage(stage, stop.clone());
//!
//! while let Some(row) = consumer.pop() {
//!     println!("{row:?}");
//! }
//! let produced = handle.join().expect("stage thread panicked")?;
//! println!("{produced} rows");
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Schema and rows
//!
//! A [`RowSchema`] is an ordered, duplicate-free list of
//! [`FieldDescriptor`]s; order defines column position. The parser emits
//! one [`Row`] per physical record, positionally aligned with the schema; a
//! cell is null when the source cell was empty and no default is
//! configured.
//!
//! ### Codecs
//!
//! A [`CodecRegistry`] maps names to [`CodecProvider`]s. It is explicitly
//! constructed at startup and passed by `Arc` to whoever needs codec
//! resolution; there is no global singleton. Reads are lock-free after
//! the single-threaded registration phase.
//!
//! ### Stages and queues
//!
//! Each [`Stage`] runs on its own thread and talks to its neighbors only
//! through bounded row [`queue`]s. `process_one_unit` handles one row per
//! call and blocks on I/O or on a full downstream queue; returning `false`
//! is terminal. [`run_stage`] guarantees `dispose` on every exit path.
//!
//! ## Feature Flags
//!
//! - `compression-gzip` - gzip codec via `flate2`
//! - `compression-zstd` - zstd codec via `zstd`
//! - `compression-bzip2` - bzip2 codec via `bzip2`
//! - `compression-xz` - xz codec via `xz2`
//!
//! All are enabled by default; the `none` codec is always available.
//!
//! ## Module Overview
//!
//! - [`schema`] - field descriptors, row schemas, typed values, conversion
//! - [`codec`] - codec providers, the registry, and [`CompressionInput`]
//! - [`parser`] - the streaming CSV tokenizer and row assembly
//! - [`stage`] - stage lifecycle, row queues, observers, orchestration
//! - [`error`] - the crate error taxonomy

pub mod codec;
pub mod error;
pub mod parser;
pub mod schema;
pub mod stage;

pub use codec::stream::{CompressionInput, Entry};
pub use codec::{CodecProvider, CodecRegistry};
pub use error::{Error, Result};
pub use parser::{CsvParser, CsvParserConfig, ExtraFieldPolicy};
pub use schema::{FieldDescriptor, FieldType, Row, RowSchema, TrimPolicy, Value, convert};
pub use stage::csv_input::{CsvInputConfig, CsvInputStage};
pub use stage::queue;
pub use stage::{RowObserver, Stage, StopSignal, run_stage, spawn_stage};
