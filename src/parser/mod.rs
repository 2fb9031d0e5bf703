//! Streaming CSV tokenizer and typed-row assembly.
//!
//! [`CsvParser`] is a state machine over the decoded character stream. It
//! consumes one buffered chunk at a time through
//! [`TranscodingReader`](decode::TranscodingReader) and never loads the file
//! into memory. Quoted fields may contain delimiters and raw line
//! terminators verbatim; an enclosure character is escaped by doubling it.
//! CRLF, LF-only and CR-only are all accepted as a single row terminator
//! and bump the line counter exactly once, in every encoding.

pub mod decode;

use crate::codec::stream::CompressionInput;
use crate::error::{Error, Result};
use crate::schema::{self, Row, RowSchema};
use decode::TranscodingReader;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What to do when a row has more physical fields than the schema.
///
/// Strict mode errors regardless of this policy; the policy decides the
/// non-strict behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraFieldPolicy {
    /// Drop the extra trailing fields.
    #[default]
    Truncate,
    /// Fail the row.
    Error,
}

/// Parser-level options, hydrated from external configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvParserConfig {
    /// Field delimiter character.
    pub delimiter: char,
    /// Enclosure (quote) character.
    pub enclosure: char,
    /// Source character encoding, as a WHATWG label ("UTF-8", "UTF-16LE",
    /// "windows-1252", ...).
    pub encoding: String,
    /// Whether the first physical row is a header to consume and discard.
    pub has_header: bool,
    /// Raw bytes pulled from the stream per read.
    pub buffer_size: usize,
    /// Strict mode: conversion failures and field-count mismatches abort
    /// the row instead of being patched.
    pub strict: bool,
    /// Non-strict handling of rows with extra physical fields.
    #[serde(default)]
    pub extra_fields: ExtraFieldPolicy,
}

impl Default for CsvParserConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            enclosure: '"',
            encoding: "UTF-8".to_string(),
            has_header: true,
            buffer_size: 50_000,
            strict: false,
            extra_fields: ExtraFieldPolicy::default(),
        }
    }
}

/// Tokenizer states, driven by the class of the next character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Before the first character of a field.
    AwaitingField,
    /// Inside an unquoted field.
    InUnquotedField,
    /// Inside an enclosure-opened field; delimiters and terminators are
    /// literal here.
    InQuotedField,
    /// Just saw an enclosure inside a quoted field: either an escaped
    /// (doubled) enclosure continues the field, or the field has ended.
    AfterQuote,
    /// A row terminator was consumed; the record is complete.
    AtRowEnd,
}

/// Streaming CSV parser owning the per-run parse cursor.
///
/// Exclusively owned by one stage instance for the lifetime of one stream;
/// discarded when the stage disposes.
pub struct CsvParser {
    config: CsvParserConfig,
    schema: RowSchema,
    reader: TranscodingReader,
    /// Decoded characters not yet consumed by the tokenizer.
    pending: VecDeque<char>,
    /// 1-based physical line number of the next record.
    line_number: u64,
    rows_emitted: u64,
    header_skipped: bool,
    done: bool,
}

impl std::fmt::Debug for CsvParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvParser")
            .field("config", &self.config)
            .field("schema", &self.schema)
            .field("line_number", &self.line_number)
            .field("rows_emitted", &self.rows_emitted)
            .field("header_skipped", &self.header_skipped)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl CsvParser {
    /// Build a parser over `input`.
    ///
    /// # Errors
    /// [`Error::Configuration`] when the encoding label is unknown, the
    /// buffer size is zero, the delimiter equals the enclosure, or the
    /// schema is empty.
    pub fn new(
        config: CsvParserConfig,
        schema: RowSchema,
        input: CompressionInput,
    ) -> Result<Self> {
        if config.delimiter == config.enclosure {
            return Err(Error::Configuration(format!(
                "delimiter and enclosure are both '{}'",
                config.delimiter
            )));
        }
        if schema.is_empty() {
            return Err(Error::Configuration("field list is empty".into()));
        }
        let reader = TranscodingReader::new(input, &config.encoding, config.buffer_size)?;
        Ok(Self {
            config,
            schema,
            reader,
            pending: VecDeque::new(),
            line_number: 1,
            rows_emitted: 0,
            header_skipped: false,
            done: false,
        })
    }

    /// The schema rows are assembled against.
    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// 1-based line number of the next unread record.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Data rows emitted so far (the header does not count).
    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    /// Release the underlying stream. Further calls return no rows.
    pub fn close(&mut self) {
        self.done = true;
        self.reader.close();
    }

    /// Parse and convert the next data row.
    ///
    /// Returns `Ok(None)` once the stream is exhausted; the terminal state
    /// is sticky. A trailing row terminator produces no phantom empty row.
    ///
    /// # Errors
    /// [`Error::Codec`] for stream failures; [`Error::Conversion`] for row
    /// or cell failures under strict mode (non-strict conversion failures
    /// are absorbed by substituting the field default or null).
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.done {
            return Ok(None);
        }
        if self.config.has_header && !self.header_skipped {
            self.header_skipped = true;
            if self.read_record()?.is_none() {
                self.done = true;
                return Ok(None);
            }
        }
        let line = self.line_number;
        match self.read_record()? {
            None => {
                self.done = true;
                Ok(None)
            }
            Some(raw) => {
                let row = self.assemble(raw, line)?;
                self.rows_emitted += 1;
                Ok(Some(row))
            }
        }
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.pending.pop_front() {
            return Ok(Some(c));
        }
        match self.reader.next_chunk()? {
            None => Ok(None),
            Some(chunk) => {
                self.pending.extend(chunk.chars());
                Ok(self.pending.pop_front())
            }
        }
    }

    fn peek_char(&mut self) -> Result<Option<char>> {
        if self.pending.is_empty() {
            if let Some(chunk) = self.reader.next_chunk()? {
                self.pending.extend(chunk.chars());
            }
        }
        Ok(self.pending.front().copied())
    }

    /// Consume one row terminator whose first character was `first`.
    /// CRLF, LF and CR each count as exactly one terminator.
    fn consume_terminator(&mut self, first: char) -> Result<()> {
        if first == '\r' && self.peek_char()? == Some('\n') {
            self.pending.pop_front();
        }
        self.line_number += 1;
        Ok(())
    }

    /// Tokenize one physical record into raw field texts.
    ///
    /// Returns `None` at end of stream with no partial record pending; a
    /// non-empty partial final record (no trailing terminator) is flushed.
    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        let delimiter = self.config.delimiter;
        let enclosure = self.config.enclosure;
        let mut fields: Vec<String> = Vec::with_capacity(self.schema.len());
        let mut field = String::new();
        let mut state = ParseState::AwaitingField;
        let mut saw_any = false;

        while state != ParseState::AtRowEnd {
            let Some(c) = self.next_char()? else {
                if !saw_any {
                    return Ok(None);
                }
                // Partial final row without a trailing terminator.
                break;
            };
            saw_any = true;
            match state {
                ParseState::AwaitingField => {
                    if c == enclosure {
                        state = ParseState::InQuotedField;
                    } else if c == delimiter {
                        fields.push(std::mem::take(&mut field));
                    } else if c == '\r' || c == '\n' {
                        self.consume_terminator(c)?;
                        state = ParseState::AtRowEnd;
                    } else {
                        field.push(c);
                        state = ParseState::InUnquotedField;
                    }
                }
                ParseState::InUnquotedField => {
                    if c == delimiter {
                        fields.push(std::mem::take(&mut field));
                        state = ParseState::AwaitingField;
                    } else if c == '\r' || c == '\n' {
                        self.consume_terminator(c)?;
                        state = ParseState::AtRowEnd;
                    } else {
                        field.push(c);
                    }
                }
                ParseState::InQuotedField => {
                    if c == enclosure {
                        state = ParseState::AfterQuote;
                    } else {
                        // Delimiters and raw terminators are literal here.
                        field.push(c);
                    }
                }
                ParseState::AfterQuote => {
                    if c == enclosure {
                        // Doubled enclosure: literal enclosure character.
                        field.push(enclosure);
                        state = ParseState::InQuotedField;
                    } else if c == delimiter {
                        fields.push(std::mem::take(&mut field));
                        state = ParseState::AwaitingField;
                    } else if c == '\r' || c == '\n' {
                        self.consume_terminator(c)?;
                        state = ParseState::AtRowEnd;
                    } else {
                        // Stray text after a closing quote; keep it.
                        field.push(c);
                        state = ParseState::InUnquotedField;
                    }
                }
                ParseState::AtRowEnd => unreachable!(),
            }
        }
        fields.push(field);
        Ok(Some(fields))
    }

    /// Convert raw field texts into a typed [`Row`] against the schema.
    fn assemble(&self, mut raw: Vec<String>, line: u64) -> Result<Row> {
        let width = self.schema.len();
        if raw.len() > width {
            if self.config.strict || self.config.extra_fields == ExtraFieldPolicy::Error {
                return Err(Error::Conversion {
                    line,
                    field: "<row>".to_string(),
                    value: format!("{} physical fields", raw.len()),
                    reason: format!("schema defines {width} columns"),
                });
            }
            raw.truncate(width);
        }
        if raw.len() < width && self.config.strict {
            return Err(Error::Conversion {
                line,
                field: "<row>".to_string(),
                value: format!("{} physical fields", raw.len()),
                reason: format!("schema defines {width} columns"),
            });
        }

        let mut values = Vec::with_capacity(width);
        for (i, descriptor) in self.schema.iter().enumerate() {
            let value = match raw.get(i) {
                // Missing trailing fields pad with null.
                None => None,
                Some(text) => match schema::convert(text, descriptor, line) {
                    Ok(v) => v,
                    Err(e) if !self.config.strict => {
                        tracing::warn!(error = %e, "absorbed conversion error");
                        schema::fallback_value(descriptor, line)
                    }
                    Err(e) => return Err(e),
                },
            };
            values.push(value);
        }
        Ok(Row::new(values))
    }
}
