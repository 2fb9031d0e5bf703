//! Field schemas and the typed rows they validate.
//!
//! A [`RowSchema`] is an ordered list of [`FieldDescriptor`]s; order is
//! significant because it defines column position and output order. The
//! parser converts raw cell text into [`Value`]s through [`convert`],
//! honoring each field's declared type, format mask, trim policy, and
//! default.
//!
//! Schemas are configuration: built once before a run, immutable while any
//! parser is using them.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Declared semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Date,
    Boolean,
    Binary,
}

/// Whitespace trimming applied to raw cell text before conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimPolicy {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl TrimPolicy {
    /// Apply this policy to raw cell text.
    pub fn apply<'a>(&self, raw: &'a str) -> &'a str {
        match self {
            TrimPolicy::None => raw,
            TrimPolicy::Left => raw.trim_start(),
            TrimPolicy::Right => raw.trim_end(),
            TrimPolicy::Both => raw.trim(),
        }
    }
}

/// Default date/time format mask, used when a date field declares none.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One typed column descriptor.
///
/// Immutable once a parse run starts; construct with [`FieldDescriptor::new`]
/// and the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name, unique within a schema.
    pub name: String,
    /// Declared semantic type.
    pub field_type: FieldType,
    /// Optional declared length (metadata for downstream consumers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Optional declared precision (metadata for downstream consumers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Optional format mask, e.g. a chrono date pattern for [`FieldType::Date`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Trim policy applied before conversion.
    #[serde(default)]
    pub trim: TrimPolicy,
    /// Optional raw-text default substituted for empty cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            length: None,
            precision: None,
            format: None,
            trim: TrimPolicy::default(),
            default: None,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_trim(mut self, trim: TrimPolicy) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered, duplicate-free sequence of field descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSchema {
    fields: Vec<FieldDescriptor>,
}

impl RowSchema {
    /// Build a schema from ordered fields.
    ///
    /// # Errors
    /// Returns [`Error::Schema`] when two fields share a name or a field
    /// name is empty.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(Error::Schema(format!("field #{} has an empty name", i + 1)));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::Schema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Number of columns a parser emits per row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptor at column position `index`.
    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    /// Column position of the field named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDateTime),
    Boolean(bool),
    Binary(Vec<u8>),
}

impl Value {
    /// Borrow the inner string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One produced row: typed values positionally aligned with a [`RowSchema`].
///
/// A cell is `None` when the source cell was empty and the field declares no
/// default. Rows are immutable once produced; fan-out delivery clones the
/// row so each queue still hands its instance to exactly one consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Option<Value>>,
}

impl Row {
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at column position `index`; `None` both for out-of-range and
    /// for null cells (use [`Row::values`] to distinguish).
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }
}

/// Convert trimmed, non-empty cell text under a field's declared type.
fn parse_typed(text: &str, field: &FieldDescriptor, line: u64) -> Result<Value> {
    let fail = |reason: String| Error::Conversion {
        line,
        field: field.name.clone(),
        value: text.to_string(),
        reason,
    };

    match field.field_type {
        FieldType::String => Ok(Value::String(text.to_string())),
        FieldType::Integer => text
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| fail(e.to_string())),
        FieldType::Number => text
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|e| fail(e.to_string())),
        FieldType::Date => {
            let mask = field.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, mask) {
                return Ok(Value::Date(dt));
            }
            // A date-only mask parses to midnight.
            NaiveDate::parse_from_str(text, mask)
                .map(|d| Value::Date(d.and_hms_opt(0, 0, 0).unwrap_or_default()))
                .map_err(|e| fail(format!("does not match mask '{mask}': {e}")))
        }
        FieldType::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(Value::Boolean(true)),
            "false" | "no" | "n" | "0" => Ok(Value::Boolean(false)),
            _ => Err(fail("not a recognized boolean".to_string())),
        },
        FieldType::Binary => Ok(Value::Binary(text.as_bytes().to_vec())),
    }
}

/// Convert raw cell text into a typed value for `field`.
///
/// Trimming is applied first, per the field's policy. Empty text yields the
/// field's converted default when one is configured, otherwise `None`.
///
/// # Errors
/// Returns [`Error::Conversion`] (carrying `line` and the field name) when
/// the text cannot be parsed under the declared type/format. The caller
/// decides whether that is fatal (strict mode) or absorbed (substitute the
/// default or null).
pub fn convert(raw: &str, field: &FieldDescriptor, line: u64) -> Result<Option<Value>> {
    let text = field.trim.apply(raw);
    if text.is_empty() {
        return match &field.default {
            Some(default) => parse_typed(default, field, line).map(Some),
            None => Ok(None),
        };
    }
    parse_typed(text, field, line).map(Some)
}

/// Fallback applied when a strict=false parse absorbs a conversion error:
/// the configured default if present, otherwise null.
pub(crate) fn fallback_value(field: &FieldDescriptor, line: u64) -> Option<Value> {
    field
        .default
        .as_deref()
        .and_then(|d| parse_typed(d, field, line).ok())
}
