//! Activity type resolution.
//!
//! Exports carry the activity type in one of two shapes: a flattened
//! `activityTypeDTO.typeKey` column holding the key itself, or an
//! `activityType` column holding either the key or an encoded mapping with a
//! `typeKey` entry. Every raw value is classified into a [`RawTypeField`] and
//! resolved into a [`TypeKey`].

use csv::StringRecord;
use serde_json::{Map, Value};
use tracing::debug;

use super::literal;
use crate::error::ImportError;
use crate::models::TypeKey;

/// Flattened column written by the exporter
pub const FLATTENED_COLUMN: &str = "activityTypeDTO.typeKey";

/// Nested column carrying a key or an encoded mapping
pub const NESTED_COLUMN: &str = "activityType";

/// Entry holding the key inside an encoded mapping
pub const TYPE_KEY_FIELD: &str = "typeKey";

/// One raw activity type value, tagged by where it came from
#[derive(Debug, Clone, PartialEq)]
pub enum RawTypeField<'a> {
    /// Value of the flattened key column
    Flattened(&'a str),
    /// Value of the nested column containing an encoded mapping
    Encoded(&'a str),
    /// Value of the nested column holding the key as plain text
    Plain(&'a str),
    /// Already-structured mapping (JSON exports)
    Structured(&'a Map<String, Value>),
    /// No usable value in this row
    Absent,
}

impl<'a> RawTypeField<'a> {
    /// Classify a value of the nested column
    pub fn nested(value: &'a str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            RawTypeField::Absent
        } else if value.contains('{') {
            RawTypeField::Encoded(value)
        } else {
            RawTypeField::Plain(value)
        }
    }

    /// Classify a value of the flattened column
    pub fn flattened(value: &'a str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            RawTypeField::Absent
        } else {
            RawTypeField::Flattened(value)
        }
    }

    /// Classify a JSON value found under the nested key
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => RawTypeField::Structured(map),
            Value::String(s) => RawTypeField::nested(s),
            _ => RawTypeField::Absent,
        }
    }

    pub fn resolve(&self) -> TypeKey {
        match self {
            RawTypeField::Flattened(key) | RawTypeField::Plain(key) => key_from_text(key),
            RawTypeField::Encoded(text) => match literal::parse_mapping(text) {
                Ok(map) => key_from_mapping(&map),
                Err(e) => {
                    debug!(error = %e, value = %text, "Unparseable activity type literal");
                    TypeKey::Unknown
                }
            },
            RawTypeField::Structured(map) => key_from_mapping(map),
            RawTypeField::Absent => TypeKey::Unknown,
        }
    }
}

fn key_from_text(key: &str) -> TypeKey {
    match key {
        // Missing values in the cache are written as NaN
        "" | "nan" | "NaN" | "None" => TypeKey::Unknown,
        key => TypeKey::Known(key.to_string()),
    }
}

fn key_from_mapping(map: &Map<String, Value>) -> TypeKey {
    match map.get(TYPE_KEY_FIELD) {
        Some(Value::String(key)) => key_from_text(key.trim()),
        _ => TypeKey::Unknown,
    }
}

/// Where the activity type lives in a tabular export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisciplineColumns {
    /// Only the flattened key column
    Flattened(usize),
    /// Only the nested column
    Nested(usize),
    /// Both present; the flattened key wins when it has a value
    Both { flattened: usize, nested: usize },
}

impl DisciplineColumns {
    /// Locate the discipline-carrying columns.
    ///
    /// Fails when neither column exists; the caller must abort the import.
    pub fn locate(headers: &StringRecord) -> Result<Self, ImportError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        match (position(FLATTENED_COLUMN), position(NESTED_COLUMN)) {
            (Some(flattened), Some(nested)) => Ok(DisciplineColumns::Both { flattened, nested }),
            (Some(flattened), None) => Ok(DisciplineColumns::Flattened(flattened)),
            (None, Some(nested)) => Ok(DisciplineColumns::Nested(nested)),
            (None, None) => Err(ImportError::MissingDisciplineColumn {
                expected: format!("{}, {}", FLATTENED_COLUMN, NESTED_COLUMN),
            }),
        }
    }

    /// Classify the raw value of one record
    pub fn classify<'r>(&self, record: &'r StringRecord) -> RawTypeField<'r> {
        let flattened = |idx: usize| RawTypeField::flattened(record.get(idx).unwrap_or(""));
        let nested = |idx: usize| RawTypeField::nested(record.get(idx).unwrap_or(""));

        match *self {
            DisciplineColumns::Flattened(idx) => flattened(idx),
            DisciplineColumns::Nested(idx) => nested(idx),
            DisciplineColumns::Both {
                flattened: f,
                nested: n,
            } => match flattened(f) {
                RawTypeField::Absent => nested(n),
                field => field,
            },
        }
    }

    pub fn resolve(&self, record: &StringRecord) -> TypeKey {
        self.classify(record).resolve()
    }
}
