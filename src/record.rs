//! Decoding one JSON object into a flat record.
//!
//! A record is the ephemeral unit between the byte stream and the columnar
//! table: it is produced per input object, fed to the schema builder and
//! table builder, and dropped.

use crate::error::{Error, Result};
use crate::value::Scalar;
use serde_json::{Map, Value};

/// One decoded input object: an ordered `field name -> Scalar` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Scalar) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert a decoded JSON object into a record, rejecting values a
    /// tabular cell cannot hold.
    pub fn from_object(obj: Map<String, Value>) -> Result<Record> {
        let mut fields = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            let scalar = scalar_from_json(value).map_err(|e| match e {
                Error::UnsupportedValue(reason) => {
                    Error::UnsupportedValue(format!("field \"{}\": {}", key, reason))
                }
                other => other,
            })?;
            fields.push((key, scalar));
        }
        Ok(Record { fields })
    }
}

impl Default for Record {
    fn default() -> Self {
        Record::new()
    }
}

/// Convert one JSON value into a cell scalar.
pub fn scalar_from_json(value: Value) -> Result<Scalar> {
    match value {
        Value::Null => Ok(Scalar::Null),
        Value::Bool(b) => Ok(Scalar::Bool(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Int(i))
            } else if n.is_u64() {
                Err(Error::UnsupportedValue(format!(
                    "integer {} exceeds the i64 range",
                    n
                )))
            } else if let Some(f) = n.as_f64() {
                Ok(Scalar::Float(f))
            } else {
                Err(Error::UnsupportedValue(format!("number {} is not representable", n)))
            }
        }
        Value::String(s) => Ok(Scalar::String(s)),
        Value::Array(_) => Err(Error::UnsupportedValue(
            "nested arrays cannot be stored in a tabular column".into(),
        )),
        Value::Object(_) => Err(Error::UnsupportedValue(
            "nested objects cannot be stored in a tabular column".into(),
        )),
    }
}

/// Parse one newline-delimited segment independently.
///
/// `line` is the 1-based line number and `offset` the byte offset of the
/// line start; both are baked into any `MalformedInput` so a fail-fast
/// caller can point at the offending line.
pub fn parse_line(text: &str, line: usize, offset: u64) -> Result<Record> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::MalformedInput {
        line,
        offset,
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(obj) => Record::from_object(obj),
        other => Err(Error::MalformedInput {
            line,
            offset,
            reason: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
