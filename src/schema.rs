//! Column schema and streaming schema inference.
//!
//! Inference follows an accumulator pattern: statistics are gathered per
//! field as records arrive and the schema is materialized once at the end.
//! Widening is associative and commutative and the canonical field order is
//! lexicographic, so the result does not depend on record order or on how
//! the input was chopped into batches.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::{DataType, Scalar};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static ISO_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(.\d+)?$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap());

static IPV6_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4})$").unwrap()
});

/// One column declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub dtype: DataType,
    pub nullable: bool,
    /// Advisory string-format hint (date, date-time, time, email, uuid,
    /// ipv4, ipv6, uri); set only when every non-null observed value
    /// agreed on one format. Never affects type widening.
    pub format: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: DataType, nullable: bool) -> Self {
        Field {
            name: name.into(),
            dtype,
            nullable,
            format: None,
        }
    }
}

/// An ordered set of fields; each name appears exactly once.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(Error::SchemaMismatch(format!(
                    "duplicate field \"{}\"",
                    field.name
                )));
            }
        }
        Ok(Schema { fields, index })
    }

    pub fn empty() -> Self {
        Schema {
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON description of the schema, used by the CLI output.
    pub fn to_json(&self) -> Value {
        let fields: Vec<Value> = self
            .fields
            .iter()
            .map(|f| {
                let mut obj = json!({
                    "name": f.name,
                    "type": f.dtype.as_str(),
                    "nullable": f.nullable,
                });
                if let Some(ref fmt) = f.format {
                    obj["format"] = Value::String(fmt.clone());
                }
                obj
            })
            .collect();
        json!({ "fields": fields })
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

/// Per-field statistics accumulated during inference.
#[derive(Debug, Default)]
struct FieldStats {
    dtype: Option<DataType>,
    saw_null: bool,
    seen: usize,
    non_null: usize,
    format_counts: HashMap<&'static str, usize>,
}

impl FieldStats {
    fn add(&mut self, value: &Scalar) {
        self.seen += 1;
        match value {
            Scalar::Null => self.saw_null = true,
            other => {
                self.non_null += 1;
                let dtype = other.dtype();
                self.dtype = Some(match self.dtype {
                    Some(acc) => acc.widen(dtype),
                    None => dtype,
                });
                if let Scalar::String(s) = other {
                    if let Some(fmt) = detect_format(s) {
                        *self.format_counts.entry(fmt).or_insert(0) += 1;
                    }
                }
            }
        }
    }

    fn format(&self) -> Option<String> {
        // All non-null values must share one detected format.
        if self.format_counts.len() == 1 {
            if let Some((fmt, count)) = self.format_counts.iter().next() {
                if *count == self.non_null {
                    return Some((*fmt).to_string());
                }
            }
        }
        None
    }
}

/// Streaming schema inferencer.
///
/// Feed records with [`add_record`](Self::add_record), then call
/// [`build`](Self::build) once. A field absent from some records becomes
/// nullable; a field whose only observations were nulls gets type `Null`.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    stats: BTreeMap<String, FieldStats>,
    record_count: usize,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        SchemaBuilder::default()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn add_record(&mut self, record: &Record) {
        self.record_count += 1;
        for (name, value) in record.iter() {
            self.stats.entry(name.to_string()).or_default().add(value);
        }
    }

    pub fn build(self) -> Schema {
        let record_count = self.record_count;
        let mut fields = Vec::with_capacity(self.stats.len());
        let mut index = HashMap::with_capacity(self.stats.len());

        for (name, stats) in self.stats {
            let dtype = stats.dtype.unwrap_or(DataType::Null);
            let nullable = stats.saw_null || stats.seen < record_count;
            let format = if dtype == DataType::String {
                stats.format()
            } else {
                None
            };
            index.insert(name.clone(), fields.len());
            fields.push(Field {
                name,
                dtype,
                nullable,
                format,
            });
        }

        Schema { fields, index }
    }
}

/// Detect if a string matches a known format.
fn detect_format(value: &str) -> Option<&'static str> {
    let len = value.len();
    if len == 0 {
        return None;
    }

    // Cheap prefix/byte checks gate the regex work.
    if len > 6
        && (value.starts_with("http://")
            || value.starts_with("https://")
            || value.starts_with("ftp://")
            || value.starts_with("file://"))
    {
        return Some("uri");
    }

    if len == 10 && value.as_bytes()[4] == b'-' && ISO_DATE_REGEX.is_match(value) {
        return Some("date");
    }

    if len >= 19 && value.as_bytes()[10] == b'T' && ISO_DATETIME_REGEX.is_match(value) {
        return Some("date-time");
    }

    if len >= 8 && value.as_bytes()[2] == b':' && ISO_TIME_REGEX.is_match(value) {
        return Some("time");
    }

    if len > 5 && len < 255 && value.contains('@') && EMAIL_REGEX.is_match(value) {
        return Some("email");
    }

    if len == 36 && value.as_bytes()[8] == b'-' && UUID_REGEX.is_match(&value.to_lowercase()) {
        return Some("uuid");
    }

    if len < 16 && value.contains('.') && is_ipv4(value) {
        return Some("ipv4");
    }

    if value.contains(':') && IPV6_REGEX.is_match(value) {
        return Some("ipv6");
    }

    None
}

fn is_ipv4(s: &str) -> bool {
    if !IPV4_REGEX.is_match(s) {
        return false;
    }

    // The regex allows octets up to 999
    s.split('.').all(|part| part.parse::<u8>().is_ok())
}
