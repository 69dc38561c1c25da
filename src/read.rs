//! Whole-document JSON and line-delimited NDJSON reads.
//!
//! Both paths materialize records, infer the full schema, then build the
//! table, so the inferred types are exact. For bounded-memory scans over
//! large NDJSON sources use [`crate::scan::NdjsonScanner`] instead.

use crate::error::{Error, Result};
use crate::record::{json_type_name, parse_line, Record};
use crate::schema::{Schema, SchemaBuilder};
use crate::table::{Table, TableBuilder};
use serde_json::Value;
use std::io::{BufRead, Read};

/// What to do with a line that fails to parse or to fit the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadLines {
    /// Abort the whole read on the first bad line.
    #[default]
    Fail,
    /// Drop the line, keep going, and report it in the result.
    Skip,
}

/// Options for line-delimited reads.
#[derive(Debug, Clone, Default)]
pub struct NdjsonOptions {
    pub bad_lines: BadLines,
    /// Fail on record keys the schema does not know. Only takes effect
    /// with [`read_ndjson_with_schema`]; inferred schemas cover every key.
    pub strict: bool,
}

/// A line dropped under [`BadLines::Skip`], with enough position detail
/// that nothing is lost silently.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line: usize,
    pub offset: u64,
    pub reason: String,
}

/// Result of a line-delimited read: the table plus every skipped line.
#[derive(Debug)]
pub struct NdjsonRead {
    pub table: Table,
    pub skipped: Vec<SkippedLine>,
}

/// Read a whole document containing one top-level JSON array of objects.
pub fn read_json<R: BufRead>(mut reader: R) -> Result<Table> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    read_json_str(&text)
}

/// Read a whole document from an in-memory string.
pub fn read_json_str(input: &str) -> Result<Table> {
    let value: Value = serde_json::from_str(input).map_err(|e| Error::MalformedInput {
        line: e.line(),
        offset: line_start_offset(input, e.line()),
        reason: e.to_string(),
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::MalformedInput {
                line: 1,
                offset: 0,
                reason: format!(
                    "expected a top-level JSON array of objects, got {}",
                    json_type_name(&other)
                ),
            })
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => records.push(Record::from_object(obj)?),
            other => {
                return Err(Error::MalformedInput {
                    line: 1,
                    offset: 0,
                    reason: format!(
                        "array element {} is {}, expected an object",
                        i,
                        json_type_name(&other)
                    ),
                })
            }
        }
    }

    build_table(&records)
}

/// Read newline-delimited JSON, one object per line, inferring the
/// schema from every surviving record. Blank lines are ignored. Each
/// line is parsed independently, so under [`BadLines::Skip`] a syntax
/// error costs only that line.
pub fn read_ndjson<R: BufRead>(reader: R, options: &NdjsonOptions) -> Result<NdjsonRead> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for_each_line(reader, options.bad_lines, &mut skipped, |record| {
        records.push(record);
        Ok(())
    })?;

    let table = build_table(&records)?;
    Ok(NdjsonRead { table, skipped })
}

/// Read newline-delimited JSON against a caller-supplied schema instead
/// of inferring one. This is where [`NdjsonOptions::strict`] bites: a
/// record key the schema does not know fails with `SchemaMismatch`
/// (relaxed mode drops it), and lines that do not fit the schema follow
/// the same bad-line policy as syntax errors.
pub fn read_ndjson_with_schema<R: BufRead>(
    reader: R,
    schema: Schema,
    options: &NdjsonOptions,
) -> Result<NdjsonRead> {
    let mut builder = TableBuilder::new(schema, options.strict);
    let mut skipped = Vec::new();
    for_each_line(reader, options.bad_lines, &mut skipped, |record| {
        builder.append_record(&record)
    })?;

    Ok(NdjsonRead {
        table: builder.finish(),
        skipped,
    })
}

/// Drive one handler over every non-blank line, tracking positions and
/// applying the bad-line policy to parse and handler errors alike.
fn for_each_line<R: BufRead>(
    mut reader: R,
    bad_lines: BadLines,
    skipped: &mut Vec<SkippedLine>,
    mut handle: impl FnMut(Record) -> Result<()>,
) -> Result<()> {
    let mut buf = String::new();
    let mut line_no = 0usize;
    let mut offset = 0u64;

    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        line_no += 1;
        let start = offset;
        offset += n as u64;

        let text = buf.trim();
        if text.is_empty() {
            continue;
        }

        let outcome = parse_line(text, line_no, start).and_then(&mut handle);
        if let Err(e) = outcome {
            match bad_lines {
                BadLines::Fail => return Err(e),
                BadLines::Skip => skipped.push(SkippedLine {
                    line: line_no,
                    offset: start,
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// Read newline-delimited JSON from a string. Convenience wrapper over
/// [`read_ndjson`].
pub fn read_ndjson_str(input: &str, options: &NdjsonOptions) -> Result<NdjsonRead> {
    read_ndjson(input.as_bytes(), options)
}

/// Byte offset of the start of a 1-based line, so whole-document parse
/// errors report positions the same way line-delimited ones do.
fn line_start_offset(text: &str, line: usize) -> u64 {
    text.split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() as u64)
        .sum()
}

/// Infer the exact schema from every record, then build the table. Records
/// that contributed to inference always fit the result, so this cannot
/// fail with a mismatch.
fn build_table(records: &[Record]) -> Result<Table> {
    let mut inferencer = SchemaBuilder::new();
    for record in records {
        inferencer.add_record(record);
    }
    let schema = inferencer.build();

    let mut builder = TableBuilder::new(schema, false);
    for record in records {
        builder.append_record(record)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use crate::value::{DataType, Scalar};

    #[test]
    fn test_read_json_array_of_objects() {
        let table = read_json_str(
            r#"[{"foo":1,"bar":null},{"foo":2,"bar":"bak"},{"foo":3,"bar":"baz"}]"#,
        )
        .unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 2);

        let foo = table.schema().field("foo").unwrap();
        assert_eq!(foo.dtype, DataType::Int);
        assert!(!foo.nullable);
        assert_eq!(
            table.column("foo").unwrap(),
            &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]
        );

        let bar = table.schema().field("bar").unwrap();
        assert_eq!(bar.dtype, DataType::String);
        assert!(bar.nullable);
        assert_eq!(
            table.column("bar").unwrap(),
            &[
                Scalar::Null,
                Scalar::String("bak".into()),
                Scalar::String("baz".into())
            ]
        );
    }

    #[test]
    fn test_read_json_rejects_non_array() {
        let err = read_json_str(r#"{"a":1}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn test_read_json_rejects_non_object_element() {
        let err = read_json_str(r#"[{"a":1}, 5]"#).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn test_read_json_empty_array() {
        let table = read_json_str("[]").unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_read_ndjson_basic() {
        let input = "{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n";
        let out = read_ndjson_str(input, &NdjsonOptions::default()).unwrap();
        assert!(out.skipped.is_empty());
        assert_eq!(
            out.table.column("a").unwrap(),
            &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]
        );
    }

    #[test]
    fn test_read_ndjson_blank_lines_ignored() {
        let input = "{\"a\":1}\n\n{\"a\":2}\n";
        let out = read_ndjson_str(input, &NdjsonOptions::default()).unwrap();
        assert_eq!(out.table.num_rows(), 2);
    }

    #[test]
    fn test_read_ndjson_fail_fast_reports_position() {
        let input = "{\"a\":1}\nnot json\n{\"a\":3}\n";
        let err = read_ndjson_str(input, &NdjsonOptions::default()).unwrap_err();
        match err {
            Error::MalformedInput { line, offset, .. } => {
                assert_eq!(line, 2);
                assert_eq!(offset, 8); // first line is 8 bytes including newline
            }
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_read_ndjson_skip_and_continue() {
        let input = "{\"a\":1}\nnot json\n{\"a\":3}\n";
        let options = NdjsonOptions {
            bad_lines: BadLines::Skip,
            ..Default::default()
        };
        let out = read_ndjson_str(input, &options).unwrap();

        assert_eq!(out.table.num_rows(), 2);
        assert_eq!(
            out.table.column("a").unwrap(),
            &[Scalar::Int(1), Scalar::Int(3)]
        );
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].line, 2);
        assert_eq!(out.skipped[0].offset, 8);
    }

    #[test]
    fn test_read_ndjson_sparse_records() {
        let input = "{\"a\":1,\"b\":true}\n{\"a\":2}\n";
        let out = read_ndjson_str(input, &NdjsonOptions::default()).unwrap();
        assert_eq!(
            out.table.column("b").unwrap(),
            &[Scalar::Bool(true), Scalar::Null]
        );
        assert!(out.table.schema().field("b").unwrap().nullable);
    }

    #[test]
    fn test_read_json_error_offset_is_line_start() {
        let input = "[\n{\"a\":1},\nnot json\n]";
        let err = read_json_str(input).unwrap_err();
        match err {
            Error::MalformedInput { line, offset, .. } => {
                assert_eq!(line, 3);
                assert_eq!(offset, 11); // "[\n" + "{\"a\":1},\n"
            }
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_read_with_schema_strict_rejects_unknown_key() {
        let schema = Schema::new(vec![Field::new("a", DataType::Int, false)]).unwrap();
        let input = "{\"a\":1}\n{\"a\":2,\"extra\":true}\n";

        let strict = NdjsonOptions {
            strict: true,
            ..Default::default()
        };
        let err = read_ndjson_with_schema(input.as_bytes(), schema.clone(), &strict).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));

        let relaxed = NdjsonOptions::default();
        let out = read_ndjson_with_schema(input.as_bytes(), schema, &relaxed).unwrap();
        assert_eq!(out.table.num_rows(), 2);
        assert_eq!(out.table.num_columns(), 1);
    }

    #[test]
    fn test_read_with_schema_skip_counts_misfit_lines() {
        let schema = Schema::new(vec![Field::new("a", DataType::Int, false)]).unwrap();
        let input = "{\"a\":1}\n{\"a\":\"oops\"}\n{\"a\":3}\n";
        let options = NdjsonOptions {
            bad_lines: BadLines::Skip,
            ..Default::default()
        };
        let out = read_ndjson_with_schema(input.as_bytes(), schema, &options).unwrap();

        assert_eq!(
            out.table.column("a").unwrap(),
            &[Scalar::Int(1), Scalar::Int(3)]
        );
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].line, 2);
    }

    #[test]
    fn test_read_ndjson_matches_json_read() {
        let ndjson = "{\"x\":1,\"y\":\"a\"}\n{\"x\":2,\"y\":\"b\"}\n";
        let array = r#"[{"x":1,"y":"a"},{"x":2,"y":"b"}]"#;
        let from_lines = read_ndjson_str(ndjson, &NdjsonOptions::default())
            .unwrap()
            .table;
        let from_array = read_json_str(array).unwrap();
        assert_eq!(from_lines, from_array);
    }
}
