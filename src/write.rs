//! Serializing a table back to JSON.
//!
//! Output is dense: every row emits every schema key in schema order, and
//! null cells are written as the JSON `null` literal, never omitted. The
//! reader tolerates sparse input; the writer refuses to produce it. That
//! asymmetry is the compatibility contract, so a written table always
//! reads back with the same schema.

use crate::error::{Error, Result};
use crate::table::Table;
use std::io::{self, Write};

/// Output form selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// One top-level JSON array of objects.
    Array,
    /// Newline-delimited JSON, one object per line.
    Lines,
}

/// Serialize a table into the chosen JSON form. The sink is flushed
/// before returning; sink errors are fatal to the call.
pub fn write_json<W: Write>(table: &Table, mut writer: W, format: JsonFormat) -> Result<()> {
    match format {
        JsonFormat::Array => {
            writer.write_all(b"[")?;
            for row in 0..table.num_rows() {
                if row > 0 {
                    writer.write_all(b",")?;
                }
                write_row(table, row, &mut writer)?;
            }
            writer.write_all(b"]\n")?;
        }
        JsonFormat::Lines => {
            for row in 0..table.num_rows() {
                write_row(table, row, &mut writer)?;
                writer.write_all(b"\n")?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Serialize a table to an owned string. Convenience wrapper over
/// [`write_json`].
pub fn write_json_string(table: &Table, format: JsonFormat) -> Result<String> {
    let mut buf = Vec::new();
    write_json(table, &mut buf, format)?;
    String::from_utf8(buf).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Write one row as a JSON object, keys in schema order, nulls explicit.
fn write_row<W: Write>(table: &Table, row: usize, writer: &mut W) -> Result<()> {
    writer.write_all(b"{")?;
    for (i, field) in table.schema().fields().iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut *writer, &field.name).map_err(to_io)?;
        writer.write_all(b":")?;
        serde_json::to_writer(&mut *writer, &table.column_at(i)[row]).map_err(to_io)?;
    }
    writer.write_all(b"}")?;
    Ok(())
}

fn to_io(e: serde_json::Error) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::{read_json_str, read_ndjson_str, NdjsonOptions};

    #[test]
    fn test_lines_output_is_dense() {
        // Second record lacks "b"; the writer must still emit it as null.
        let table = read_ndjson_str(
            "{\"a\":1,\"b\":\"x\"}\n{\"a\":2}\n",
            &NdjsonOptions::default(),
        )
        .unwrap()
        .table;

        let out = write_json_string(&table, JsonFormat::Lines).unwrap();
        assert_eq!(out, "{\"a\":1,\"b\":\"x\"}\n{\"a\":2,\"b\":null}\n");
    }

    #[test]
    fn test_array_output() {
        let table = read_json_str(r#"[{"a":1},{"a":2}]"#).unwrap();
        let out = write_json_string(&table, JsonFormat::Array).unwrap();
        assert_eq!(out, "[{\"a\":1},{\"a\":2}]\n");
    }

    #[test]
    fn test_empty_table_array_output() {
        let table = read_json_str("[]").unwrap();
        let out = write_json_string(&table, JsonFormat::Array).unwrap();
        assert_eq!(out, "[]\n");
    }

    #[test]
    fn test_null_written_as_literal() {
        let table = read_json_str(r#"[{"a":null}]"#).unwrap();
        let out = write_json_string(&table, JsonFormat::Lines).unwrap();
        assert_eq!(out, "{\"a\":null}\n");
    }

    #[test]
    fn test_keys_escaped() {
        let table = read_json_str(r#"[{"we\"ird":1}]"#).unwrap();
        let out = write_json_string(&table, JsonFormat::Lines).unwrap();
        assert_eq!(out, "{\"we\\\"ird\":1}\n");
    }

    #[test]
    fn test_round_trip_array() {
        let source = r#"[{"foo":1,"bar":null},{"foo":2,"bar":"bak"},{"foo":3,"bar":"baz"}]"#;
        let table = read_json_str(source).unwrap();
        let written = write_json_string(&table, JsonFormat::Array).unwrap();
        let back = read_json_str(&written).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_round_trip_lines_densifies_sparse_input() {
        let table = read_ndjson_str(
            "{\"a\":1,\"b\":\"x\"}\n{\"a\":2}\n",
            &NdjsonOptions::default(),
        )
        .unwrap()
        .table;

        let written = write_json_string(&table, JsonFormat::Lines).unwrap();
        let back = read_ndjson_str(&written, &NdjsonOptions::default())
            .unwrap()
            .table;

        // The absent key came back as an explicit null with the same
        // schema and values.
        assert_eq!(back, table);
        assert!(written.contains("\"b\":null"));
    }

    #[test]
    fn test_round_trip_mixed_column_stays_string() {
        let table = read_json_str(r#"[{"a":1},{"a":"x"}]"#).unwrap();
        let written = write_json_string(&table, JsonFormat::Array).unwrap();
        let back = read_json_str(&written).unwrap();
        assert_eq!(back, table);
    }
}
