//! # jtab - Tabular JSON Codec
//!
//! Reads JSON (a single top-level array of objects) and newline-delimited
//! JSON into an in-memory columnar [`Table`], infers a unified column
//! schema with explicit type widening, writes tables back out in either
//! form, and lazily scans NDJSON sources as bounded batches.
//!
//! ## Modules
//!
//! - **read** / **write**: whole-document and line-delimited reads, dense
//!   JSON output
//! - **schema**: streaming schema inference with string format detection
//! - **scan**: lazy batch iterator over NDJSON sources
//!
//! ## Quick Start
//!
//! ### Reading and writing
//!
//! ```rust
//! use jtab::{read_json_str, write_json_string, JsonFormat};
//!
//! # fn main() -> jtab::Result<()> {
//! let table = read_json_str(r#"[{"foo":1,"bar":null},{"foo":2,"bar":"bak"}]"#)?;
//! assert_eq!(table.num_rows(), 2);
//!
//! // Output is dense: nulls are written explicitly, never omitted.
//! let ndjson = write_json_string(&table, JsonFormat::Lines)?;
//! assert_eq!(ndjson, "{\"bar\":null,\"foo\":1}\n{\"bar\":\"bak\",\"foo\":2}\n");
//! # Ok(())
//! # }
//! ```
//!
//! ### Streaming scan
//!
//! ```rust
//! use jtab::{NdjsonScanner, ScanOptions};
//! use std::io::Cursor;
//!
//! # fn main() -> jtab::Result<()> {
//! let source = Cursor::new("{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n".as_bytes());
//! let options = ScanOptions { batch_rows: 2, ..Default::default() };
//! let mut scanner = NdjsonScanner::new(source, options)?;
//!
//! let mut rows = 0;
//! for batch in &mut scanner {
//!     rows += batch?.num_rows();
//! }
//! assert_eq!(rows, 3);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub mod error;
pub mod read;
pub mod record;
pub mod scan;
pub mod schema;
pub mod table;
pub mod value;
pub mod write;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use read::{
    read_json, read_json_str, read_ndjson, read_ndjson_str, read_ndjson_with_schema, BadLines,
    NdjsonOptions, NdjsonRead, SkippedLine,
};
pub use record::Record;
pub use scan::{Batch, NdjsonScanner, ScanOptions};
pub use schema::{Field, Schema, SchemaBuilder};
pub use table::{Table, TableBuilder};
pub use value::{DataType, Scalar};
pub use write::{write_json, write_json_string, JsonFormat};

/// Read a whole-document JSON file into a table.
pub fn read_json_path<P: AsRef<Path>>(path: P) -> Result<Table> {
    read_json(BufReader::new(File::open(path)?))
}

/// Read an NDJSON file into a table.
pub fn read_ndjson_path<P: AsRef<Path>>(path: P, options: &NdjsonOptions) -> Result<NdjsonRead> {
    read_ndjson(BufReader::new(File::open(path)?), options)
}

/// Write a table to a file in the chosen JSON form.
pub fn write_json_path<P: AsRef<Path>>(table: &Table, path: P, format: JsonFormat) -> Result<()> {
    write_json(table, BufWriter::new(File::create(path)?), format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_then_write_round_trip() {
        let source = r#"[{"foo":1,"bar":null},{"foo":2,"bar":"bak"},{"foo":3,"bar":"baz"}]"#;
        let table = read_json_str(source).unwrap();

        let written = write_json_string(&table, JsonFormat::Array).unwrap();
        let reread = read_json_str(&written).unwrap();
        assert_eq!(reread, table);
    }
}
