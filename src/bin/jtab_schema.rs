//! jtab-schema: Infer the column schema of JSON or NDJSON input
//!
//! Prints the unified column schema a read would produce: field names,
//! widened types, nullability, and detected string formats.
//!
//! Usage:
//!   # Read a JSON array from a file, output to stdout
//!   jtab-schema data.json
//!
//!   # Read NDJSON from stdin with compact output
//!   cat events.jsonl | jtab-schema --ndjson --compact

use anyhow::{bail, Context, Result};
use clap::Parser;
use jtab::{Record, SchemaBuilder};
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Read};

#[derive(Parser, Debug)]
#[command(name = "jtab-schema")]
#[command(about = "Infer the column schema of JSON or NDJSON input", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Skip lines that fail to parse instead of aborting
    #[arg(long)]
    skip_bad_lines: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(BufReader::new(stdin())),
    };

    let mut builder = SchemaBuilder::new();
    let mut skipped = 0usize;

    if args.ndjson {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            match parse_object(text) {
                Ok(record) => builder.add_record(&record),
                Err(e) if args.skip_bad_lines => {
                    skipped += 1;
                    eprintln!("Warning: skipped line {}: {}", i + 1, e);
                }
                Err(e) => return Err(e.context(format!("line {}", i + 1))),
            }
        }
    } else {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let value: Value =
            serde_json::from_str(&content).context("Failed to parse JSON document")?;
        let Value::Array(items) = value else {
            bail!("expected a top-level JSON array of objects (use --ndjson for line-delimited input)");
        };
        for item in items {
            match item {
                Value::Object(obj) => builder.add_record(&Record::from_object(obj)?),
                other => bail!("array element is not an object: {}", other),
            }
        }
    }

    if builder.record_count() == 0 {
        eprintln!("Warning: No JSON objects found in input");
    }
    if skipped > 0 {
        eprintln!("Warning: skipped {} malformed line(s)", skipped);
    }

    let schema = builder.build();
    let output = if args.compact {
        serde_json::to_string(&schema.to_json())?
    } else {
        serde_json::to_string_pretty(&schema.to_json())?
    };

    println!("{}", output);

    Ok(())
}

fn parse_object(text: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Object(obj) => Ok(Record::from_object(obj)?),
        other => bail!("expected a JSON object, got {}", other),
    }
}
