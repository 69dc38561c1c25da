//! jtab-convert: Convert between JSON arrays of objects and NDJSON
//!
//! Reads either form into a columnar table (inferring the column schema)
//! and writes it back out dense, with explicit nulls for absent keys.
//!
//! Usage:
//!   # JSON array file to NDJSON on stdout
//!   jtab-convert data.json
//!
//!   # NDJSON from stdin to a JSON array file
//!   cat events.jsonl | jtab-convert --ndjson --to json -o data.json
//!
//!   # Bounded-memory streaming conversion of a large NDJSON file,
//!   # dropping malformed lines instead of aborting
//!   jtab-convert --streaming --skip-bad-lines events.jsonl

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use jtab::{
    read_ndjson, write_json, BadLines, JsonFormat, NdjsonOptions, NdjsonScanner, Record,
    ScanOptions, SchemaBuilder, SkippedLine, Table, TableBuilder,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "jtab-convert")]
#[command(about = "Convert between JSON arrays of objects and NDJSON", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Input is newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Output format: "json" (array of objects) or "ndjson"
    #[arg(long, default_value = "ndjson")]
    to: String,

    /// Output file (use stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Drop malformed lines instead of aborting; the drop count is
    /// reported on stderr
    #[arg(long)]
    skip_bad_lines: bool,

    /// Stream the input in bounded-size batches instead of materializing
    /// it. Implies --ndjson and requires a file (stdin cannot be rewound)
    #[arg(long)]
    streaming: bool,

    /// Rows per batch in streaming mode (default: 8192)
    #[arg(long, requires = "streaming")]
    batch_rows: Option<usize>,

    /// Lines to sample for the schema in streaming mode (default: 100).
    /// Sampling is fast but may mis-infer a column a later line contradicts
    #[arg(long, requires = "streaming", conflicts_with = "full_infer")]
    infer_rows: Option<usize>,

    /// Infer the schema from a full first pass over the file instead of a
    /// prefix sample (exact, but reads the file twice)
    #[arg(long, requires = "streaming")]
    full_infer: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let format = match args.to.as_str() {
        "json" => JsonFormat::Array,
        "ndjson" => JsonFormat::Lines,
        other => bail!("unknown output format \"{}\" (expected json or ndjson)", other),
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    if args.streaming {
        convert_streaming(&args, format, &mut writer)
    } else {
        convert_materialized(&args, format, &mut writer)
    }
}

/// Stream the input file batch by batch without materializing the table.
fn convert_streaming(args: &Args, format: JsonFormat, writer: &mut Box<dyn Write>) -> Result<()> {
    let path = args
        .input
        .as_ref()
        .context("--streaming requires an input file (stdin cannot be rewound)")?;

    if format != JsonFormat::Lines {
        bail!("--streaming can only produce ndjson output");
    }

    let options = ScanOptions {
        batch_rows: args.batch_rows.unwrap_or(8192),
        infer_rows: if args.full_infer {
            None
        } else {
            Some(args.infer_rows.unwrap_or(100))
        },
        bad_lines: bad_line_policy(args),
        strict: false,
    };

    let mut scanner = NdjsonScanner::from_path(path, options)
        .with_context(|| format!("Failed to open {}", path))?;

    for batch in &mut scanner {
        let batch = batch?;
        write_json(&batch, &mut *writer, JsonFormat::Lines)?;
    }

    report_skipped(scanner.skipped());
    Ok(())
}

/// Read the whole input into a table, then write it out.
fn convert_materialized(
    args: &Args,
    format: JsonFormat,
    writer: &mut Box<dyn Write>,
) -> Result<()> {
    let mut content = Vec::new();
    match &args.input {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open {}", path))?
                .read_to_end(&mut content)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut content)?;
        }
    }

    let table = if args.ndjson {
        let options = NdjsonOptions {
            bad_lines: bad_line_policy(args),
            strict: false,
        };
        let out = read_ndjson(&content[..], &options)?;
        report_skipped(&out.skipped);
        out.table
    } else {
        read_array_table(&content)?
    };

    write_json(&table, &mut *writer, format)?;
    Ok(())
}

/// Parse a whole-document JSON array with simd-json for speed, falling
/// back to serde_json when SIMD parsing rejects the buffer.
fn read_array_table(content: &[u8]) -> Result<Table> {
    // simd-json parses in place, so give it a scratch copy
    let mut scratch = content.to_vec();

    let items = match simd_json::to_owned_value(&mut scratch) {
        Ok(simd_json::OwnedValue::Array(items)) => items,
        Ok(_) => bail!("expected a top-level JSON array of objects"),
        Err(_) => {
            let text = String::from_utf8_lossy(content);
            return Ok(jtab::read_json_str(&text)?);
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        // Convert simd_json value to serde_json::Value
        let json_str = simd_json::to_string(&item)?;
        let value: Value = serde_json::from_str(&json_str)?;
        match value {
            Value::Object(obj) => records.push(Record::from_object(obj)?),
            other => bail!("array element is not an object: {}", other),
        }
    }

    let mut inferencer = SchemaBuilder::new();
    for record in &records {
        inferencer.add_record(record);
    }

    let mut builder = TableBuilder::new(inferencer.build(), false);
    for record in &records {
        builder.append_record(record)?;
    }
    Ok(builder.finish())
}

fn bad_line_policy(args: &Args) -> BadLines {
    if args.skip_bad_lines {
        BadLines::Skip
    } else {
        BadLines::Fail
    }
}

fn report_skipped(skipped: &[SkippedLine]) {
    if skipped.is_empty() {
        return;
    }
    eprintln!("Warning: skipped {} malformed line(s):", skipped.len());
    for s in skipped.iter().take(10) {
        eprintln!("  line {} (byte {}): {}", s.line, s.offset, s.reason);
    }
    if skipped.len() > 10 {
        eprintln!("  ... and {} more", skipped.len() - 10);
    }
}
