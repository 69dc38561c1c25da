//! Lazy, bounded-memory scanning of newline-delimited sources.
//!
//! The scanner is an explicit iterator of batches: each `next()` call
//! reads up to `batch_rows` lines, builds a table fragment, and hands it
//! off. Nothing is retained between batches, and the only suspension
//! points are between batches in the caller's loop. Dropping the iterator
//! is the cancellation primitive.
//!
//! The schema comes either from a prefix sample (`infer_rows: Some(n)`,
//! fast but it may mis-infer a column a later line contradicts) or from a
//! full first pass over the source (`infer_rows: None`, correct, two
//! passes). The source must be seekable so it can be rewound after the
//! inference pass.

use crate::error::Result;
use crate::read::{BadLines, SkippedLine};
use crate::record::parse_line;
use crate::schema::{Schema, SchemaBuilder};
use crate::table::{Table, TableBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// A bounded table fragment produced by the scanner.
pub type Batch = Table;

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum rows per yielded batch.
    pub batch_rows: usize,
    /// `Some(n)`: infer the schema from the first `n` parsable lines.
    /// `None`: infer from a full first pass over the source. `Some(0)`
    /// would discard every line against an empty schema, so it is treated
    /// as `None`.
    pub infer_rows: Option<usize>,
    pub bad_lines: BadLines,
    /// Fail on record keys the inferred schema does not know (can only
    /// happen with prefix sampling).
    pub strict: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            batch_rows: 8192,
            infer_rows: Some(100),
            bad_lines: BadLines::Fail,
            strict: false,
        }
    }
}

/// Lazy iterator of [`Batch`]es over an NDJSON source.
///
/// Forward-only and finite; restart by constructing a new scanner from
/// the source. Lines dropped under [`BadLines::Skip`] are recorded and
/// queryable via [`skipped`](Self::skipped) at any point.
#[derive(Debug)]
pub struct NdjsonScanner<R: BufRead + Seek> {
    reader: R,
    options: ScanOptions,
    schema: Schema,
    line_no: usize,
    offset: u64,
    done: bool,
    skipped: Vec<SkippedLine>,
}

impl NdjsonScanner<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P, options: ScanOptions) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        NdjsonScanner::new(reader, options)
    }
}

impl<R: BufRead + Seek> NdjsonScanner<R> {
    /// Run the inference pass, rewind the source, and return a scanner
    /// positioned at the first batch.
    pub fn new(mut reader: R, mut options: ScanOptions) -> Result<Self> {
        if options.infer_rows == Some(0) {
            options.infer_rows = None;
        }
        let schema = infer_pass(&mut reader, &options)?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(NdjsonScanner {
            reader,
            options,
            schema,
            line_no: 0,
            offset: 0,
            done: false,
            skipped: Vec::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Lines dropped so far under [`BadLines::Skip`].
    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    fn next_batch(&mut self) -> Result<Option<Batch>> {
        let mut builder = TableBuilder::new(self.schema.clone(), self.options.strict);
        let mut buf = String::new();
        let mut saw_eof = false;

        while builder.num_rows() < self.options.batch_rows {
            buf.clear();
            let n = self.reader.read_line(&mut buf)?;
            if n == 0 {
                saw_eof = true;
                break;
            }
            self.line_no += 1;
            let start = self.offset;
            self.offset += n as u64;

            let text = buf.trim();
            if text.is_empty() {
                continue;
            }

            // A line can fail at parse time or, with a sampled schema, at
            // append time; both follow the bad-line policy.
            let outcome = parse_line(text, self.line_no, start)
                .and_then(|record| builder.append_record(&record));
            if let Err(e) = outcome {
                match self.options.bad_lines {
                    BadLines::Fail => {
                        self.done = true;
                        return Err(e);
                    }
                    BadLines::Skip => self.skipped.push(SkippedLine {
                        line: self.line_no,
                        offset: start,
                        reason: e.to_string(),
                    }),
                }
            }
        }

        if saw_eof {
            self.done = true;
            if builder.num_rows() == 0 {
                return Ok(None);
            }
        }
        Ok(Some(builder.finish()))
    }
}

impl<R: BufRead + Seek> Iterator for NdjsonScanner<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.next_batch().transpose()
    }
}

/// First pass: infer the schema from the sample prefix (or everything).
/// Bad lines are ignored here under `Skip`; they get reported when the
/// batch pass actually meets them.
fn infer_pass<R: BufRead>(reader: &mut R, options: &ScanOptions) -> Result<Schema> {
    let mut inferencer = SchemaBuilder::new();
    let mut buf = String::new();
    let mut line_no = 0usize;
    let mut offset = 0u64;

    loop {
        if let Some(limit) = options.infer_rows {
            if inferencer.record_count() >= limit {
                break;
            }
        }
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let start = offset;
        offset += n as u64;

        let text = buf.trim();
        if text.is_empty() {
            continue;
        }

        match parse_line(text, line_no, start) {
            Ok(record) => inferencer.add_record(&record),
            Err(e) => match options.bad_lines {
                BadLines::Fail => return Err(e),
                BadLines::Skip => {}
            },
        }
    }

    Ok(inferencer.build())
}
