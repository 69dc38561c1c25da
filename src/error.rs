use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the codec.
///
/// Line-delimited parse failures carry the 1-based line number and the
/// byte offset of the start of the offending line. Whole-document parse
/// failures reuse the same variant with serde's reported position.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed input at line {line}, byte offset {offset}: {reason}")]
    MalformedInput {
        line: usize,
        offset: u64,
        reason: String,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
