//! Error types shared by the import pipeline and the storage layer.
//!
//! Shape problems in the input (short rows, non-numeric ages) are not errors
//! unless strict mode is enabled; see [`RowError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode column payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("batch of {rows} row(s) needs {params} bind parameters (limit {limit})")]
    TooManyParameters {
        rows: usize,
        params: usize,
        limit: usize,
    },
}

/// Row rejections raised only when strict mode is on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("expected {expected} field(s) but found {found}")]
    Arity { expected: usize, found: usize },
    #[error("age '{0}' is not an integer")]
    InvalidAge(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read input: {0}")]
    Read(#[from] csv::Error),
    #[error("line {line}: text is not valid {encoding}")]
    Decode { line: u64, encoding: &'static str },
    #[error("line {line} was rejected")]
    Row {
        line: u64,
        #[source]
        source: RowError,
    },
    #[error("writing batch {batch} failed after {committed} record(s) were committed")]
    Persist {
        batch: usize,
        committed: u64,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("batch size must be between 1 and {max}, got {value}")]
    BatchSize { value: usize, max: usize },
    #[error("unknown encoding '{0}'")]
    Encoding(String),
    #[error("encoding '{0}' is not ASCII-compatible and cannot be split on a delimiter byte")]
    IncompatibleEncoding(&'static str),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}
