//! Input handling: encoding resolution, stream opening, and line decoding.
//!
//! Lines are split on a single delimiter byte with no quoting or escaping, so
//! a value that contains the delimiter cannot be represented and quote
//! characters are ordinary data. The streaming [`LineDecoder`] uses a
//! `csv::Reader` with quoting disabled and flexible record lengths, which gives
//! exactly that split-on-delimiter behaviour while handling CR, LF and CRLF
//! terminators. Every token is trimmed.
//!
//! The `-` path convention routes input through stdin.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result};
use csv::ByteRecord;
use encoding_rs::{Encoding, UTF_8};

use crate::error::{ConfigError, IngestError};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, ConfigError> {
    if let Some(value) = label {
        let encoding = Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| ConfigError::Encoding(value.to_string()))?;
        // Lines are split on a single delimiter byte before decoding.
        if !encoding.is_ascii_compatible() {
            return Err(ConfigError::IncompatibleEncoding(encoding.name()));
        }
        Ok(encoding)
    } else {
        Ok(UTF_8)
    }
}

pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(reader)
}

/// Splits a single line into trimmed tokens.
#[cfg(test)]
pub fn decode_line(line: &str, delimiter: u8) -> Vec<String> {
    line.split(delimiter as char)
        .map(|token| token.trim().to_string())
        .collect()
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

pub fn decode_record(record: &ByteRecord, encoding: &'static Encoding) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding).map(|text| text.trim().to_string()))
        .collect()
}

/// A whitespace-only line decodes to a single empty token.
pub fn is_blank(tokens: &[String]) -> bool {
    tokens.len() <= 1 && tokens.iter().all(|token| token.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    /// 1-based physical line number in the input.
    pub line: u64,
    pub tokens: Vec<String>,
}

/// Streams non-blank lines from a reader as trimmed tokens.
pub struct LineDecoder<R: Read> {
    reader: csv::Reader<R>,
    record: ByteRecord,
    encoding: &'static Encoding,
}

impl<R: Read> LineDecoder<R> {
    pub fn new(reader: R, delimiter: u8, encoding: &'static Encoding) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);
        Self {
            reader,
            record: ByteRecord::new(),
            encoding,
        }
    }

    fn read_next(&mut self) -> Result<Option<DecodedLine>, IngestError> {
        loop {
            if !self.reader.read_byte_record(&mut self.record)? {
                return Ok(None);
            }
            let line = self
                .record
                .position()
                .map(|pos| pos.line())
                .unwrap_or_default();
            let mut tokens =
                decode_record(&self.record, self.encoding).ok_or(IngestError::Decode {
                    line,
                    encoding: self.encoding.name(),
                })?;
            if line == 1
                && let Some(first) = tokens.first_mut()
                && let Some(stripped) = first.strip_prefix('\u{feff}')
            {
                *first = stripped.trim_start().to_string();
            }
            if is_blank(&tokens) {
                continue;
            }
            return Ok(Some(DecodedLine { line, tokens }));
        }
    }
}

impl<R: Read> Iterator for LineDecoder<R> {
    type Item = Result<DecodedLine, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
