//! Import settings from an optional YAML file and command-line overrides.
//!
//! A config file may set any of `database`, `batch_size`, `delimiter`,
//! `strict`, `buckets` and `input_encoding`. Values given on the command line
//! take precedence over the file; anything left unset falls back to the
//! defaults below.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use encoding_rs::Encoding;
use serde::{Deserialize, Deserializer, de};

use crate::{
    batch::DEFAULT_BATCH_SIZE,
    cli::parse_delimiter,
    error::ConfigError,
    io_utils::{self, DEFAULT_CSV_DELIMITER},
    report::BucketMode,
    store::MAX_BATCH_ROWS,
};

pub const DEFAULT_DATABASE: &str = "users.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: Option<PathBuf>,
    pub batch_size: Option<usize>,
    #[serde(deserialize_with = "deserialize_delimiter")]
    pub delimiter: Option<u8>,
    pub strict: Option<bool>,
    pub buckets: Option<BucketMode>,
    pub input_encoding: Option<String>,
}

fn deserialize_delimiter<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| parse_delimiter(&value).map_err(de::Error::custom))
        .transpose()
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Values set in `overrides` replace the ones in `self`.
    pub fn overlay(self, overrides: Settings) -> Settings {
        Settings {
            database: overrides.database.or(self.database),
            batch_size: overrides.batch_size.or(self.batch_size),
            delimiter: overrides.delimiter.or(self.delimiter),
            strict: overrides.strict.or(self.strict),
            buckets: overrides.buckets.or(self.buckets),
            input_encoding: overrides.input_encoding.or(self.input_encoding),
        }
    }

    pub fn database(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    pub fn bucket_mode(&self) -> BucketMode {
        self.buckets.unwrap_or_default()
    }

    pub fn ingest_options(&self) -> Result<IngestOptions, ConfigError> {
        let options = IngestOptions {
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            delimiter: self.delimiter.unwrap_or(DEFAULT_CSV_DELIMITER),
            strict: self.strict.unwrap_or(false),
            encoding: io_utils::resolve_encoding(self.input_encoding.as_deref())?,
        };
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub batch_size: usize,
    pub delimiter: u8,
    pub strict: bool,
    pub encoding: &'static Encoding,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: DEFAULT_CSV_DELIMITER,
            strict: false,
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl IngestOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Each batch is one statement, so it must fit SQLite's bind limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_ROWS {
            return Err(ConfigError::BatchSize {
                value: self.batch_size,
                max: MAX_BATCH_ROWS,
            });
        }
        Ok(())
    }
}
