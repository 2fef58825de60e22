use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::Settings, report::BucketMode};

#[derive(Debug, Parser)]
#[command(author, version, about = "Import nested CSV records into SQLite and report on them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import a CSV file whose headers use dotted paths such as `name.firstName`
    Ingest(IngestArgs),
    /// Print the age distribution of the stored records
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// SQLite database file (defaults to users.db)
    #[arg(long = "db")]
    pub database: Option<PathBuf>,
    /// YAML config file with default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Age bucket boundaries used for the report
    #[arg(long, value_enum)]
    pub buckets: Option<BucketMode>,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Input CSV file (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Number of records written per INSERT statement
    #[arg(long = "batch-size")]
    pub batch_size: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Reject rows whose field count differs from the header or whose age is not an integer
    #[arg(long)]
    pub strict: bool,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the age distribution after the import finishes
    #[arg(long)]
    pub report: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

impl StoreArgs {
    fn overrides(&self) -> Settings {
        Settings {
            database: self.database.clone(),
            buckets: self.buckets,
            ..Settings::default()
        }
    }
}

impl IngestArgs {
    pub fn overrides(&self) -> Settings {
        Settings {
            batch_size: self.batch_size,
            delimiter: self.delimiter,
            strict: self.strict.then_some(true),
            input_encoding: self.input_encoding.clone(),
            ..self.store.overrides()
        }
    }
}

impl ReportArgs {
    pub fn overrides(&self) -> Settings {
        self.store.overrides()
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            match first {
                '.' => {
                    return Err(
                        "Delimiter cannot be '.', which separates header path segments".to_string(),
                    );
                }
                '\n' | '\r' => return Err("Delimiter cannot be a line terminator".to_string()),
                '"' => return Err("Delimiter cannot be a double quote".to_string()),
                _ => {}
            }
            Ok(first as u8)
        }
    }
}
