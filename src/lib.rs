pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod header;
pub mod ingest;
pub mod io_utils;
pub mod record;
pub mod report;
pub mod store;
pub mod table;
pub mod writer;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, IngestArgs, ReportArgs},
    config::Settings,
    report::{AggregationReporter, BucketMode, render_report},
    store::SqliteStore,
};

pub use crate::{
    config::IngestOptions,
    error::{IngestError, StoreError},
    ingest::{ingest, ingest_path},
    record::{Address, ParsedRecord, RawRecord, RecordBuilder},
    report::DistributionReport,
    store::RecordStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("nested_csv_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => handle_ingest(&args),
        Commands::Report(args) => handle_report(&args),
    }
}

fn load_settings(config: Option<&std::path::Path>, overrides: Settings) -> Result<Settings> {
    let file = match config {
        Some(path) => {
            Settings::load(path).with_context(|| format!("Loading config from {path:?}"))?
        }
        None => Settings::default(),
    };
    Ok(file.overlay(overrides))
}

fn open_store(settings: &Settings) -> Result<SqliteStore> {
    let path = settings.database();
    SqliteStore::open(&path).with_context(|| format!("Opening database {path:?}"))
}

fn handle_ingest(args: &IngestArgs) -> Result<()> {
    let settings = load_settings(args.store.config.as_deref(), args.overrides())?;
    let options = settings.ingest_options().context("Resolving import settings")?;
    let mut store = open_store(&settings)?;
    let total = ingest_path(&args.input, &mut store, &options)?;
    println!("Processed {total} record(s)");
    if args.report {
        print_report(&store, settings.bucket_mode())?;
    }
    Ok(())
}

fn handle_report(args: &ReportArgs) -> Result<()> {
    let settings = load_settings(args.store.config.as_deref(), args.overrides())?;
    let store = open_store(&settings)?;
    print_report(&store, settings.bucket_mode())
}

fn print_report(store: &SqliteStore, mode: BucketMode) -> Result<()> {
    let reporter = AggregationReporter::new(store, mode);
    match reporter.report().context("Computing age distribution")? {
        Some(report) => {
            println!("Age Distribution Report:");
            print!("{}", render_report(&report));
            info!("Reported on {} record(s)", report.total);
        }
        None => println!("No records found."),
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
