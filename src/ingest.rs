//! Streaming import: decode → build → accumulate → write.
//!
//! The whole import runs on the calling thread. A full batch is written
//! before the next line is read, so at most one write is ever in flight.
//! There is no transaction around the import: when batch N fails, batches
//! 1..N-1 remain committed and the error reports how many records that was.
//! Re-running a failed import duplicates the committed rows.

use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    batch::BatchAccumulator,
    config::IngestOptions,
    error::IngestError,
    header::HeaderSchema,
    io_utils::{self, LineDecoder},
    record::RecordBuilder,
    store::RecordStore,
    writer::BatchWriter,
};

/// Imports every data row of `reader` into `store`, returning the number of
/// records persisted. The first non-blank line is the header; blank lines
/// are skipped and not counted.
pub fn ingest<R, S>(reader: R, store: S, options: &IngestOptions) -> Result<u64, IngestError>
where
    R: Read,
    S: RecordStore,
{
    let mut lines = LineDecoder::new(reader, options.delimiter, options.encoding);
    let Some(header_line) = lines.next().transpose()? else {
        info!("Input has no header line; nothing to import");
        return Ok(0);
    };
    let header = HeaderSchema::from_tokens(&header_line.tokens);
    debug!("Header paths: {:?}", header.names());

    let builder = RecordBuilder::new(header, options.strict);
    let mut accumulator = BatchAccumulator::new(options.batch_size);
    let mut writer = BatchWriter::new(store);
    let mut mismatched_rows = 0u64;

    for decoded in lines {
        let decoded = decoded?;
        let record = builder
            .build(&decoded.tokens)
            .map_err(|source| IngestError::Row {
                line: decoded.line,
                source,
            })?;
        if decoded.tokens.len() != builder.header().len() {
            if mismatched_rows == 0 {
                warn!(
                    "Line {} has {} field(s) but the header has {}; continuing",
                    decoded.line,
                    decoded.tokens.len(),
                    builder.header().len()
                );
            }
            mismatched_rows += 1;
        }
        accumulator.push(record);
        if accumulator.should_flush() {
            flush(&mut writer, &mut accumulator)?;
        }
    }

    if !accumulator.is_empty() {
        flush(&mut writer, &mut accumulator)?;
    }
    if mismatched_rows > 0 {
        warn!("{mismatched_rows} row(s) did not match the header field count");
    }
    Ok(writer.processed())
}

fn flush<S: RecordStore>(
    writer: &mut BatchWriter<S>,
    accumulator: &mut BatchAccumulator,
) -> Result<(), IngestError> {
    let batch = accumulator.drain_all();
    writer
        .write(&batch)
        .map_err(|source| IngestError::Persist {
            batch: writer.batches() + 1,
            committed: writer.processed(),
            source,
        })
}

/// Opens `path` (or stdin for `-`) and runs [`ingest`] over it.
pub fn ingest_path<S: RecordStore>(path: &Path, store: S, options: &IngestOptions) -> Result<u64> {
    info!(
        "Importing '{}' (delimiter '{}', batch size {}{})",
        path.display(),
        crate::printable_delimiter(options.delimiter),
        options.batch_size,
        if options.strict { ", strict" } else { "" }
    );
    let reader = io_utils::open_input(path)?;
    let total = ingest(reader, store, options).with_context(|| format!("Importing {path:?}"))?;
    info!("Imported {total} record(s) from {path:?}");
    Ok(total)
}
