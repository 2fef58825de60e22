//! Batch persistence: records are mapped to [`StorageRow`]s and handed to the
//! store as one multi-row write.

use log::info;

use crate::{
    error::StoreError,
    record::ParsedRecord,
    store::{RecordStore, StorageRow},
};

impl StorageRow {
    pub fn from_record(record: &ParsedRecord) -> Result<Self, StoreError> {
        Ok(Self {
            name: record.name.clone(),
            age: record.age,
            address: serde_json::to_string(&record.address)?,
            additional_info: serde_json::to_string(&record.additional_info)?,
        })
    }
}

pub struct BatchWriter<S> {
    store: S,
    processed: u64,
    batches: usize,
}

impl<S: RecordStore> BatchWriter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            processed: 0,
            batches: 0,
        }
    }

    /// Records persisted by successful writes so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of successful non-empty writes.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn write(&mut self, batch: &[ParsedRecord]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let rows = batch
            .iter()
            .map(StorageRow::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        self.store.insert_rows(&rows)?;
        self.processed += batch.len() as u64;
        self.batches += 1;
        info!("Total records processed: {}", self.processed);
        Ok(())
    }
}
