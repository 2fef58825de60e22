#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use nested_csv_ingest::{
    StoreError,
    report::BucketMode,
    store::{AgeCounts, RecordStore, StorageRow},
};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// In-memory store that remembers every batch it was handed and can be told
/// to fail on a given call.
#[derive(Default)]
pub struct RecordingStore {
    pub batches: Vec<Vec<StorageRow>>,
    pub fail_on_call: Option<usize>,
    calls: usize,
}

impl RecordingStore {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(Vec::len).collect()
    }

    pub fn rows(&self) -> Vec<&StorageRow> {
        self.batches.iter().flatten().collect()
    }
}

impl RecordStore for RecordingStore {
    fn insert_rows(&mut self, rows: &[StorageRow]) -> Result<(), StoreError> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(StoreError::TooManyParameters {
                rows: rows.len(),
                params: 0,
                limit: 0,
            });
        }
        self.batches.push(rows.to_vec());
        Ok(())
    }

    fn age_counts(&self, _mode: BucketMode) -> Result<AgeCounts, StoreError> {
        Ok(AgeCounts {
            buckets: [0; 4],
            total: self.rows().len() as u64,
        })
    }
}

/// Builds a CSV document with the standard person header and `rows` rows.
pub fn people_csv(rows: usize) -> String {
    let mut csv = String::from("name.firstName,name.lastName,age,address.city\n");
    for idx in 0..rows {
        csv.push_str(&format!("First{idx},Last{idx},{},City{idx}\n", idx % 90));
    }
    csv
}
