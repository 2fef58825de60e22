//! Relational storage for imported records.
//!
//! [`RecordStore`] is the capability the writer and reporter are built on;
//! [`SqliteStore`] is the production implementation. Every batch goes out as
//! a single multi-row `INSERT` with four positional parameters per row, so a
//! batch is either stored completely or not at all. Nothing spans batches.

use std::path::Path;

use itertools::Itertools;
use log::debug;
use rusqlite::{Connection, ToSql, params_from_iter};

use crate::{error::StoreError, report::BucketMode};

pub const TABLE_NAME: &str = "users";
pub const COLUMNS_PER_ROW: usize = 4;
/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER`.
pub const MAX_BIND_PARAMETERS: usize = 32_766;
pub const MAX_BATCH_ROWS: usize = MAX_BIND_PARAMETERS / COLUMNS_PER_ROW;

/// One persisted row. `address` and `additional_info` hold JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRow {
    pub name: String,
    pub age: Option<i64>,
    pub address: String,
    pub additional_info: String,
}

/// Bucket counts in report order plus the number of rows overall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeCounts {
    pub buckets: [u64; 4],
    pub total: u64,
}

pub trait RecordStore {
    /// Persists all rows in one statement, or none of them.
    fn insert_rows(&mut self, rows: &[StorageRow]) -> Result<(), StoreError>;

    fn age_counts(&self, mode: BucketMode) -> Result<AgeCounts, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn insert_rows(&mut self, rows: &[StorageRow]) -> Result<(), StoreError> {
        (**self).insert_rows(rows)
    }

    fn age_counts(&self, mode: BucketMode) -> Result<AgeCounts, StoreError> {
        (**self).age_counts(mode)
    }
}

pub fn insert_statement(rows: usize) -> String {
    let placeholders = (0..rows)
        .map(|idx| {
            let base = idx * COLUMNS_PER_ROW;
            format!("(?{}, ?{}, ?{}, ?{})", base + 1, base + 2, base + 3, base + 4)
        })
        .join(", ");
    format!("INSERT INTO {TABLE_NAME} (name, age, address, additional_info) VALUES {placeholders}")
}

pub fn age_counts_statement(mode: BucketMode) -> String {
    let sums = mode
        .predicates()
        .iter()
        .map(|predicate| format!("COALESCE(SUM(CASE WHEN {predicate} THEN 1 ELSE 0 END), 0)"))
        .join(", ");
    format!("SELECT {sums}, COUNT(*) FROM {TABLE_NAME}")
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER,
                address TEXT NOT NULL,
                additional_info TEXT NOT NULL
            );"
        ))?;
        Ok(Self { conn })
    }

    pub fn row_count(&self) -> Result<u64, StoreError> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> Result<Vec<StorageRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT name, age, address, additional_info FROM {TABLE_NAME} ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StorageRow {
                    name: row.get(0)?,
                    age: row.get(1)?,
                    address: row.get(2)?,
                    additional_info: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl RecordStore for SqliteStore {
    fn insert_rows(&mut self, rows: &[StorageRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let params = rows.len() * COLUMNS_PER_ROW;
        if params > MAX_BIND_PARAMETERS {
            return Err(StoreError::TooManyParameters {
                rows: rows.len(),
                params,
                limit: MAX_BIND_PARAMETERS,
            });
        }
        let sql = insert_statement(rows.len());
        debug!("Inserting {} row(s) with {params} bind parameter(s)", rows.len());
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let values = rows.iter().flat_map(|row| {
            [
                &row.name as &dyn ToSql,
                &row.age as &dyn ToSql,
                &row.address as &dyn ToSql,
                &row.additional_info as &dyn ToSql,
            ]
        });
        stmt.execute(params_from_iter(values))?;
        Ok(())
    }

    fn age_counts(&self, mode: BucketMode) -> Result<AgeCounts, StoreError> {
        let sql = age_counts_statement(mode);
        let counts = self.conn.query_row(&sql, [], |row| {
            Ok(AgeCounts {
                buckets: [row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?],
                total: row.get(4)?,
            })
        })?;
        Ok(counts)
    }
}
