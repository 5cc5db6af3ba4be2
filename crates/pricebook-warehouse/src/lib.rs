//! # Pricebook Warehouse
//!
//! DuckDB-backed record store for daily equity price/volume observations.
//!
//! ## Overview
//!
//! - **Record store**: one row per `(symbol, date)` in `financial_data`
//! - **Idempotent ingestion**: `INSERT OR IGNORE`, the first stored value wins
//! - **Filter compiler**: optional date range and symbol compiled to bound clauses
//! - **Paginated queries**: consistent count and page, ordered by date
//! - **Statistics**: per-symbol averages with a zero default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pricebook_warehouse::{RecordFilter, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!
//!     let filter = RecordFilter::default()
//!         .with_symbol("ibm")
//!         .with_start_date("2024-01-01")
//!         .with_limit(10);
//!     let page = warehouse.query_records(&filter)?;
//!     println!("{} of {} rows", page.records.len(), page.pagination.count);
//!
//!     warehouse.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! Every caller-supplied value is bound as a positional parameter. Only column
//! names and operators from closed enums are rendered into SQL text.
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `financial_data` | Daily open/close/volume by symbol and date |
//! | `ingest_log` | One row per symbol ingestion attempt |
//! | `schema_migrations` | Applied schema versions |

pub mod duckdb;
pub mod filter;
pub mod migrations;
pub mod query;
pub mod statistics;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ::duckdb::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use filter::{compile, Clause, Column, Comparison, Predicate, RecordFilter};
pub use migrations::RECORDS_TABLE;
pub use query::{total_pages, Pagination, RecordPage};
pub use statistics::SymbolAverages;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The warehouse was closed and can no longer hand out connections.
    #[error("warehouse is closed")]
    Closed,
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    /// Root directory for pricebook data.
    pub pricebook_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::for_home(resolve_pricebook_home())
    }
}

impl WarehouseConfig {
    /// Default layout under a given home directory.
    pub fn for_home(pricebook_home: impl Into<PathBuf>) -> Self {
        let pricebook_home = pricebook_home.into();
        let db_path = pricebook_home.join("data").join("financial_data.duckdb");
        Self {
            pricebook_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// One daily observation as stored.
///
/// Prices and volume keep the provider's exact text; they are converted to
/// numbers only when aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub symbol: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub open_price: String,
    pub close_price: String,
    pub volume: String,
}

impl DailyRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, ::duckdb::Error> {
        Ok(Self {
            symbol: row.get(0)?,
            date: row.get(1)?,
            open_price: row.get(2)?,
            close_price: row.get(3)?,
            volume: row.get(4)?,
        })
    }
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Rows handed to the warehouse.
    pub received: usize,
    /// Rows that did not exist yet and were stored.
    pub inserted: usize,
}

/// Column metadata for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlColumn {
    /// Column name.
    pub name: String,
    /// Column data type.
    #[serde(rename = "type")]
    pub r#type: String,
}

/// The record store shared by queries, statistics and ingestion.
///
/// Writes from all clones go through one writer lock. `DuckDB` rejects
/// uncommitted inserts of the same key from two transactions at commit time.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
    writer: Arc<Mutex<()>>,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration and apply the schema.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path, config.max_pool_size)?;
        let warehouse = Self {
            manager,
            writer: Arc::new(Mutex::new(())),
        };
        warehouse.initialize()?;
        tracing::info!(db_path = %warehouse.db_path().display(), "warehouse opened");
        Ok(warehouse)
    }

    /// Initialize the database schema.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Release every pooled connection and the database handle.
    ///
    /// Clones of this warehouse share the pool and are closed as well.
    pub fn close(&self) {
        self.manager.close();
        tracing::info!(db_path = %self.db_path().display(), "warehouse closed");
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store daily records, skipping any `(symbol, date)` already present.
    ///
    /// Existing rows are never overwritten, even when the provider later
    /// reports different values for the same date. All rows plus one
    /// `ingest_log` entry are written in a single transaction, and concurrent
    /// calls overlapping on the same keys each succeed.
    ///
    /// # Security
    /// All values are passed as query parameters.
    pub fn ingest_daily_records(
        &self,
        source: &str,
        request_id: &str,
        symbol: &str,
        rows: &[DailyRecord],
    ) -> Result<IngestSummary, WarehouseError> {
        let _writer = self.write_lock();
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<IngestSummary, WarehouseError> {
            let mut inserted = 0;
            for row in rows {
                inserted += connection.execute(
                    "INSERT OR IGNORE INTO financial_data \
                     (symbol, date, open_price, close_price, volume) \
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        row.symbol,
                        row.date,
                        row.open_price,
                        row.close_price,
                        row.volume
                    ],
                )?;
            }

            let summary = IngestSummary {
                received: rows.len(),
                inserted,
            };
            log_ingest(
                &connection,
                request_id,
                symbol,
                source,
                "ok",
                Some(summary),
                None,
            )?;
            Ok(summary)
        })();

        finalize_transaction(&connection, result)
    }

    /// Record a symbol whose ingestion failed before reaching the store.
    pub fn record_ingest_failure(
        &self,
        source: &str,
        request_id: &str,
        symbol: &str,
        detail: &str,
    ) -> Result<(), WarehouseError> {
        let _writer = self.write_lock();
        let connection = self.manager.acquire()?;
        log_ingest(
            &connection,
            request_id,
            symbol,
            source,
            "error",
            None,
            Some(detail),
        )
    }

    /// Column names and types of the records table, in declaration order.
    pub fn describe_records_table(&self) -> Result<Vec<SqlColumn>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        )?;
        let rows = statement.query_map(params![RECORDS_TABLE], |row| {
            Ok(SqlColumn {
                name: row.get(0)?,
                r#type: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WarehouseError::from)
    }

    /// Total number of stored records.
    pub fn record_count(&self) -> Result<u64, WarehouseError> {
        let connection = self.manager.acquire()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM financial_data", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn log_ingest(
    connection: &Connection,
    request_id: &str,
    symbol: &str,
    source: &str,
    status: &str,
    summary: Option<IngestSummary>,
    detail: Option<&str>,
) -> Result<(), WarehouseError> {
    let received = summary.map(|summary| summary.received as i64);
    let inserted = summary.map(|summary| summary.inserted as i64);
    connection.execute(
        "INSERT INTO ingest_log \
         (request_id, symbol, source, status, received, inserted, detail, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
        params![request_id, symbol, source, status, received, inserted, detail],
    )?;
    Ok(())
}

/// Finalize a transaction, committing on success or rolling back on failure.
pub(crate) fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the pricebook home directory from environment or default.
fn resolve_pricebook_home() -> PathBuf {
    if let Some(path) = env::var_os("PRICEBOOK_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".pricebook");
    }

    PathBuf::from(".pricebook")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp(temp: &tempfile::TempDir) -> Warehouse {
        Warehouse::open(WarehouseConfig::for_home(temp.path())).expect("warehouse open")
    }

    fn record(symbol: &str, date: &str, open: &str) -> DailyRecord {
        DailyRecord {
            symbol: symbol.to_string(),
            date: date.to_string(),
            open_price: open.to_string(),
            close_price: "101.0000".to_string(),
            volume: "1200".to_string(),
        }
    }

    #[test]
    fn initializes_records_table() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp(&temp);

        let columns = warehouse.describe_records_table().expect("describe");
        let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            ["symbol", "date", "open_price", "close_price", "volume"]
        );
    }

    #[test]
    fn second_ingest_of_same_key_keeps_first_values() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp(&temp);

        warehouse
            .ingest_daily_records("test", "req-1", "IBM", &[record("IBM", "2024-03-01", "100.0000")])
            .expect("first ingest");
        warehouse
            .ingest_daily_records("test", "req-2", "IBM", &[record("IBM", "2024-03-01", "999.0000")])
            .expect("second ingest is a no-op, not an error");

        assert_eq!(warehouse.record_count().expect("count"), 1);
        let page = warehouse
            .query_records(&RecordFilter::default())
            .expect("query");
        assert_eq!(page.records[0].open_price, "100.0000");
    }

    #[test]
    fn ingest_uses_parameterized_queries() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp(&temp);

        let dangerous_symbol = r#"IBM'; DROP TABLE financial_data; --"#;
        warehouse
            .ingest_daily_records(
                "test",
                "req-3",
                dangerous_symbol,
                &[record(dangerous_symbol, "2024-03-01", "1.0")],
            )
            .expect("ingest should succeed with parameterized queries");

        let page = warehouse
            .query_records(&RecordFilter::default())
            .expect("table still exists");
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].symbol, dangerous_symbol);
    }

    #[test]
    fn failures_are_written_to_ingest_log() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp(&temp);

        warehouse
            .record_ingest_failure("alphavantage", "req-4", "AAPL", "timeout")
            .expect("log failure");

        let connection = warehouse.manager.acquire().expect("connection");
        let status: String = connection
            .query_row(
                "SELECT status FROM ingest_log WHERE symbol = 'AAPL'",
                [],
                |row| row.get(0),
            )
            .expect("log row");
        assert_eq!(status, "error");
    }

    #[test]
    fn closed_warehouse_rejects_operations() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp(&temp);
        warehouse.close();

        let error = warehouse
            .query_records(&RecordFilter::default())
            .expect_err("closed");
        assert!(matches!(error, WarehouseError::Closed));
    }
}
