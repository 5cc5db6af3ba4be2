//! Per-symbol averages over an inclusive date range.

use ::duckdb::{params, Connection};
use serde::Serialize;

use crate::migrations::RECORDS_TABLE;
use crate::{finalize_transaction, Warehouse, WarehouseError};

/// Averages for a single symbol. All three are `0.0` when no rows matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAverages {
    pub symbol: String,
    pub average_open_price: f64,
    pub average_close_price: f64,
    pub average_volume: f64,
    /// Number of rows the averages were computed from.
    pub sample_count: u64,
}

impl SymbolAverages {
    fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_owned(),
            average_open_price: 0.0,
            average_close_price: 0.0,
            average_volume: 0.0,
            sample_count: 0,
        }
    }
}

impl Warehouse {
    /// Compute averages for each symbol over `[start_date, end_date]`.
    ///
    /// Symbols are processed independently, in input order; repeated symbols
    /// are computed once. Symbols are matched exactly, so callers normalize
    /// case beforehand.
    pub fn symbol_statistics(
        &self,
        start_date: &str,
        end_date: &str,
        symbols: &[String],
    ) -> Result<Vec<SymbolAverages>, WarehouseError> {
        let mut distinct: Vec<&str> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !distinct.contains(&symbol.as_str()) {
                distinct.push(symbol.as_str());
            }
        }

        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<Vec<SymbolAverages>, WarehouseError> {
            distinct
                .iter()
                .map(|symbol| averages_for_symbol(&connection, symbol, start_date, end_date))
                .collect()
        })();

        finalize_transaction(&connection, result)
    }
}

fn averages_for_symbol(
    connection: &Connection,
    symbol: &str,
    start_date: &str,
    end_date: &str,
) -> Result<SymbolAverages, WarehouseError> {
    let sql = format!(
        "SELECT \
            COUNT(*), \
            AVG(CAST(open_price AS DOUBLE)), \
            AVG(CAST(close_price AS DOUBLE)), \
            AVG(CAST(volume AS DOUBLE)) \
         FROM {RECORDS_TABLE} \
         WHERE symbol = ? AND date >= ? AND date <= ?"
    );

    let (count, open, close, volume) = connection.query_row(
        sql.as_str(),
        params![symbol, start_date, end_date],
        |row| {
            let count: i64 = row.get(0)?;
            let open: Option<f64> = row.get(1)?;
            let close: Option<f64> = row.get(2)?;
            let volume: Option<f64> = row.get(3)?;
            Ok((count, open, close, volume))
        },
    )?;

    if count == 0 {
        return Ok(SymbolAverages::empty(symbol));
    }

    Ok(SymbolAverages {
        symbol: symbol.to_owned(),
        average_open_price: open.unwrap_or_default(),
        average_close_price: close.unwrap_or_default(),
        average_volume: volume.unwrap_or_default(),
        sample_count: u64::try_from(count).unwrap_or_default(),
    })
}
