//! Paginated record queries.

use ::duckdb::{Connection, ToSql};
use serde::Serialize;

use crate::filter::{compile, Predicate, RecordFilter};
use crate::migrations::RECORDS_TABLE;
use crate::{finalize_transaction, DailyRecord, Warehouse, WarehouseError};

/// Pagination metadata returned alongside a page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Number of rows matching the filter, ignoring pagination.
    pub count: u64,
    pub page: u32,
    pub limit: u32,
    /// `ceil(count / limit)`.
    pub pages: u64,
}

impl Pagination {
    pub fn new(count: u64, page: u32, limit: u32) -> Self {
        Self {
            count,
            page,
            limit,
            pages: total_pages(count, limit),
        }
    }
}

/// One page of records ordered by ascending date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPage {
    pub records: Vec<DailyRecord>,
    pub pagination: Pagination,
}

impl Warehouse {
    /// Return the requested page of records matching `filter`.
    ///
    /// The count and the page are read inside one transaction, so both observe
    /// the same snapshot even while ingestion is running. A page past the end
    /// yields no records and leaves `count`/`pages` untouched.
    pub fn query_records(&self, filter: &RecordFilter) -> Result<RecordPage, WarehouseError> {
        let predicate = compile(filter);
        tracing::debug!(
            where_sql = %predicate.where_sql(),
            page = filter.page,
            limit = filter.limit,
            "querying records"
        );

        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<RecordPage, WarehouseError> {
            let count = count_matching(&connection, &predicate)?;
            let records = fetch_page(&connection, &predicate, filter)?;
            Ok(RecordPage {
                records,
                pagination: Pagination::new(count, filter.page, filter.limit),
            })
        })();

        finalize_transaction(&connection, result)
    }
}

fn count_matching(connection: &Connection, predicate: &Predicate) -> Result<u64, WarehouseError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {RECORDS_TABLE} WHERE {}",
        predicate.where_sql()
    );
    let params = predicate.params();
    let count: i64 = connection.query_row(sql.as_str(), params.as_slice(), |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or_default())
}

fn fetch_page(
    connection: &Connection,
    predicate: &Predicate,
    filter: &RecordFilter,
) -> Result<Vec<DailyRecord>, WarehouseError> {
    let sql = format!(
        "SELECT symbol, date, open_price, close_price, volume FROM {RECORDS_TABLE} \
         WHERE {} ORDER BY date ASC, symbol ASC LIMIT ? OFFSET ?",
        predicate.where_sql()
    );
    let limit = i64::from(filter.limit);
    let offset = i64::try_from(filter.offset()).unwrap_or(i64::MAX);

    let mut params = predicate.params();
    params.push(&limit as &dyn ToSql);
    params.push(&offset as &dyn ToSql);

    let mut statement = connection.prepare(sql.as_str())?;
    let rows = statement.query_map(params.as_slice(), DailyRecord::from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(WarehouseError::from)
}

/// `ceil(count / limit)`, zero when `limit` is zero.
pub fn total_pages(count: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    count.div_ceil(u64::from(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 5), 0);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(6, 5), 2);
        assert_eq!(total_pages(7, 2), 4);
    }

    #[test]
    fn zero_limit_has_no_pages() {
        assert_eq!(total_pages(10, 0), 0);
    }
}
