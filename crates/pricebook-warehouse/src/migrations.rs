use ::duckdb::{params, Connection};

/// Name of the table holding daily price/volume records.
pub const RECORDS_TABLE: &str = "financial_data";

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_financial_data",
        sql: r#"
CREATE TABLE IF NOT EXISTS financial_data (
    symbol TEXT NOT NULL,
    date TEXT NOT NULL,
    open_price TEXT NOT NULL,
    close_price TEXT NOT NULL,
    volume TEXT NOT NULL,
    PRIMARY KEY(symbol, date)
);
"#,
    },
    Migration {
        version: "0002_ingest_log",
        sql: r#"
CREATE TABLE IF NOT EXISTS ingest_log (
    request_id TEXT NOT NULL,
    symbol TEXT NOT NULL,
    source TEXT NOT NULL,
    status TEXT NOT NULL,
    received BIGINT,
    inserted BIGINT,
    detail TEXT,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params![migration.version],
            )?;
            tracing::debug!(version = migration.version, "applied schema migration");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_applied_once() {
        let connection = Connection::open_in_memory().expect("in-memory db");

        apply_migrations(&connection).expect("first run");
        apply_migrations(&connection).expect("second run");

        let applied: i64 = connection
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("count");
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }
}
