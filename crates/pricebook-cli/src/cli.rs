//! CLI argument definitions for pricebook.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run the HTTP API |
//! | `ingest` | Fetch daily series from Alpha Vantage into the record store |
//! | `schema` | Print the column set of the records table |
//!
//! # Global Options
//!
//! | Option | Env | Default | Description |
//! |--------|-----|---------|-------------|
//! | `--home` | `PRICEBOOK_HOME` | `~/.pricebook` | Data root |
//! | `--db-path` | | `<home>/data/financial_data.duckdb` | Database file |
//! | `--log-format` | | `pretty` | Log output format |
//!
//! # Examples
//!
//! ```bash
//! # Load the last two weeks for the default symbols
//! pricebook ingest
//!
//! # Serve the API on another port
//! pricebook serve --bind 0.0.0.0:8080
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Daily equity prices: ingestion and query API.
#[derive(Debug, Parser)]
#[command(
    name = "pricebook",
    author,
    version,
    about = "Daily equity price store with a paginated query API"
)]
pub struct Cli {
    /// Data root directory.
    #[arg(long, global = true, env = "PRICEBOOK_HOME")]
    pub home: Option<PathBuf>,

    /// Database file; overrides the location derived from `--home`.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Log output format. Levels come from `RUST_LOG` (default `info`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API until interrupted.
    Serve(ServeArgs),
    /// Fetch daily series and store new records.
    Ingest(IngestArgs),
    /// Print the records table columns as JSON.
    Schema,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "PRICEBOOK_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, Args)]
pub struct IngestArgs {
    /// Ticker symbols to fetch.
    #[arg(value_name = "SYMBOL", default_values = ["IBM", "AAPL"])]
    pub symbols: Vec<String>,

    /// Keep only the trailing number of weeks, ending today.
    #[arg(long, default_value_t = 2, conflicts_with = "all")]
    pub weeks: u32,

    /// Keep every returned date instead of a trailing window.
    #[arg(long, default_value_t = false)]
    pub all: bool,

    /// Request the provider's full history instead of the latest 100 days.
    #[arg(long, default_value_t = false)]
    pub full: bool,

    /// Alpha Vantage API key.
    #[arg(long, env = "ALPHAVANTAGE_API_KEY", default_value = "demo", hide_env_values = true)]
    pub api_key: String,

    /// Provider request timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// Pretty-print the JSON report.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}
