//! # Pricebook Core
//!
//! Validation, provider access and ingestion for the pricebook service.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Alpha Vantage daily-series adapter and normalization |
//! | [`data_source`] | Provider contract and structured [`SourceError`] |
//! | [`domain`] | [`Symbol`], [`TradeDate`], [`DateWindow`] |
//! | [`error`] | [`ValidationError`] and [`CoreError`] |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`ingest`] | Multi-symbol ingestion runner |
//! | [`provider_policy`] | Provider request budgets |
//! | [`throttling`] | Rate limiting support |
//!
//! ## Ingestion
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pricebook_core::{AlphaVantageAdapter, DateWindow, Ingestor, Symbol, TradeDate};
//! use pricebook_core::Warehouse;
//!
//! async fn refresh(warehouse: Warehouse) -> Result<(), pricebook_core::CoreError> {
//!     let adapter = AlphaVantageAdapter::new("demo");
//!     let ingestor = Ingestor::new(warehouse, Arc::new(adapter));
//!     let symbols = Symbol::parse_list("IBM,AAPL")?;
//!     let window = DateWindow::trailing_weeks(TradeDate::today(), 2);
//!     let report = ingestor.ingest(&symbols, Some(window)).await?;
//!     println!("inserted {} rows", report.inserted());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod ingest;
pub mod provider_policy;
pub mod throttling;

pub use adapters::{normalize_daily_series, AlphaVantageAdapter, DailySeriesPayload};
pub use data_source::{DailySeriesSource, SourceError, SourceErrorKind};
pub use domain::{DateWindow, Symbol, TradeDate};
pub use error::{CoreError, ValidationError, INVALID_DATE_MESSAGE};
pub use http_client::{
    CannedHttpClient, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use ingest::{blocking, IngestReport, Ingestor, SymbolOutcome};
pub use provider_policy::{BackoffPolicy, ProviderPolicy};
pub use throttling::ThrottlingQueue;

pub use pricebook_warehouse::{
    DailyRecord, IngestSummary, Pagination, RecordFilter, RecordPage, SymbolAverages, Warehouse,
    WarehouseConfig, WarehouseError, RECORDS_TABLE,
};
