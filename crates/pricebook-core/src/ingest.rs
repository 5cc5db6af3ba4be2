//! Multi-symbol ingestion with per-symbol failure isolation.

use std::sync::Arc;

use pricebook_warehouse::{IngestSummary, Warehouse};
use serde::Serialize;
use uuid::Uuid;

use crate::data_source::{DailySeriesSource, SourceError};
use crate::{CoreError, DateWindow, Symbol};

/// Result of fetching and storing one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Stored {
        symbol: String,
        received: usize,
        inserted: usize,
    },
    Failed {
        symbol: String,
        code: &'static str,
        error: String,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Stored { symbol, .. } | Self::Failed { symbol, .. } => symbol,
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub request_id: String,
    pub source: &'static str,
    pub window: Option<DateWindow>,
    pub outcomes: Vec<SymbolOutcome>,
}

impl IngestReport {
    pub fn inserted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                SymbolOutcome::Stored { inserted, .. } => *inserted,
                SymbolOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Fetches symbols one at a time from a source and stores them.
///
/// A fetch failure only affects its own symbol: it is logged, written to the
/// ingest log and the run continues. Store failures abort the run.
#[derive(Clone)]
pub struct Ingestor {
    warehouse: Warehouse,
    source: Arc<dyn DailySeriesSource>,
}

impl Ingestor {
    pub fn new(warehouse: Warehouse, source: Arc<dyn DailySeriesSource>) -> Self {
        Self { warehouse, source }
    }

    pub async fn ingest(
        &self,
        symbols: &[Symbol],
        window: Option<DateWindow>,
    ) -> Result<IngestReport, CoreError> {
        let request_id = Uuid::new_v4().to_string();
        let source = self.source.id();
        let mut outcomes = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let outcome = match self.source.daily_records(symbol, window).await {
                Ok(records) => {
                    let summary = self.store(&request_id, symbol, records).await?;
                    tracing::info!(
                        request_id = %request_id,
                        symbol = %symbol,
                        received = summary.received,
                        inserted = summary.inserted,
                        "symbol ingested"
                    );
                    SymbolOutcome::Stored {
                        symbol: symbol.to_string(),
                        received: summary.received,
                        inserted: summary.inserted,
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        request_id = %request_id,
                        symbol = %symbol,
                        code = error.code(),
                        error = %error.message(),
                        "symbol fetch failed; continuing"
                    );
                    self.record_failure(&request_id, symbol, &error).await?;
                    SymbolOutcome::Failed {
                        symbol: symbol.to_string(),
                        code: error.code(),
                        error: error.message().to_owned(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        Ok(IngestReport {
            request_id,
            source,
            window,
            outcomes,
        })
    }

    async fn store(
        &self,
        request_id: &str,
        symbol: &Symbol,
        records: Vec<pricebook_warehouse::DailyRecord>,
    ) -> Result<IngestSummary, CoreError> {
        let request_id = request_id.to_owned();
        let symbol = symbol.to_string();
        let source = self.source.id();
        blocking(self.warehouse.clone(), move |warehouse| {
            warehouse.ingest_daily_records(source, &request_id, &symbol, &records)
        })
        .await
    }

    async fn record_failure(
        &self,
        request_id: &str,
        symbol: &Symbol,
        error: &SourceError,
    ) -> Result<(), CoreError> {
        let request_id = request_id.to_owned();
        let symbol = symbol.to_string();
        let detail = error.to_string();
        let source = self.source.id();
        blocking(self.warehouse.clone(), move |warehouse| {
            warehouse.record_ingest_failure(source, &request_id, &symbol, &detail)
        })
        .await
    }
}

/// Run a store call on the blocking pool.
pub async fn blocking<T, F>(warehouse: Warehouse, call: F) -> Result<T, CoreError>
where
    T: Send + 'static,
    F: FnOnce(&Warehouse) -> Result<T, pricebook_warehouse::WarehouseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&warehouse))
        .await
        .map_err(|e| CoreError::Task(e.to_string()))?
        .map_err(CoreError::from)
}
