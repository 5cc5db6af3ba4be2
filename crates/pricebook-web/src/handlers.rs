use axum::extract::{Query, State};
use axum::Json;
use pricebook_core::{blocking, DailyRecord, Pagination, SymbolAverages};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::ApiError;
use crate::params::{FinancialDataParams, StatisticsParams};
use crate::AppState;

/// `GET /financial_data` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialDataResponse {
    pub data: Vec<DailyRecord>,
    pub pagination: Pagination,
    pub info: String,
}

/// `GET /statistics` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsResponse {
    pub data: StatisticsData,
    pub info: StatisticsInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsData {
    pub start_date: String,
    pub end_date: String,
    pub symbols: Vec<String>,
    pub average_daily_open_price: SymbolValues,
    pub average_daily_close_price: SymbolValues,
    pub average_daily_volume: SymbolValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsInfo {
    pub error: String,
}

/// Symbol-keyed numbers serialized as a JSON object in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolValues(Vec<(String, f64)>);

impl SymbolValues {
    fn from_averages(averages: &[SymbolAverages], value: fn(&SymbolAverages) -> f64) -> Self {
        Self(
            averages
                .iter()
                .map(|entry| (entry.symbol.clone(), value(entry)))
                .collect(),
        )
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(key, _)| key == symbol)
            .map(|(_, value)| *value)
    }
}

impl Serialize for SymbolValues {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (symbol, value) in &self.0 {
            map.serialize_entry(symbol, value)?;
        }
        map.end()
    }
}

pub async fn financial_data(
    State(state): State<AppState>,
    Query(params): Query<FinancialDataParams>,
) -> Result<Json<FinancialDataResponse>, ApiError> {
    let filter = params.into_filter().map_err(ApiError::records)?;

    let page = blocking(state.warehouse.clone(), move |warehouse| {
        warehouse.query_records(&filter)
    })
    .await
    .map_err(ApiError::records)?;

    Ok(Json(FinancialDataResponse {
        data: page.records,
        pagination: page.pagination,
        info: String::new(),
    }))
}

/// Per-symbol averages over an inclusive date range.
///
/// An inverted range answers 400 rather than a zero-filled body.
pub async fn statistics(
    State(state): State<AppState>,
    Query(params): Query<StatisticsParams>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let request = params.into_request().map_err(ApiError::statistics)?;

    let start_date = request.start_date.to_string();
    let end_date = request.end_date.to_string();
    let symbols: Vec<String> = request.symbols.iter().map(ToString::to_string).collect();

    let averages = {
        let (start_date, end_date, symbols) =
            (start_date.clone(), end_date.clone(), symbols.clone());
        blocking(state.warehouse.clone(), move |warehouse| {
            warehouse.symbol_statistics(&start_date, &end_date, &symbols)
        })
        .await
        .map_err(ApiError::statistics)?
    };

    Ok(Json(StatisticsResponse {
        data: StatisticsData {
            start_date,
            end_date,
            symbols,
            average_daily_open_price: SymbolValues::from_averages(&averages, |a| {
                a.average_open_price
            }),
            average_daily_close_price: SymbolValues::from_averages(&averages, |a| {
                a.average_close_price
            }),
            average_daily_volume: SymbolValues::from_averages(&averages, |a| a.average_volume),
        },
        info: StatisticsInfo {
            error: String::new(),
        },
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_values_keep_insertion_order() {
        let values = SymbolValues(vec![
            (String::from("MSFT"), 2.5),
            (String::from("AAPL"), 0.0),
        ]);
        let json = serde_json::to_string(&values).expect("serializes");

        assert_eq!(json, r#"{"MSFT":2.5,"AAPL":0.0}"#);
        assert_eq!(values.get("AAPL"), Some(0.0));
    }
}
