use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use pricebook_warehouse::DailyRecord;
use serde::{Deserialize, Deserializer};

use crate::data_source::{DailySeriesSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::ThrottlingQueue;
use crate::{DateWindow, Symbol, TradeDate};

pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// `TIME_SERIES_DAILY` response body.
///
/// Alpha Vantage answers HTTP 200 even for failures; those carry one of the
/// message fields instead of a series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailySeriesPayload {
    #[serde(rename = "Time Series (Daily)", default)]
    pub time_series: BTreeMap<String, DailyBarPayload>,
    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
    #[serde(rename = "Information", default)]
    pub information: Option<String>,
}

/// One date entry of the daily series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyBarPayload {
    #[serde(rename = "1. open", deserialize_with = "verbatim")]
    pub open: String,
    #[serde(rename = "4. close", deserialize_with = "verbatim")]
    pub close: String,
    #[serde(rename = "5. volume", deserialize_with = "verbatim")]
    pub volume: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Keeps text values as sent; numbers are rendered with their JSON digits.
fn verbatim<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}

/// Turn a daily-series payload into records sorted by date ascending.
///
/// Dates outside `window` are dropped. A date key that is not `YYYY-MM-DD`
/// fails the whole series.
pub fn normalize_daily_series(
    symbol: &Symbol,
    payload: &DailySeriesPayload,
    window: Option<&DateWindow>,
) -> Result<Vec<DailyRecord>, SourceError> {
    if let Some(message) = &payload.error_message {
        return Err(SourceError::invalid_request(format!(
            "alphavantage rejected {symbol}: {message}"
        )));
    }
    if let Some(message) = payload.note.as_ref().or(payload.information.as_ref()) {
        if payload.time_series.is_empty() {
            return Err(SourceError::rate_limited(format!(
                "alphavantage throttled {symbol}: {message}"
            )));
        }
    }

    let mut records = Vec::with_capacity(payload.time_series.len());
    for (date, bar) in &payload.time_series {
        let trade_date = TradeDate::parse(date).map_err(|_| {
            SourceError::internal(format!("alphavantage returned malformed date key '{date}'"))
        })?;
        if window.is_some_and(|window| !window.contains(trade_date)) {
            continue;
        }

        records.push(DailyRecord {
            symbol: symbol.as_str().to_owned(),
            date: trade_date.to_string(),
            open_price: bar.open.clone(),
            close_price: bar.close.clone(),
            volume: bar.volume.clone(),
        });
    }

    // BTreeMap iteration is already ordered by the ISO key.
    Ok(records)
}

/// Alpha Vantage `TIME_SERIES_DAILY` adapter.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
    full_history: bool,
    throttling: ThrottlingQueue,
}

impl AlphaVantageAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), api_key)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(ALPHAVANTAGE_BASE_URL),
            timeout_ms: 5_000,
            full_history: false,
            throttling: ThrottlingQueue::from_policy(&ProviderPolicy::alphavantage_default()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Request the full history (`outputsize=full`) instead of the last 100 days.
    pub fn with_full_history(mut self, full_history: bool) -> Self {
        self.full_history = full_history;
        self
    }

    pub fn daily_series_url(&self, symbol: &Symbol) -> String {
        let output_size = if self.full_history { "full" } else { "compact" };
        format!(
            "{}?function=TIME_SERIES_DAILY&symbol={}&outputsize={}&apikey={}",
            self.base_url,
            urlencoding::encode(symbol.as_str()),
            output_size,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Wait until the free-tier budget admits one more call.
    async fn wait_for_budget(&self) -> Result<(), SourceError> {
        let Err(mut delay) = self.throttling.acquire() else {
            return Ok(());
        };

        loop {
            tracing::debug!(
                delay_ms = delay.as_millis() as u64,
                "alphavantage budget exhausted, waiting"
            );
            tokio::time::sleep(delay).await;
            match self.throttling.retry_pending() {
                Ok(()) => return Ok(()),
                Err(Some(next)) => delay = next,
                Err(None) => {
                    return Err(SourceError::rate_limited(
                        "alphavantage free-tier limit exceeded; retries exhausted",
                    ))
                }
            }
        }
    }

    async fn fetch_daily_series(
        &self,
        symbol: &Symbol,
        window: Option<DateWindow>,
    ) -> Result<Vec<DailyRecord>, SourceError> {
        self.wait_for_budget().await?;

        let request = HttpRequest::get(self.daily_series_url(symbol))
            .with_header("Accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(format!("alphavantage transport error: {}", e.message()))
        })?;

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "alphavantage returned status {}",
                response.status
            )));
        }

        let payload: DailySeriesPayload = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::internal(format!("failed to parse alphavantage daily series: {e}"))
        })?;

        normalize_daily_series(symbol, &payload, window.as_ref())
    }
}

impl DailySeriesSource for AlphaVantageAdapter {
    fn id(&self) -> &'static str {
        "alphavantage"
    }

    fn daily_records<'a>(
        &'a self,
        symbol: &'a Symbol,
        window: Option<DateWindow>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DailyRecord>, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_daily_series(symbol, window))
    }
}
