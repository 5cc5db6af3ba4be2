//! Provider adapters.

pub mod alphavantage;

pub use alphavantage::{
    normalize_daily_series, AlphaVantageAdapter, DailyBarPayload, DailySeriesPayload,
    ALPHAVANTAGE_BASE_URL,
};
