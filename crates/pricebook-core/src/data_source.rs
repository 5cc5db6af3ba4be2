//! Provider contract for daily price series.
//!
//! A [`DailySeriesSource`] fetches the daily records of one symbol and
//! reports failures as a [`SourceError`]. The ingestion runner treats every
//! `SourceError` as a per-symbol failure and moves on to the next symbol.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use pricebook_warehouse::DailyRecord;
use serde::{Deserialize, Serialize};

use crate::{DateWindow, Symbol};

/// Broad failure category of an upstream fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Transport failure, timeout or non-2xx status.
    Unavailable,
    /// Provider throttling notice or exhausted local budget.
    RateLimited,
    /// Provider rejected the request (unknown symbol, bad key).
    InvalidRequest,
    /// Payload could not be understood.
    Internal,
}

/// Structured upstream error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Upstream provider of daily series.
pub trait DailySeriesSource: Send + Sync {
    /// Stable identifier written to the ingest log.
    fn id(&self) -> &'static str;

    /// Daily records for `symbol`, sorted by date. When `window` is given,
    /// only dates inside it (bounds included) are returned.
    fn daily_records<'a>(
        &'a self,
        symbol: &'a Symbol,
        window: Option<DateWindow>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DailyRecord>, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_machine_code() {
        let error = SourceError::rate_limited("slow down");

        assert_eq!(error.to_string(), "slow down (source.rate_limited)");
        assert!(error.retryable());
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }

    #[test]
    fn invalid_requests_are_not_retryable() {
        assert!(!SourceError::invalid_request("unknown symbol").retryable());
        assert!(!SourceError::internal("bad payload").retryable());
    }
}
