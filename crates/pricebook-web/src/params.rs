//! Query-string parameters and their validation.
//!
//! Every field arrives as optional text so that malformed values surface as
//! [`ValidationError`]s with the service's own messages instead of extractor
//! rejections.

use pricebook_core::{RecordFilter, Symbol, TradeDate, ValidationError};
use serde::Deserialize;

/// `GET /financial_data` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialDataParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub symbol: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

impl FinancialDataParams {
    /// Validate dates and pagination and build the record filter.
    ///
    /// Blank values count as absent. The symbol is normalized but never
    /// rejected; an unknown symbol simply matches nothing. A `limit` or `page`
    /// that is not a positive integer is rejected rather than replaced by
    /// its default.
    pub fn into_filter(self) -> Result<RecordFilter, ValidationError> {
        let mut filter = RecordFilter::default();

        if let Some(start) = present(self.start_date.as_deref()) {
            filter = filter.with_start_date(TradeDate::parse(start)?.to_string());
        }
        if let Some(end) = present(self.end_date.as_deref()) {
            filter = filter.with_end_date(TradeDate::parse(end)?.to_string());
        }
        if let Some(symbol) = present(self.symbol.as_deref()) {
            filter = filter.with_symbol(symbol.to_ascii_uppercase());
        }
        if let Some(limit) = present(self.limit.as_deref()) {
            filter = filter.with_limit(positive("limit", limit)?);
        }
        if let Some(page) = present(self.page.as_deref()) {
            filter = filter.with_page(positive("page", page)?);
        }

        Ok(filter)
    }
}

/// `GET /statistics` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub symbols: Option<String>,
}

/// Validated statistics request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsRequest {
    pub start_date: TradeDate,
    pub end_date: TradeDate,
    /// Requested symbols in order, duplicates kept.
    pub symbols: Vec<Symbol>,
}

impl StatisticsParams {
    /// Require all three parameters and validate them.
    ///
    /// A start date after the end date is rejected instead of averaging an
    /// empty range to zeros.
    pub fn into_request(self) -> Result<StatisticsRequest, ValidationError> {
        let start = required("start_date", self.start_date.as_deref())?;
        let end = required("end_date", self.end_date.as_deref())?;
        let symbols = required("symbols", self.symbols.as_deref())?;

        let start_date = TradeDate::parse(start)?;
        let end_date = TradeDate::parse(end)?;
        if start_date > end_date {
            return Err(ValidationError::InvertedDateRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        Ok(StatisticsRequest {
            start_date,
            end_date,
            symbols: Symbol::parse_list(symbols)?,
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    present(value).ok_or(ValidationError::MissingParameter { name })
}

fn positive(name: &'static str, value: &str) -> Result<u32, ValidationError> {
    value
        .parse::<u32>()
        .ok()
        .filter(|parsed| *parsed > 0)
        .ok_or_else(|| ValidationError::InvalidPagination {
            name,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> FinancialDataParams {
        let mut params = FinancialDataParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_owned());
            match *key {
                "start_date" => params.start_date = value,
                "end_date" => params.end_date = value,
                "symbol" => params.symbol = value,
                "limit" => params.limit = value,
                "page" => params.page = value,
                other => panic!("unexpected key {other}"),
            }
        }
        params
    }

    #[test]
    fn absent_parameters_use_defaults() {
        let filter = FinancialDataParams::default().into_filter().expect("filter");
        assert_eq!(filter, RecordFilter::default());
    }

    #[test]
    fn blank_parameters_count_as_absent() {
        let filter = params(&[("start_date", ""), ("symbol", "  "), ("limit", "")])
            .into_filter()
            .expect("filter");
        assert_eq!(filter, RecordFilter::default());
    }

    #[test]
    fn symbol_is_uppercased() {
        let filter = params(&[("symbol", "ibm")]).into_filter().expect("filter");
        assert_eq!(filter.symbol.as_deref(), Some("IBM"));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let err = params(&[("end_date", "2020-02-30")])
            .into_filter()
            .expect_err("invalid day");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn non_positive_pagination_is_rejected() {
        for (key, value) in [("limit", "0"), ("page", "-1"), ("limit", "five")] {
            let err = params(&[(key, value)]).into_filter().expect_err("bad pagination");
            assert!(matches!(err, ValidationError::InvalidPagination { .. }), "{key}={value}");
        }
    }

    #[test]
    fn statistics_require_every_parameter() {
        let err = StatisticsParams {
            start_date: Some("2024-01-01".into()),
            end_date: None,
            symbols: Some("IBM".into()),
        }
        .into_request()
        .expect_err("missing end_date");
        assert_eq!(err, ValidationError::MissingParameter { name: "end_date" });
    }

    #[test]
    fn statistics_reject_inverted_range() {
        let err = StatisticsParams {
            start_date: Some("2024-02-01".into()),
            end_date: Some("2024-01-01".into()),
            symbols: Some("IBM".into()),
        }
        .into_request()
        .expect_err("inverted");
        assert!(matches!(err, ValidationError::InvertedDateRange { .. }));
    }

    #[test]
    fn statistics_keep_symbol_order_and_duplicates() {
        let request = StatisticsParams {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            symbols: Some("ibm,AAPL,IBM".into()),
        }
        .into_request()
        .expect("request");

        let symbols: Vec<&str> = request.symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(symbols, ["IBM", "AAPL", "IBM"]);
    }
}
