use pricebook_warehouse::WarehouseError;
use thiserror::Error;

/// Message returned to callers for any malformed date.
pub const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD.";

/// Validation errors raised at the request boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol root length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol suffix '{suffix}' must be 1 to {max} letters or digits")]
    SymbolInvalidSuffix { suffix: String, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("at least one symbol is required")]
    EmptySymbolList,

    #[error("Invalid date format. Use YYYY-MM-DD.")]
    InvalidDate { value: String },
    #[error("start_date {start} must not be after end_date {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("missing required parameter '{name}'")]
    MissingParameter { name: &'static str },
    #[error("limit and page must be positive integers.")]
    InvalidPagination { name: &'static str, value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("blocking store task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_date_renders_boundary_message() {
        let error = ValidationError::InvalidDate {
            value: String::from("2020-13-01"),
        };
        assert_eq!(error.to_string(), INVALID_DATE_MESSAGE);
    }
}
