use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pricebook_core::{CoreError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// Message returned for any store failure; details only go to the log.
pub const STORAGE_ERROR_MESSAGE: &str = "internal storage error";

/// Why a request failed.
#[derive(Debug, Error)]
pub enum ApiErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("internal storage error")]
    Storage(#[from] CoreError),
}

/// Which response envelope an error is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{data: [], pagination: {}, info: "<message>"}`
    Records,
    /// `{data: {}, info: {error: "<message>"}}`
    Statistics,
}

/// Error returned by handlers, rendered in the envelope of its endpoint.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ApiError {
    envelope: Envelope,
    kind: ApiErrorKind,
}

impl ApiError {
    pub fn records(kind: impl Into<ApiErrorKind>) -> Self {
        Self {
            envelope: Envelope::Records,
            kind: kind.into(),
        }
    }

    pub fn statistics(kind: impl Into<ApiErrorKind>) -> Self {
        Self {
            envelope: Envelope::Statistics,
            kind: kind.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiErrorKind::Storage(source) = &self.kind {
            tracing::error!(error = %source, "store operation failed");
        }

        let message = self.kind.to_string();
        let body = match self.envelope {
            Envelope::Records => json!({"data": [], "pagination": {}, "info": message}),
            Envelope::Statistics => json!({"data": {}, "info": {"error": message}}),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let error = ApiError::records(ValidationError::InvalidDate {
            value: String::from("2020-13-01"),
        });
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), pricebook_core::INVALID_DATE_MESSAGE);
    }

    #[test]
    fn storage_errors_hide_details() {
        let error = ApiError::statistics(CoreError::Task(String::from("panicked")));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), STORAGE_ERROR_MESSAGE);
    }
}
