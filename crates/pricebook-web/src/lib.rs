//! # Pricebook Web
//!
//! axum routes over the record store.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /financial_data` | Paginated records filtered by date range and symbol |
//! | `GET /statistics` | Per-symbol average open, close and volume over a date range |
//! | `GET /health` | Liveness probe |
//!
//! Store calls run on the blocking pool; handlers never block the runtime.

use std::future::Future;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use pricebook_core::Warehouse;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod params;

pub use error::{ApiError, ApiErrorKind, Envelope, STORAGE_ERROR_MESSAGE};
pub use handlers::{FinancialDataResponse, StatisticsResponse, SymbolValues};
pub use params::{FinancialDataParams, StatisticsParams, StatisticsRequest};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub warehouse: Warehouse,
}

impl AppState {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    Router::new()
        .route("/financial_data", get(handlers::financial_data))
        .route("/statistics", get(handlers::statistics))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves, then finish in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "pricebook listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
