//! Behavior-driven tests for `GET /financial_data`
//!
//! Requests go through the full axum router with `oneshot`, against a
//! throwaway DuckDB file.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pricebook_warehouse::{DailyRecord, Warehouse, WarehouseConfig};
use pricebook_web::{router, AppState};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

fn open_warehouse() -> (TempDir, Warehouse) {
    let temp = tempdir().expect("tempdir");
    let warehouse =
        Warehouse::open(WarehouseConfig::for_home(temp.path())).expect("warehouse open");
    (temp, warehouse)
}

fn seed_ibm_week(warehouse: &Warehouse) {
    let rows: Vec<DailyRecord> = (1..=7)
        .rev()
        .map(|day| DailyRecord {
            symbol: "IBM".to_string(),
            date: format!("2024-03-{day:02}"),
            open_price: format!("{}.00", 100 + day),
            close_price: format!("{}.50", 100 + day),
            volume: format!("{}", day * 1000),
        })
        .collect();
    warehouse
        .ingest_daily_records("test", "req-seed", "IBM", &rows)
        .expect("seed");
}

async fn get(warehouse: &Warehouse, uri: &str) -> (StatusCode, Value) {
    let app = router(AppState::new(warehouse.clone()));
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

// =============================================================================
// /financial_data: Pagination
// =============================================================================

#[tokio::test]
async fn when_store_is_empty_the_response_has_no_data_and_zero_pages() {
    // Given: An empty store
    let (_temp, warehouse) = open_warehouse();

    // When: The endpoint is called without parameters
    let (status, body) = get(&warehouse, "/financial_data").await;

    // Then: Empty data with default pagination
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": [],
            "pagination": {"count": 0, "page": 1, "limit": 5, "pages": 0},
            "info": ""
        })
    );
}

#[tokio::test]
async fn second_page_of_two_returns_rows_three_and_four() {
    // Given: Seven IBM rows
    let (_temp, warehouse) = open_warehouse();
    seed_ibm_week(&warehouse);

    // When: limit=2&page=2 is requested
    let (status, body) = get(&warehouse, "/financial_data?limit=2&page=2").await;

    // Then: Rows three and four in date order
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pagination"],
        json!({"count": 7, "page": 2, "limit": 2, "pages": 4})
    );
    assert_eq!(
        body["data"],
        json!([
            {"symbol": "IBM", "date": "2024-03-03", "open_price": "103.00", "close_price": "103.50", "volume": "3000"},
            {"symbol": "IBM", "date": "2024-03-04", "open_price": "104.00", "close_price": "104.50", "volume": "4000"}
        ])
    );
    assert_eq!(body["info"], "");
}

#[tokio::test]
async fn page_past_the_end_is_empty_without_clamping() {
    let (_temp, warehouse) = open_warehouse();
    seed_ibm_week(&warehouse);

    let (status, body) = get(&warehouse, "/financial_data?limit=5&page=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(
        body["pagination"],
        json!({"count": 7, "page": 3, "limit": 5, "pages": 2})
    );
}

#[tokio::test]
async fn records_come_back_in_non_decreasing_date_order() {
    let (_temp, warehouse) = open_warehouse();
    seed_ibm_week(&warehouse);

    let (_, body) = get(&warehouse, "/financial_data?limit=7").await;

    let dates: Vec<&str> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|row| row["date"].as_str().expect("date"))
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_unstable();
    assert_eq!(dates, sorted);
    assert_eq!(dates.len(), 7);
}

// =============================================================================
// /financial_data: Filters
// =============================================================================

#[tokio::test]
async fn symbol_filter_ignores_case() {
    let (_temp, warehouse) = open_warehouse();
    seed_ibm_week(&warehouse);

    let (_, lower) = get(&warehouse, "/financial_data?symbol=ibm&limit=3").await;
    let (_, upper) = get(&warehouse, "/financial_data?symbol=IBM&limit=3").await;

    assert_eq!(lower, upper);
    assert_eq!(lower["pagination"]["count"], 7);
}

#[tokio::test]
async fn date_range_filters_inclusively() {
    let (_temp, warehouse) = open_warehouse();
    seed_ibm_week(&warehouse);

    let (status, body) = get(
        &warehouse,
        "/financial_data?start_date=2024-03-06&end_date=2024-03-07",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["count"], 2);
    assert_eq!(body["data"][0]["date"], "2024-03-06");
    assert_eq!(body["data"][1]["date"], "2024-03-07");
}

#[tokio::test]
async fn hostile_symbol_matches_nothing() {
    let (_temp, warehouse) = open_warehouse();
    seed_ibm_week(&warehouse);

    let (status, body) = get(
        &warehouse,
        "/financial_data?symbol=IBM%27%20OR%20%271%27%3D%271",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["count"], 0);
    assert_eq!(warehouse.record_count().expect("count"), 7);
}

// =============================================================================
// /financial_data: Validation
// =============================================================================

#[tokio::test]
async fn impossible_month_is_rejected_with_format_message() {
    let (_temp, warehouse) = open_warehouse();

    let (status, body) = get(&warehouse, "/financial_data?start_date=2020-13-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "data": [],
            "pagination": {},
            "info": "Invalid date format. Use YYYY-MM-DD."
        })
    );
}

#[tokio::test]
async fn malformed_end_date_is_rejected() {
    let (_temp, warehouse) = open_warehouse();

    let (status, body) = get(&warehouse, "/financial_data?end_date=March%201").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["info"], "Invalid date format. Use YYYY-MM-DD.");
}

#[tokio::test]
async fn non_positive_pagination_is_rejected() {
    let (_temp, warehouse) = open_warehouse();

    for uri in [
        "/financial_data?limit=0",
        "/financial_data?page=-2",
        "/financial_data?limit=ten",
    ] {
        let (status, body) = get(&warehouse, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["info"], "limit and page must be positive integers.");
        assert_eq!(body["pagination"], json!({}));
    }
}

#[tokio::test]
async fn closed_store_answers_with_internal_error() {
    let (_temp, warehouse) = open_warehouse();
    warehouse.close();

    let (status, body) = get(&warehouse, "/financial_data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["info"], "internal storage error");
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn health_reports_ok() {
    let (_temp, warehouse) = open_warehouse();

    let (status, body) = get(&warehouse, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
