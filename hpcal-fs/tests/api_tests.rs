//! Integration tests for hpcal-fs API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Frame coverage search (parameters, time windows, error mapping)
//! - Light-curve search (validation, limits, unconfigured index)

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDateTime;
use hpcal_common::db::{
    AstrometricSolution, FieldCatalogEntry, FrameQuality, FrameQuery, FrameStore, MemoryCatalog,
    ObservationFrame,
};
use hpcal_common::{Error, WcsParams};
use hpcal_fs::{build_router, AppState};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot` method

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn frame(ihu: i32, fnum: i32, timestamp: &str, truncated_jd: f64) -> ObservationFrame {
    ObservationFrame {
        instrument_id: ihu,
        frame_number: fnum,
        field_name: "F1".to_string(),
        image_kind: Some("object".to_string()),
        timestamp: Some(dt(timestamp)),
        truncated_jd: Some(truncated_jd),
        exposure_seconds: Some(30.0),
        relative_path: format!("1-20210101/ihu{:02}/1-{}_{}.fits.fz", ihu, fnum, ihu),
        astrometry: AstrometricSolution::Solved(WcsParams::nominal(
            (10.0, 20.0),
            19.62,
            (1024.0, 1024.0),
        )),
        quality: FrameQuality {
            sky_background: Some(812.0),
            moon_distance_deg: None,
            sun_elevation_deg: Some(-31.0),
        },
    }
}

/// Test helper: one field with two frames a day apart
fn test_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_field(FieldCatalogEntry::new("F1", 10.0, 20.0))
        .with_frame(frame(1, 100, "2021-01-01 03:00:00", 59_215.625))
        .with_frame(frame(2, 200, "2021-01-02 03:00:00", 59_216.625))
        .with_lightcurve(123_456_789)
        .with_lightcurve(123_999_000)
        .with_lightcurve(987_654_321)
}

/// Test helper: app with catalog and light-curve index
fn setup_app() -> axum::Router {
    let catalog = Arc::new(test_catalog());
    let state = AppState::new(catalog.clone()).with_lightcurves(catalog);
    build_router(state)
}

/// Test helper: Create GET request
fn test_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app.oneshot(test_request(uri)).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get(setup_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hpcal-fs");
    assert!(body["version"].is_string());
}

// =============================================================================
// Frame Search Tests
// =============================================================================

#[tokio::test]
async fn test_frames_at_field_center() {
    let (status, body) = get(setup_app(), "/api/frames?ra=10&dec=20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ra"], 10.0);
    assert_eq!(body["dec"], 20.0);
    assert_eq!(body["time_kind"], "calendar");
    assert_eq!(body["total_results"], 2);

    let frames = body["frames"].as_array().unwrap();
    assert_eq!(frames[0]["instrument_id"], 1);
    assert_eq!(frames[0]["frame_number"], 100);
    assert_eq!(frames[0]["field_name"], "F1");
    assert_eq!(frames[0]["timestamp"], "2021-01-01T03:00:00");
    assert_eq!(frames[0]["julian_date"], 2_459_215.625);
    assert_eq!(frames[0]["relative_path"], "1-20210101/ihu01/1-100_1.fits.fz");
    assert_eq!(frames[0]["sky_background"], 812.0);
    assert!(frames[0]["moon_distance_deg"].is_null());
    assert_eq!(frames[1]["instrument_id"], 2);
}

#[tokio::test]
async fn test_frames_far_from_any_field() {
    let (status, body) = get(setup_app(), "/api/frames?ra=200&dec=-40").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 0);
    assert_eq!(body["frames"], Value::Array(vec![]));
}

#[tokio::test]
async fn test_frames_calendar_window() {
    let (status, body) = get(
        setup_app(),
        "/api/frames?ra=10&dec=20&time_min=2021-01-02&time_max=2021-01-02",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["frames"][0]["frame_number"], 200);
}

#[tokio::test]
async fn test_frames_julian_day_window() {
    let (status, body) = get(
        setup_app(),
        "/api/frames?ra=10&dec=20&time_kind=julian_day&time_max=2459216.0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_kind"], "julian_day");
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["frames"][0]["frame_number"], 100);
}

#[tokio::test]
async fn test_frames_empty_bounds_ignored() {
    let (status, body) = get(setup_app(), "/api/frames?ra=10&dec=20&time_min=&time_max=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 2);
}

#[tokio::test]
async fn test_frames_invalid_parameters() {
    for uri in [
        "/api/frames",
        "/api/frames?dec=20",
        "/api/frames?ra=abc&dec=20",
        "/api/frames?ra=360&dec=20",
        "/api/frames?ra=10&dec=91",
        "/api/frames?ra=10&dec=20&time_kind=lunar",
        "/api/frames?ra=10&dec=20&time_min=yesterday",
        "/api/frames?ra=10&dec=20&time_kind=jd&time_min=NaN",
    ] {
        let (status, body) = get(setup_app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

struct BrokenStore;

#[async_trait]
impl FrameStore for BrokenStore {
    async fn list_fields(&self) -> hpcal_common::Result<Vec<FieldCatalogEntry>> {
        Err(Error::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_frames(&self, _query: &FrameQuery) -> hpcal_common::Result<Vec<ObservationFrame>> {
        Err(Error::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn test_frames_store_failure_is_500() {
    let app = build_router(AppState::new(Arc::new(BrokenStore)));
    let (status, body) = get(app, "/api/frames?ra=10&dec=20").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("timed out"));
}

// =============================================================================
// Light-curve Search Tests
// =============================================================================

#[tokio::test]
async fn test_lightcurves_prefix_search() {
    let (status, body) = get(setup_app(), "/api/lightcurves?search=123").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_query"], "123");
    assert_eq!(body["total_results"], 2);
    assert_eq!(body["results"][0]["gaia_id"], 123_456_789);
    assert_eq!(
        body["results"][0]["filename"],
        "Gaia-DR2-123456789.epd.tfa.fits"
    );
    assert_eq!(body["results"][1]["gaia_id"], 123_999_000);
}

#[tokio::test]
async fn test_lightcurves_rejects_non_digits() {
    for uri in ["/api/lightcurves", "/api/lightcurves?search=12%25", "/api/lightcurves?search=abc"] {
        let (status, body) = get(setup_app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_lightcurves_unconfigured_is_503() {
    let app = build_router(AppState::new(Arc::new(test_catalog())));
    let (status, body) = get(app, "/api/lightcurves?search=123").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}
