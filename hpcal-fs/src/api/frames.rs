//! Frame coverage search
//!
//! GET /api/frames?ra=DEG&dec=DEG[&time_min=..&time_max=..&time_kind=calendar|julian_day]

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use hpcal_common::db::MatchedFrame;
use hpcal_common::{SkyCoord, TimeKind, TimeWindow};

use super::ApiError;
use crate::AppState;

/// Query parameters, kept as text so malformed numbers become 400 responses
#[derive(Debug, Default, Deserialize)]
pub struct FrameSearchQuery {
    pub ra: Option<String>,
    pub dec: Option<String>,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub time_kind: Option<String>,
}

/// Matching frames plus the interpreted request
#[derive(Debug, Serialize)]
pub struct FrameSearchResponse {
    pub ra: f64,
    pub dec: f64,
    pub time_kind: TimeKind,
    pub total_results: usize,
    pub frames: Vec<MatchedFrame>,
}

/// GET /api/frames
///
/// An empty `frames` list is a normal "no coverage found" answer.
pub async fn search_frames(
    State(state): State<AppState>,
    Query(query): Query<FrameSearchQuery>,
) -> Result<Json<FrameSearchResponse>, ApiError> {
    let ra = required(&query.ra, "ra")?;
    let dec = required(&query.dec, "dec")?;
    let target = SkyCoord::parse(ra, dec)?;

    let kind: TimeKind = query.time_kind.as_deref().unwrap_or_default().parse()?;
    let window = TimeWindow::parse(kind, query.time_min.as_deref(), query.time_max.as_deref())?;

    let frames = state
        .matcher
        .find_frames(state.catalog.as_ref(), target, &window)
        .await?;

    info!(
        "Frame search ra={} dec={} ({}): {} frames",
        target.ra_deg(),
        target.dec_deg(),
        kind,
        frames.len()
    );

    Ok(Json(FrameSearchResponse {
        ra: target.ra_deg(),
        dec: target.dec_deg(),
        time_kind: kind,
        total_results: frames.len(),
        frames,
    }))
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required parameter: {}", name)))
}
