//! Light-curve search by Gaia DR2 id prefix
//!
//! GET /api/lightcurves?search=PREFIX

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use hpcal_common::db::LightcurveEntry;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LightcurveQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct LightcurveSearchResponse {
    pub search_query: String,
    pub total_results: usize,
    pub results: Vec<LightcurveEntry>,
}

/// GET /api/lightcurves
///
/// At most 100 entries, ordered by Gaia DR2 id.
pub async fn search_lightcurves(
    State(state): State<AppState>,
    Query(query): Query<LightcurveQuery>,
) -> Result<Json<LightcurveSearchResponse>, ApiError> {
    let store = state
        .lightcurves
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Light-curve index not configured".to_string()))?;

    let results = hpcal_common::lightcurves::search_lightcurves(store.as_ref(), &query.search).await?;

    Ok(Json(LightcurveSearchResponse {
        search_query: query.search,
        total_results: results.len(),
        results,
    }))
}
