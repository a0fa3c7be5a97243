//! hpcal-fs library - Frame Search service
//!
//! Read-only HTTP front end over the HPCALIB catalog: which frames cover a sky
//! position, and which stitched light curves exist for a Gaia DR2 id.

use std::sync::Arc;

use axum::Router;
use hpcal_common::db::{FrameStore, LightcurveStore};
use hpcal_common::FrameMatcher;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Field catalog and frame astrometry (read-only)
    pub catalog: Arc<dyn FrameStore>,
    /// Light-curve index; `None` when not configured
    pub lightcurves: Option<Arc<dyn LightcurveStore>>,
    pub matcher: Arc<FrameMatcher>,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: Arc<dyn FrameStore>) -> Self {
        Self {
            catalog,
            lightcurves: None,
            matcher: Arc::new(FrameMatcher::new()),
        }
    }

    pub fn with_lightcurves(mut self, lightcurves: Arc<dyn LightcurveStore>) -> Self {
        self.lightcurves = Some(lightcurves);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/frames", get(api::search_frames))
        .route("/api/lightcurves", get(api::search_lightcurves))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
