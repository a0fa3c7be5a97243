//! Read-only store traits consumed by the matcher and the light-curve search
//!
//! Implementations open their own read scope per call and hold no
//! cross-call state, so concurrent requests need no coordination.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::db::models::{FieldCatalogEntry, LightcurveEntry, ObservationFrame};
use crate::time::TimeWindow;
use crate::Result;

/// Frame selection passed to [`FrameStore::list_frames`]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameQuery {
    /// Only frames pointed at one of these fields
    pub field_names: BTreeSet<String>,
    /// Observation-time bounds, caller units (see [`TimeWindow::truncated_jd_bounds`])
    pub window: TimeWindow,
}

/// Field catalog and frame astrometry store
#[async_trait]
pub trait FrameStore: Send + Sync {
    /// One entry per distinct field name with its catalog center
    async fn list_fields(&self) -> Result<Vec<FieldCatalogEntry>>;

    /// Frames on the requested fields inside the time window.
    ///
    /// Frames whose astrometric solution did not converge are excluded.
    async fn list_frames(&self, query: &FrameQuery) -> Result<Vec<ObservationFrame>>;
}

/// Stitched light-curve file index
#[async_trait]
pub trait LightcurveStore: Send + Sync {
    /// Entries whose Gaia DR2 id starts with `prefix`, ordered by id
    async fn search_by_gaia_prefix(&self, prefix: &str, limit: usize)
        -> Result<Vec<LightcurveEntry>>;
}
