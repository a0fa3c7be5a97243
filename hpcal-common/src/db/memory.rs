//! In-memory catalog honoring the same contracts as the SQL stores

use async_trait::async_trait;

use crate::db::models::{FieldCatalogEntry, LightcurveEntry, ObservationFrame};
use crate::db::store::{FrameQuery, FrameStore, LightcurveStore};
use crate::Result;

/// Snapshot of catalog fields, frames and light-curve ids
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    fields: Vec<FieldCatalogEntry>,
    frames: Vec<ObservationFrame>,
    gaia_ids: Vec<i64>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FieldCatalogEntry) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_frame(mut self, frame: ObservationFrame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn with_lightcurve(mut self, gaia_id: i64) -> Self {
        self.gaia_ids.push(gaia_id);
        self
    }
}

#[async_trait]
impl FrameStore for MemoryCatalog {
    async fn list_fields(&self) -> Result<Vec<FieldCatalogEntry>> {
        let mut distinct: Vec<FieldCatalogEntry> = Vec::new();
        for field in &self.fields {
            if !distinct.iter().any(|f| f.name == field.name) {
                distinct.push(field.clone());
            }
        }
        Ok(distinct)
    }

    async fn list_frames(&self, query: &FrameQuery) -> Result<Vec<ObservationFrame>> {
        Ok(self
            .frames
            .iter()
            .filter(|f| query.field_names.contains(&f.field_name))
            .filter(|f| f.astrometry.is_solved())
            .filter(|f| query.window.admits(f.timestamp, f.truncated_jd))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LightcurveStore for MemoryCatalog {
    async fn search_by_gaia_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<LightcurveEntry>> {
        let mut ids: Vec<i64> = self
            .gaia_ids
            .iter()
            .copied()
            .filter(|id| id.to_string().starts_with(prefix))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.into_iter().take(limit).map(LightcurveEntry::new).collect())
    }
}
