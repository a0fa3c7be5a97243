//! Field catalog and frame astrometry over the HPCALIB schema
//!
//! Tables: `star_catalogs`, `frames`, `astrometry`, `calframe_quality`,
//! `frame_quality`. Frames and their per-frame tables share the
//! `(IHUID, FNUM)` key.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{MySql, QueryBuilder, Row};
use tracing::debug;

use hpcal_common::db::{
    frame_relative_path, AstrometryRow, FieldCatalogEntry, FrameQuality, FrameQuery, FrameStore,
    ObservationFrame,
};
use hpcal_common::{Result, TimeWindow};

/// One row per field name: the lowest `catalog_id` wins
const LIST_FIELDS_SQL: &str = "\
SELECT s.OBJECT, s.RA, s.`DEC` \
FROM star_catalogs s \
JOIN (SELECT OBJECT, MIN(catalog_id) AS first_id FROM star_catalogs \
      WHERE OBJECT IS NOT NULL AND RA IS NOT NULL AND `DEC` IS NOT NULL \
      GROUP BY OBJECT) firsts ON s.catalog_id = firsts.first_id \
ORDER BY s.OBJECT";

const FRAME_COLUMNS: &str = "\
SELECT f.IHUID, f.FNUM, f.OBJECT, f.datetime_obs, f.JD, f.EXPTIME, \
f.date_dir, f.frame_name, f.compression, \
a.exit_code, a.CRVAL1, a.CRVAL2, a.CRPIX1, a.CRPIX2, \
a.CD1_1, a.CD1_2, a.CD2_1, a.CD2_2, a.A, a.B, \
cq.calframe_median, fq.MOONDIST, fq.SUNELEV \
FROM frames f \
JOIN astrometry a ON a.IHUID = f.IHUID AND a.FNUM = f.FNUM \
LEFT JOIN calframe_quality cq ON cq.IHUID = f.IHUID AND cq.FNUM = f.FNUM \
LEFT JOIN frame_quality fq ON fq.IHUID = f.IHUID AND fq.FNUM = f.FNUM ";

/// Catalog store backed by a read-only MySQL pool
#[derive(Debug, Clone)]
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl FrameStore for MySqlCatalog {
    async fn list_fields(&self) -> Result<Vec<FieldCatalogEntry>> {
        let rows = sqlx::query(LIST_FIELDS_SQL).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(FieldCatalogEntry::new(
                    row.try_get::<String, _>("OBJECT")?,
                    row.try_get::<f64, _>("RA")?,
                    row.try_get::<f64, _>("DEC")?,
                ))
            })
            .collect()
    }

    async fn list_frames(&self, query: &FrameQuery) -> Result<Vec<ObservationFrame>> {
        if query.field_names.is_empty() {
            return Ok(Vec::new());
        }

        let rows = build_frames_query(query).build().fetch_all(&self.pool).await?;
        let frames = rows.iter().map(decode_frame).collect::<Result<Vec<_>>>()?;

        // exit_code = 0 rows can still lack linear terms
        let solved: Vec<ObservationFrame> = frames
            .into_iter()
            .filter(|f| f.astrometry.is_solved())
            .collect();
        debug!(
            "Loaded {} solved frames ({} rows) for {} fields",
            solved.len(),
            rows.len(),
            query.field_names.len()
        );

        Ok(solved)
    }
}

/// Solved frames on the requested fields within the window.
///
/// Callers must not pass an empty field set (`IN ()` is not valid SQL).
pub(crate) fn build_frames_query(query: &FrameQuery) -> QueryBuilder<'static, MySql> {
    let mut builder = QueryBuilder::new(FRAME_COLUMNS);
    builder.push("WHERE a.exit_code = 0 AND f.OBJECT IN (");
    let mut names = builder.separated(", ");
    for name in &query.field_names {
        names.push_bind(name.clone());
    }
    names.push_unseparated(")");

    match &query.window {
        TimeWindow::Calendar { min, max } => {
            if let Some(min) = min {
                builder.push(" AND f.datetime_obs >= ").push_bind(*min);
            }
            if let Some(max) = max {
                builder.push(" AND f.datetime_obs <= ").push_bind(*max);
            }
        }
        TimeWindow::JulianDay { .. } => {
            let (min, max) = query.window.truncated_jd_bounds();
            if let Some(min) = min {
                builder.push(" AND f.JD >= ").push_bind(min);
            }
            if let Some(max) = max {
                builder.push(" AND f.JD <= ").push_bind(max);
            }
        }
    }

    builder.push(" ORDER BY f.OBJECT, f.IHUID, f.FNUM");
    builder
}

fn decode_frame(row: &MySqlRow) -> Result<ObservationFrame> {
    let instrument_id: i32 = row.try_get("IHUID")?;
    let date_dir: Option<String> = row.try_get("date_dir")?;
    let frame_name: Option<String> = row.try_get("frame_name")?;
    let compression: Option<String> = row.try_get("compression")?;

    let astrometry = AstrometryRow {
        exit_code: row.try_get("exit_code")?,
        crval1: row.try_get("CRVAL1")?,
        crval2: row.try_get("CRVAL2")?,
        crpix1: row.try_get("CRPIX1")?,
        crpix2: row.try_get("CRPIX2")?,
        cd1_1: row.try_get("CD1_1")?,
        cd1_2: row.try_get("CD1_2")?,
        cd2_1: row.try_get("CD2_1")?,
        cd2_2: row.try_get("CD2_2")?,
        sip_a: row.try_get("A")?,
        sip_b: row.try_get("B")?,
    };

    Ok(ObservationFrame {
        instrument_id,
        frame_number: row.try_get("FNUM")?,
        field_name: row.try_get::<Option<String>, _>("OBJECT")?.unwrap_or_default(),
        // frames carries no image-type column
        image_kind: None,
        timestamp: row.try_get("datetime_obs")?,
        truncated_jd: row.try_get("JD")?,
        exposure_seconds: row.try_get("EXPTIME")?,
        relative_path: frame_relative_path(
            instrument_id,
            date_dir.as_deref().unwrap_or_default(),
            frame_name.as_deref().unwrap_or_default(),
            compression.as_deref(),
        ),
        astrometry: astrometry.into_solution(),
        quality: FrameQuality {
            sky_background: row.try_get("calframe_median")?,
            moon_distance_deg: row.try_get("MOONDIST")?,
            sun_elevation_deg: row.try_get("SUNELEV")?,
        },
    })
}
