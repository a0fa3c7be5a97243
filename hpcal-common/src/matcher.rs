//! Spatial frame matching
//!
//! Answers "which recorded frames have this sky position on the detector?"
//! in two stages:
//!
//! 1. **Field shortlist**: every catalog field gets a nominal TAN projection
//!    pointed at its catalog center (fixed pixel scale, no rotation or
//!    distortion). Fields whose projected pixel lands within the sensor plus a
//!    generous margin survive. Cheap, and permissive so no real coverage is lost.
//! 2. **Frame check**: frames of shortlisted fields are projected with their own
//!    fitted WCS (including SIP terms) and accepted only if the pixel falls
//!    strictly inside the sensor, with no margin.
//!
//! Geometry failures (non-convergent SIP inversion, NaN pixels, points behind
//! the tangent plane) count as "not covered" and never abort the request.
//! Store failures propagate to the caller.

use std::collections::BTreeSet;

use tracing::debug;

use crate::db::models::{FieldCatalogEntry, MatchedFrame, ObservationFrame};
use crate::db::store::{FrameQuery, FrameStore};
use crate::time::TimeWindow;
use crate::wcs::{PixelCoord, Projector, SkyCoord, TanSipProjector, WcsParams};
use crate::Result;

/// Detector width and height, pixels
pub const SENSOR_SIZE_PX: f64 = 2048.0;

/// Plate scale assumed for the field shortlist, arcsec/pixel
pub const NOMINAL_PIXEL_SCALE_ARCSEC: f64 = 19.62;

/// Reference pixel assumed for the field shortlist (FITS 1-based)
pub const NOMINAL_REFERENCE_PIXEL: (f64, f64) = (1024.0, 1024.0);

/// Padding around the sensor for the field shortlist, pixels
pub const COARSE_MARGIN_PX: f64 = 100.0;

/// Square detector footprint in 0-based pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFootprint {
    pub size_px: f64,
}

impl SensorFootprint {
    /// Strictly inside `(-margin, size + margin)` on both axes; NaN is never inside
    pub fn contains(&self, pixel: PixelCoord, margin: f64) -> bool {
        let lo = -margin;
        let hi = self.size_px + margin;
        pixel.x > lo && pixel.x < hi && pixel.y > lo && pixel.y < hi
    }
}

/// Matcher constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    pub sensor: SensorFootprint,
    pub nominal_pixel_scale_arcsec: f64,
    pub nominal_reference_pixel: (f64, f64),
    pub coarse_margin_px: f64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            sensor: SensorFootprint {
                size_px: SENSOR_SIZE_PX,
            },
            nominal_pixel_scale_arcsec: NOMINAL_PIXEL_SCALE_ARCSEC,
            nominal_reference_pixel: NOMINAL_REFERENCE_PIXEL,
            coarse_margin_px: COARSE_MARGIN_PX,
        }
    }
}

/// Two-stage matcher with an injected projection library
#[derive(Debug, Clone, Default)]
pub struct FrameMatcher<P = TanSipProjector> {
    settings: MatchSettings,
    projector: P,
}

impl FrameMatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: Projector> FrameMatcher<P> {
    pub fn with_projector(settings: MatchSettings, projector: P) -> Self {
        Self {
            settings,
            projector,
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Stage 1: names of fields whose nominal footprint (plus margin) may
    /// contain `target`. The first entry seen for a name is used.
    pub fn shortlist_fields(
        &self,
        fields: &[FieldCatalogEntry],
        target: SkyCoord,
    ) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut shortlist = BTreeSet::new();

        for field in fields {
            if !seen.insert(field.name.as_str()) {
                continue;
            }
            let params = WcsParams::nominal(
                (field.center_ra_deg, field.center_dec_deg),
                self.settings.nominal_pixel_scale_arcsec,
                self.settings.nominal_reference_pixel,
            );
            if self.lands_on_sensor(target, &params, self.settings.coarse_margin_px) {
                shortlist.insert(field.name.clone());
            }
        }

        shortlist
    }

    /// Stage 2: whether the frame's own solution puts `target` on the detector
    pub fn frame_covers(&self, frame: &ObservationFrame, target: SkyCoord) -> bool {
        match frame.astrometry.params() {
            Some(params) => self.lands_on_sensor(target, params, 0.0),
            None => false,
        }
    }

    fn lands_on_sensor(&self, target: SkyCoord, params: &WcsParams, margin: f64) -> bool {
        match self.projector.project_to_pixel(target, params) {
            Ok(pixel) => self.settings.sensor.contains(pixel, margin),
            Err(e) => {
                debug!(
                    "No coverage for ({}, {}) at crval {:?}: {}",
                    target.ra_deg(),
                    target.dec_deg(),
                    params.crval,
                    e
                );
                false
            }
        }
    }

    /// Every frame whose detector footprint covers `target` within `window`,
    /// sorted by `(field_name, instrument_id, frame_number)`.
    pub async fn find_frames(
        &self,
        store: &dyn FrameStore,
        target: SkyCoord,
        window: &TimeWindow,
    ) -> Result<Vec<MatchedFrame>> {
        let fields = store.list_fields().await?;
        let shortlist = self.shortlist_fields(&fields, target);
        debug!(
            "Field shortlist for ({}, {}): {} of {} fields",
            target.ra_deg(),
            target.dec_deg(),
            shortlist.len(),
            fields.len()
        );

        if shortlist.is_empty() {
            return Ok(Vec::new());
        }

        let query = FrameQuery {
            field_names: shortlist,
            window: window.clone(),
        };
        let frames = store.list_frames(&query).await?;

        let mut matched: Vec<MatchedFrame> = frames
            .iter()
            .filter(|frame| self.frame_covers(frame, target))
            .map(MatchedFrame::from)
            .collect();
        matched.sort_by(|a, b| {
            (&a.field_name, a.instrument_id, a.frame_number).cmp(&(
                &b.field_name,
                b.instrument_id,
                b.frame_number,
            ))
        });

        debug!(
            "{} of {} candidate frames cover ({}, {})",
            matched.len(),
            frames.len(),
            target.ra_deg(),
            target.dec_deg()
        );

        Ok(matched)
    }
}

/// [`FrameMatcher::find_frames`] with the default settings and projector
pub async fn find_frames(
    store: &dyn FrameStore,
    target: SkyCoord,
    window: &TimeWindow,
) -> Result<Vec<MatchedFrame>> {
    FrameMatcher::new().find_frames(store, target, window).await
}
