//! Catalog and frame models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::time::from_truncated_jd;
use crate::wcs::{Sip, WcsParams};

/// Named pointing with its catalog center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalogEntry {
    pub name: String,
    pub center_ra_deg: f64,
    pub center_dec_deg: f64,
}

impl FieldCatalogEntry {
    pub fn new(name: impl Into<String>, center_ra_deg: f64, center_dec_deg: f64) -> Self {
        Self {
            name: name.into(),
            center_ra_deg,
            center_dec_deg,
        }
    }
}

/// Per-frame astrometric solution
#[derive(Debug, Clone, PartialEq)]
pub enum AstrometricSolution {
    Solved(WcsParams),
    /// Solver failed, row missing, or parameters incomplete
    Unsolved,
}

impl AstrometricSolution {
    pub fn params(&self) -> Option<&WcsParams> {
        match self {
            AstrometricSolution::Solved(params) => Some(params),
            AstrometricSolution::Unsolved => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, AstrometricSolution::Solved(_))
    }
}

/// Raw `astrometry` table columns as read from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AstrometryRow {
    pub exit_code: i32,
    pub crval1: Option<f64>,
    pub crval2: Option<f64>,
    pub crpix1: Option<f64>,
    pub crpix2: Option<f64>,
    pub cd1_1: Option<f64>,
    pub cd1_2: Option<f64>,
    pub cd2_1: Option<f64>,
    pub cd2_2: Option<f64>,
    /// SIP A coefficients, JSON 2-D array
    pub sip_a: Option<String>,
    /// SIP B coefficients, JSON 2-D array
    pub sip_b: Option<String>,
}

impl AstrometryRow {
    /// A solution is usable only with `exit_code == 0` and every linear term present.
    ///
    /// SIP terms that fail to parse are dropped; the linear solution is kept.
    pub fn into_solution(self) -> AstrometricSolution {
        if self.exit_code != 0 {
            return AstrometricSolution::Unsolved;
        }

        let Some(mut params) = self.linear_params() else {
            return AstrometricSolution::Unsolved;
        };

        if let (Some(a), Some(b)) = (self.sip_a.as_deref(), self.sip_b.as_deref()) {
            if !a.trim().is_empty() && !b.trim().is_empty() {
                match Sip::from_json(a, b) {
                    Ok(sip) => params.sip = Some(sip),
                    Err(e) => warn!("Ignoring unparseable SIP coefficients: {}", e),
                }
            }
        }

        AstrometricSolution::Solved(params)
    }

    fn linear_params(&self) -> Option<WcsParams> {
        Some(WcsParams {
            crval: (self.crval1?, self.crval2?),
            crpix: (self.crpix1?, self.crpix2?),
            cd: [[self.cd1_1?, self.cd1_2?], [self.cd2_1?, self.cd2_2?]],
            sip: None,
        })
    }
}

/// Relative FITS path as laid out by the reduction pipeline:
/// `{date_dir}/ihu{NN}/{frame_name}{compression}`
pub fn frame_relative_path(
    instrument_id: i32,
    date_dir: &str,
    frame_name: &str,
    compression: Option<&str>,
) -> String {
    format!(
        "{}/ihu{:02}/{}{}",
        date_dir,
        instrument_id,
        frame_name,
        compression.unwrap_or("")
    )
}

/// Sky and ephemeris quality metrics joined onto a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameQuality {
    /// Calibrated-frame median, ADU
    pub sky_background: Option<f64>,
    pub moon_distance_deg: Option<f64>,
    pub sun_elevation_deg: Option<f64>,
}

/// Recorded observation frame, identity = (instrument_id, frame_number)
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationFrame {
    pub instrument_id: i32,
    pub frame_number: i32,
    pub field_name: String,
    pub image_kind: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    /// `JD - 2400000`
    pub truncated_jd: Option<f64>,
    pub exposure_seconds: Option<f64>,
    pub relative_path: String,
    pub astrometry: AstrometricSolution,
    pub quality: FrameQuality,
}

/// Matcher output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedFrame {
    pub instrument_id: i32,
    pub frame_number: i32,
    pub field_name: String,
    pub image_kind: Option<String>,
    /// ISO 8601, serialized as `null` when unknown
    pub timestamp: Option<NaiveDateTime>,
    /// Full Julian day
    pub julian_date: Option<f64>,
    pub exposure_seconds: Option<f64>,
    pub relative_path: String,
    pub sky_background: Option<f64>,
    pub moon_distance_deg: Option<f64>,
    pub sun_elevation_deg: Option<f64>,
}

impl From<&ObservationFrame> for MatchedFrame {
    fn from(frame: &ObservationFrame) -> Self {
        Self {
            instrument_id: frame.instrument_id,
            frame_number: frame.frame_number,
            field_name: frame.field_name.clone(),
            image_kind: frame.image_kind.clone(),
            timestamp: frame.timestamp,
            julian_date: frame.truncated_jd.map(from_truncated_jd),
            exposure_seconds: frame.exposure_seconds,
            relative_path: frame.relative_path.clone(),
            sky_background: frame.quality.sky_background,
            moon_distance_deg: frame.quality.moon_distance_deg,
            sun_elevation_deg: frame.quality.sun_elevation_deg,
        }
    }
}

/// Stitched light-curve file for one Gaia DR2 source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightcurveEntry {
    pub gaia_id: i64,
    pub filename: String,
}

impl LightcurveEntry {
    pub fn new(gaia_id: i64) -> Self {
        Self {
            gaia_id,
            filename: format!("Gaia-DR2-{}.epd.tfa.fits", gaia_id),
        }
    }
}
