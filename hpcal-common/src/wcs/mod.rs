//! World Coordinate System projection (sky → detector pixels)
//!
//! Implements the gnomonic (TAN) projection with optional SIP polynomial
//! distortion, in the FITS convention used by the frame pipeline:
//! - `crval`: sky position (deg) of the reference pixel
//! - `crpix`: reference pixel, FITS 1-based
//! - `cd`: linear transform, pixel offsets → intermediate world coordinates (deg)
//!
//! Pixel coordinates returned here are 0-based (FITS pixel minus one).

mod sip;

pub use sip::Sip;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Error, Result};

/// Geometry failures; recovered by callers as "no coverage"
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WcsError {
    /// Iterative SIP inversion diverged or hit the iteration limit
    #[error("SIP inversion failed to converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// CD matrix has no inverse
    #[error("CD matrix is singular")]
    Singular,

    /// Target lies on or behind the tangent plane
    #[error("Coordinate lies outside the TAN projection hemisphere")]
    OutsideProjection,
}

/// Validated sky position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyCoord {
    /// RA must be in [0, 360) and Dec in [-90, 90]; values are never clamped.
    pub fn new(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        if !ra_deg.is_finite() || !dec_deg.is_finite() {
            return Err(Error::InvalidInput(format!(
                "RA/DEC must be finite numbers (got ra={}, dec={})",
                ra_deg, dec_deg
            )));
        }
        if !(0.0..360.0).contains(&ra_deg) {
            return Err(Error::InvalidInput(format!(
                "RA must be in [0, 360) degrees (got {})",
                ra_deg
            )));
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(Error::InvalidInput(format!(
                "DEC must be in [-90, 90] degrees (got {})",
                dec_deg
            )));
        }
        Ok(Self { ra_deg, dec_deg })
    }

    /// Parse form/query text input
    pub fn parse(ra: &str, dec: &str) -> Result<Self> {
        let ra_deg = parse_degrees("RA", ra)?;
        let dec_deg = parse_degrees("DEC", dec)?;
        Self::new(ra_deg, dec_deg)
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }
}

fn parse_degrees(label: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidInput(format!("{} is not a number: {:?}", label, text)))
}

/// Detector position, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

/// TAN projection parameters, optionally with SIP distortion
#[derive(Debug, Clone, PartialEq)]
pub struct WcsParams {
    /// (RA, Dec) of the reference point, degrees
    pub crval: (f64, f64),
    /// Reference pixel, FITS 1-based
    pub crpix: (f64, f64),
    /// `[[CD1_1, CD1_2], [CD2_1, CD2_2]]`, degrees per pixel
    pub cd: [[f64; 2]; 2],
    pub sip: Option<Sip>,
}

impl WcsParams {
    /// Approximate projection pointed exactly at `center`: no rotation, no
    /// distortion, RA increasing to the left.
    pub fn nominal(center: (f64, f64), pixel_scale_arcsec: f64, crpix: (f64, f64)) -> Self {
        let deg_per_pix = pixel_scale_arcsec / 3600.0;
        Self {
            crval: center,
            crpix,
            cd: [[-deg_per_pix, 0.0], [0.0, deg_per_pix]],
            sip: None,
        }
    }
}

/// Geometry collaborator used by the frame matcher
pub trait Projector: Send + Sync {
    fn project_to_pixel(&self, target: SkyCoord, params: &WcsParams)
        -> std::result::Result<PixelCoord, WcsError>;
}

/// Default projector: TAN with iterative SIP inversion
#[derive(Debug, Default, Clone, Copy)]
pub struct TanSipProjector;

impl Projector for TanSipProjector {
    fn project_to_pixel(
        &self,
        target: SkyCoord,
        params: &WcsParams,
    ) -> std::result::Result<PixelCoord, WcsError> {
        project_to_pixel(target, params)
    }
}

/// Forward gnomonic (TAN) projection.
///
/// Projects `(ra, dec)` onto the tangent plane at `(ra0, dec0)`, all in radians.
/// Returns `(ξ, η)` in radians, or `None` if the point is on or behind the plane.
#[inline]
pub fn tan_project(ra: f64, dec: f64, ra0: f64, dec0: f64) -> Option<(f64, f64)> {
    let da = ra - ra0;
    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let cos_da = da.cos();

    let denom = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_da;
    if denom <= 1e-12 {
        return None;
    }

    let xi = cos_dec * da.sin() / denom;
    let eta = (sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_da) / denom;
    Some((xi, eta))
}

/// Sky coordinate → 0-based pixel coordinate
pub fn project_to_pixel(
    target: SkyCoord,
    params: &WcsParams,
) -> std::result::Result<PixelCoord, WcsError> {
    let (xi, eta) = tan_project(
        target.ra_deg.to_radians(),
        target.dec_deg.to_radians(),
        params.crval.0.to_radians(),
        params.crval.1.to_radians(),
    )
    .ok_or(WcsError::OutsideProjection)?;

    // Intermediate world coordinates in degrees
    let (x_int, y_int) = (xi.to_degrees(), eta.to_degrees());

    let [[a, b], [c, d]] = params.cd;
    let det = a * d - b * c;
    if det == 0.0 || !det.is_finite() {
        return Err(WcsError::Singular);
    }
    let big_u = (d * x_int - b * y_int) / det;
    let big_v = (a * y_int - c * x_int) / det;

    let (u, v) = match &params.sip {
        Some(sip) if !sip.is_zero() => sip.invert(big_u, big_v)?,
        _ => (big_u, big_v),
    };

    Ok(PixelCoord {
        x: params.crpix.0 - 1.0 + u,
        y: params.crpix.1 - 1.0 + v,
    })
}
