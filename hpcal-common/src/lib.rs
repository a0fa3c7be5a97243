//! # HPCAL Common Library
//!
//! Shared code for the HPCAL frame archive services including:
//! - Catalog, frame and light-curve data contracts plus store traits
//! - WCS (TAN + SIP) projection of sky coordinates onto detector pixels
//! - Spatial frame matching (which frames cover a sky position)
//! - Time windows in calendar or Julian-day units
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod lightcurves;
pub mod matcher;
pub mod time;
pub mod wcs;

pub use error::{Error, Result};
pub use matcher::{find_frames, FrameMatcher, MatchSettings};
pub use time::{TimeKind, TimeWindow};
pub use wcs::{PixelCoord, SkyCoord, WcsParams};
