//! HTTP API handlers for hpcal-fs

pub mod error;
pub mod frames;
pub mod health;
pub mod lightcurves;

pub use error::ApiError;
pub use frames::search_frames;
pub use health::health_routes;
pub use lightcurves::search_lightcurves;
