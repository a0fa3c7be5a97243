//! Errors raised by the frame matcher, the catalog stores and config loading
//!
//! Geometry failures are not here: [`crate::wcs::WcsError`] is recovered
//! inside the matcher as "not covered" and never reaches callers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Catalog or light-curve query failed (connection, SQL, row decode)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed settings (TOML, HPCALIB_DB_* variables)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad coordinates, time bounds, time kind or search text from a caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
