//! Light-curve lookup by Gaia DR2 source id prefix

use tracing::debug;

use crate::db::models::LightcurveEntry;
use crate::db::store::LightcurveStore;
use crate::{Error, Result};

/// Maximum entries returned per search
pub const SEARCH_LIMIT: usize = 100;

/// Search stitched light curves whose Gaia DR2 id starts with `query`.
///
/// The query must be a non-empty run of digits.
pub async fn search_lightcurves(
    store: &dyn LightcurveStore,
    query: &str,
) -> Result<Vec<LightcurveEntry>> {
    let prefix = query.trim();
    if prefix.is_empty() {
        return Err(Error::InvalidInput("Empty search query".to_string()));
    }
    if !prefix.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "Gaia DR2 id must contain only digits: {:?}",
            prefix
        )));
    }

    let entries = store.search_by_gaia_prefix(prefix, SEARCH_LIMIT).await?;
    debug!("Light-curve search {:?}: {} entries", prefix, entries.len());
    Ok(entries)
}
