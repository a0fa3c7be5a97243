//! Stitched light-curve index (`Gaia_DR2_ID`, `path_to_file`)

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::{MySql, QueryBuilder, Row};

use hpcal_common::db::{LightcurveEntry, LightcurveStore};
use hpcal_common::{Error, Result};

pub const DEFAULT_LIGHTCURVE_TABLE: &str = "lightcurve_files";

/// Light-curve store backed by a read-only MySQL pool
#[derive(Debug, Clone)]
pub struct MySqlLightcurves {
    pool: MySqlPool,
    table: String,
}

impl MySqlLightcurves {
    /// `table` is interpolated into SQL, so only `[A-Za-z0-9_]` is accepted
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }
}

fn validate_table_name(table: &str) -> Result<()> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::Config(format!(
            "Invalid light-curve table name: {:?}",
            table
        )));
    }
    Ok(())
}

fn build_search_query(table: &str, prefix: &str, limit: usize) -> QueryBuilder<'static, MySql> {
    let mut builder = QueryBuilder::new("SELECT Gaia_DR2_ID FROM `");
    builder
        .push(table)
        .push("` WHERE CAST(Gaia_DR2_ID AS CHAR) LIKE ")
        .push_bind(format!("{}%", prefix))
        .push(" ORDER BY Gaia_DR2_ID LIMIT ")
        .push_bind(limit as u64);
    builder
}

#[async_trait]
impl LightcurveStore for MySqlLightcurves {
    async fn search_by_gaia_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<LightcurveEntry>> {
        let rows = build_search_query(&self.table, prefix, limit)
            .build()
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok(LightcurveEntry::new(row.try_get::<i64, _>("Gaia_DR2_ID")?)))
            .collect()
    }
}
