//! MySQL access layer for hpcal-fs
//!
//! All connections are read-only: every pooled session runs
//! `SET SESSION TRANSACTION READ ONLY` before first use, and connections are
//! pinged before being handed out.

use std::time::Duration;

use anyhow::{Context, Result};
use hpcal_common::config::DatabaseConfig;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

mod catalog;
mod lightcurves;

pub use catalog::MySqlCatalog;
pub use lightcurves::{MySqlLightcurves, DEFAULT_LIGHTCURVE_TABLE};

const MAX_CONNECTIONS: u32 = 8;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to the HPCALIB catalog database in read-only mode
pub async fn connect_readonly(config: &DatabaseConfig) -> Result<MySqlPool> {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name);

    let pool = readonly_pool_options()
        .connect_with(options)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to catalog database {}@{}:{}/{}",
                config.user, config.host, config.port, config.name
            )
        })?;

    verify_readonly(&pool).await?;
    Ok(pool)
}

/// Connect to the light-curve index database by URL, read-only
pub async fn connect_readonly_url(url: &str) -> Result<MySqlPool> {
    let options: MySqlConnectOptions = url
        .parse()
        .context("Invalid light-curve database URL")?;

    let pool = readonly_pool_options()
        .connect_with(options)
        .await
        .context("Failed to connect to light-curve database")?;

    verify_readonly(&pool).await?;
    Ok(pool)
}

fn readonly_pool_options() -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .test_before_acquire(true)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("SET SESSION TRANSACTION READ ONLY")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
}

async fn verify_readonly(pool: &MySqlPool) -> Result<()> {
    let read_only: i64 = sqlx::query_scalar("SELECT @@session.transaction_read_only")
        .fetch_one(pool)
        .await
        .context("Failed to query session read-only flag")?;

    if read_only != 1 {
        anyhow::bail!("Database session is not read-only (transaction_read_only = {})", read_only);
    }
    Ok(())
}
