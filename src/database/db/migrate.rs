use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply the forecast schema. Already-applied migrations are skipped.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to apply forecast schema migrations")?;
    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}
