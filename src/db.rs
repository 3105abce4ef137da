use anyhow::{Context, Result, anyhow};
use diesel::{Connection, PgConnection};
use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::{config::DatabaseConfig, store::postgres::DbPool};

/// Runs pending migrations over a short-lived synchronous connection on the blocking pool.
/// Returns how many migrations were applied.
pub async fn run_migrations_blocking(migrations: EmbeddedMigrations, url: &str) -> Result<usize> {
    let url = url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect to the database")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    DbPool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}
