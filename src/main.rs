use std::sync::Arc;

use anyhow::{Context, Result};
use backoffice_orderservice::{
    app_state::AppState,
    bootstrap,
    clock::SystemClock,
    config::{self, StorageBackend},
    db, routes,
    store::{MemoryStore, PgStore, Store},
};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    let store: Arc<dyn Store> = match config.storage {
        StorageBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("Postgres storage requires a database configuration")?;

            tracing::info!("Running migrations...");
            let migrations_count = db::run_migrations_blocking(MIGRATIONS, &database.url).await?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            Arc::new(PgStore::new(db::create_pool(database).await?))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data will not survive a restart");
            Arc::new(MemoryStore::with_demo_catalog().await)
        }
    };

    let state = AppState::new(store, Arc::new(SystemClock));
    let app = routes::build_router(state);

    tracing::info!("Bootstrapping...");
    bootstrap::serve("OrderService", app, &config.server).await?;
    Ok(())
}
