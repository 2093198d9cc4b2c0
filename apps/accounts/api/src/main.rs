use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres;
use domain_users::InMemoryStore;
use migration::Migrator;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::{Config, StoreBackend};
use state::{AppState, Store};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let store = match config.store {
        StoreBackend::Postgres => {
            let database = config
                .database
                .clone()
                .ok_or_else(|| eyre::eyre!("DATABASE_URL is required for the postgres store"))?;

            let db = postgres::connect_with_retry(database, None)
                .await
                .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

            if config.run_migrations {
                postgres::run_migrations::<Migrator>(&db)
                    .await
                    .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
            }

            Store::Postgres(db)
        }
        StoreBackend::Memory => {
            info!("Using the seeded in-memory store; data is lost on restart");
            let store = InMemoryStore::seeded()
                .await
                .map_err(|e| eyre::eyre!("Failed to seed in-memory store: {}", e))?;
            Store::Memory(store)
        }
    };

    let state = AppState { config, store };

    // Build router with API routes (pass reference, not ownership!)
    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<openapi::ApiDoc>(api_routes, &state.config.cors)?;

    // Merge health endpoints into the app
    // - /health: liveness check with app name/version
    // - /ready: readiness check against the store
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(store = %state.config.store, "Starting accounts API");

    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30), // 30s graceful shutdown timeout
        async move {
            if let Store::Postgres(db) = state.store {
                info!("Shutting down: closing database connections");
                match db.close().await {
                    Ok(_) => info!("PostgreSQL connection closed successfully"),
                    Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
                }
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Accounts API shutdown complete");
    Ok(())
}
