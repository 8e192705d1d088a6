//! # PivotCRM API Server
//!
//! HTTP entry point for the permission and automation core. Boots the
//! database pool, runs migrations, spawns the automation dispatcher, and
//! serves the Axum router until a shutdown signal arrives.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p pivotcrm-api
//! ```

use pivotcrm_api::{app, config::Config};
use pivotcrm_engine::{spawn_dispatcher, AutomationEngine, PgStore};
use pivotcrm_shared::db;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pivotcrm_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "PivotCRM API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = db::pool::create_pool(db::pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    db::migrations::run_migrations(&pool).await?;

    let engine = AutomationEngine::new(
        Arc::new(PgStore::new(pool.clone())),
        pivotcrm_engine::executors::default_registry(pool.clone()),
    );
    let (dispatcher, dispatcher_handle) = spawn_dispatcher(engine);

    let state = app::AppState::new(pool.clone(), config.clone(), dispatcher);
    let router = app::build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    dispatcher_handle.shutdown().await;
    db::pool::close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}
