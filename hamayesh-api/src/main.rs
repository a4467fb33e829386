//! # Hamayesh API Server
//!
//! Serves the conference task engine over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/hamayesh JWT_SECRET=... cargo run -p hamayesh-api
//! ```

use std::sync::Arc;

use hamayesh_api::{
    app::{build_router, AppState},
    config::Config,
};
use hamayesh_shared::{
    db::{
        migrations::{ensure_database_exists, migration_status, run_migrations},
        pool::{close_pool, create_pool},
    },
    store::postgres::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hamayesh_api=debug,hamayesh_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Hamayesh API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    if config.database.run_migrations {
        ensure_database_exists(&config.database.url).await?;
    }

    let pool = create_pool(config.pool_config()).await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let status = migration_status(&pool).await?;
    if !status.is_up_to_date() {
        tracing::warn!(
            applied = status.applied.len(),
            pending = ?status.pending,
            "Database schema is behind; set DATABASE_RUN_MIGRATIONS=true or migrate manually"
        );
    }

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
