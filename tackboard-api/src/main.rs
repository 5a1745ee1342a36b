//! # Tackboard API Server
//!
//! This is the main API server for Tackboard, a multi-tenant kanban board
//! for small teams.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Authentication (register, login, JWT refresh)
//! - Board and membership management with role-gated access
//! - Task CRUD with lane ordering and bulk reorder
//! - An append-only per-board activity feed
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tackboard-api
//! ```

use std::sync::Arc;

use tackboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use tackboard_shared::db::{migrations, pool};
use tackboard_shared::store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tackboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tackboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // Database pool
    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    // Apply pending migrations before serving traffic
    migrations::run_migrations(&db).await?;
    let migration_status = migrations::get_migration_status(&db).await?;
    tracing::info!(
        applied = migration_status.applied_migrations,
        latest_version = ?migration_status.latest_version,
        "Database schema ready"
    );

    let state = AppState::new(Arc::new(PgStore::new(db.clone())), config.clone());
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves when the process receives Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
