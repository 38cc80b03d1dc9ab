//! # TaskTrack API Server
//!
//! HTTP backend for task management: users, tasks, many-to-many
//! user-task assignments, and completed-task statistics.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tasktrack-api
//! ```

use tasktrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasktrack_shared::db::{migrations::run_migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasktrack_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..pool::DatabaseConfig::default()
    })
    .await?;

    run_migrations(&db).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{bind_address}");

    axum::serve(listener, app).await?;

    Ok(())
}
