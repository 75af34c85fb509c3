use std::sync::Arc;

mod app;
mod auth;
mod bookings;
mod cars;
mod config;
mod db;
mod error;
mod ids;
mod memory;
mod queries;
mod state;

use crate::config::{AppConfig, StorageBackend};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "carshare=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);

    match (config.storage, config.database.as_ref()) {
        (StorageBackend::Postgres, Some(db_config)) => {
            let pool = db::connect(db_config).await?;
            db::migrate(&pool).await;

            let state = AppState::postgres(config.clone(), pool.clone());
            let result = app::serve(app::build_app(state), &config).await;

            pool.close().await;
            tracing::info!("database pool closed");
            result
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("postgres backend without database settings"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            let state = AppState::memory(config.clone());
            app::serve(app::build_app(state), &config).await
        }
    }
}
