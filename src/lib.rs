// Core modules
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod students;
pub mod types;

// Re-export key types and functions
pub use api::{AppState, cors_layer, create_router};
pub use config::{AppConfig, resolve_config_path};
pub use db::{DatabaseConfig, Db, create_connection, ensure_schema};
pub use students::{StudentDirectory, StudentPlacement};

use anyhow::Result;
use axum::Router;

/// Convenience function to open the database and build the full router.
///
/// The configuration must already be validated.
pub async fn create_app(config: &AppConfig) -> Result<Router> {
    let db = create_connection(config.database.clone()).await?;
    ensure_schema(&db).await?;

    let state = AppState::from_config(config, db)?;
    let cors = cors_layer(&config.frontend.allowed_origins)?;

    Ok(create_router(state, cors))
}
