//! Database helpers for the CLI: path-to-URL conversion and engine setup.

use anyhow::{Context, Result};
use bankbot_engine::{Engine, EngineConfig};
use bankbot_persistence::Database;
use std::path::Path;

fn database_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

/// Create the schema, creating the database file when missing.
pub async fn init_database(path: &Path) -> Result<Database> {
    Database::init(&database_url(path))
        .await
        .with_context(|| format!("Failed to initialize database at {}", path.display()))
}

/// Open the database and build an engine with the default configuration.
pub async fn open_engine(path: &Path) -> Result<Engine> {
    let db = init_database(path).await?;
    Ok(Engine::new(&db, EngineConfig::default()))
}
