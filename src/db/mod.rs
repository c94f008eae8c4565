use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, Executor, SqlitePool};
use thiserror::Error;

pub mod models;
pub mod sessions;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to parse database URL: {0}")]
    UrlParse(String),
    #[error("Database error: {0}")]
    Sqlx(#[from] Error),
    #[error("Failed to prepare schema: {0}")]
    Schema(String),
}

const SESSIONS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sessions (
    key TEXT PRIMARY KEY NOT NULL,
    token TEXT NOT NULL,
    user_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Opens the local session database, creating the file and schema when missing.
pub async fn init_db(database_url: &str) -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DatabaseError::UrlParse(e.to_string()))?
        .create_if_missing(true);

    // An in-memory database lives only as long as its single connection.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Sqlx)?;

    ensure_schema(&pool).await?;

    Ok(pool)
}

async fn ensure_schema(pool: &SqlitePool) -> Result<(), DatabaseError> {
    pool.execute(SESSIONS_SCHEMA)
        .await
        .map_err(|e| DatabaseError::Schema(e.to_string()))?;
    Ok(())
}
