use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors surfaced by the persistence layer. None of them are retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Validation(#[from] crate::database::models::ValidationError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

const POSTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS posts(
        slug TEXT NOT NULL PRIMARY KEY,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        body TEXT,
        created DATETIME,
        modified DATETIME
    )
"#;

const USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL DEFAULT '',
        password TEXT NOT NULL
    )
"#;

/// Owns the pool lifecycle: open, bootstrap the schema, ping, close.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Opens (creating the file if needed) and bootstraps the database.
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::init_schema(&pool).await?;

        info!("Opened database pool for: {}", config.url);
        Ok(pool)
    }

    /// Single-connection in-memory database, schema applied.
    pub async fn in_memory() -> Result<SqlitePool, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::init_schema(&pool).await?;
        Ok(pool)
    }

    pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(POSTS_TABLE).execute(pool).await?;
        sqlx::query(USERS_TABLE).execute(pool).await?;
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    pub async fn close(pool: &SqlitePool) {
        pool.close().await;
        info!("Closed database pool");
    }
}
