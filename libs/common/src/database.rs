//! Database module for the SQLite goal store
//!
//! This module provides pool configuration, schema migration and health
//! checks. The pool is created once at startup and handed to repositories
//! explicitly; nothing here keeps a process-wide connection.

use crate::error::{DatabaseError, DatabaseResult};
use serde::{Deserialize, Serialize};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, time::Duration};
use tracing::{error, info};

/// Statements applied by [`migrate`], in order.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS goals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        goal TEXT NOT NULL,
        status TEXT DEFAULT 'pending',
        deadline DATETIME,
        FOREIGN KEY (user_id) REFERENCES users (id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_goals_user ON goals (user_id)",
];

/// Database configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (e.g. `sqlite://goals.db` or `sqlite::memory:`)
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

fn default_url() -> String {
    "sqlite://goals.db".to_string()
}

fn default_max_connections() -> u32 {
    1
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    /// Whether the URL points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Initialize a SQLite connection pool
///
/// The database file is created when missing and foreign keys are enforced.
/// In-memory databases are pinned to a single connection that never expires,
/// since the data lives only as long as that connection.
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<SqlitePool>` - SQLite connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    info!("Initializing database connection pool for {}", config.url);

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let max_connections = config.max_connections.max(1);
    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .acquire_timeout(Duration::from_secs(config.connection_timeout));

    if config.is_in_memory() {
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Create the `users` and `goals` tables when they do not exist yet
///
/// Safe to run on every startup.
pub async fn migrate(pool: &SqlitePool) -> DatabaseResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            error!("Failed to apply schema statement: {}", e);
            DatabaseError::Migration(e.to_string())
        })?;
    }

    info!("Database schema is up to date");
    Ok(())
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful
pub async fn health_check(pool: &SqlitePool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}
