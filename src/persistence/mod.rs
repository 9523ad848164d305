//! Persistence Layer
//!
//! Two stores back the journal:
//!
//! - [`json_store`]: the trading journal itself, kept as flat JSON files
//!   (`trading_data.json`, `futures_data.json`, `holdings_data.json`,
//!   `balance_data.json`). Every write replaces the whole file.
//! - SQLite via sqlx for the consortium variant.
//!
//! # Database Schema
//!
//! ## clients
//! - id: INTEGER primary key
//! - name: TEXT, unique ignoring case
//! - invested: REAL, never negative
//! - join_date: DATE (YYYY-MM-DD)
//! - note: TEXT
//! - password_hash: TEXT, Argon2id PHC string, optional
//!
//! ## profits
//! - id: INTEGER primary key
//! - profit_date: DATE, unique
//! - total_profit: REAL
//! - note: TEXT
//!
//! ## admin_users
//! - id: INTEGER primary key
//! - username: TEXT, unique
//! - password_hash: TEXT, Argon2id PHC string

pub mod json_store;
pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Database connection pool
pub type DbPool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://data/consortium.db")
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Enable query logging
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/consortium.db".to_string(),
            max_connections: 5,
            log_queries: cfg!(debug_assertions),
        }
    }
}

impl DatabaseConfig {
    /// In-memory database, for tests and throwaway runs.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            log_queries: false,
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let url = std::env::var("DATABASE_URL").unwrap_or(defaults.url);

        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => {
                    warn!(
                        "Invalid DATABASE_MAX_CONNECTIONS '{}', using default: {}",
                        raw, defaults.max_connections
                    );
                    defaults.max_connections
                }
            },
            Err(_) => defaults.max_connections,
        };

        let log_queries = std::env::var("DATABASE_LOG_QUERIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_queries);

        Self {
            url,
            max_connections,
            log_queries,
        }
    }
}

/// Initialize the database connection pool and run migrations
pub async fn init_database(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", config.url);

    // Ensure data directory exists
    if let Some(db_path) = config.url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }
    }

    let level = if config.log_queries {
        tracing::log::LevelFilter::Debug
    } else {
        tracing::log::LevelFilter::Off
    };
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .log_statements(level);

    // Each connection to an in-memory database sees its own database, and
    // the database is gone once its connection closes.
    let pool = if config.url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?
    };

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            invested REAL NOT NULL CHECK(invested >= 0),
            join_date DATE NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            password_hash TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create clients table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profit_date DATE NOT NULL UNIQUE,
            total_profit REAL NOT NULL,
            note TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create profits table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create admin_users table: {}", e))
    })?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_clients_join_date ON clients(join_date)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    // Client login looks clients up by name, ignoring case.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_clients_name_nocase ON clients(name COLLATE NOCASE)",
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!(
            "Failed to create unique client name index (rename clients whose names differ only in case): {}",
            e
        ))
    })?;

    info!("✓ Database migrations completed successfully");

    Ok(())
}
