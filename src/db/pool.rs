//! Database connection pool
//!
//! ColorMyPage stores users, sessions, categories and favorites in SQLite by
//! default and in MySQL when configured. Repositories hold a
//! [`DynDatabasePool`], branch on [`DatabasePool::driver`] and borrow the
//! concrete sqlx pool for their dialect.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MAX_CONNECTIONS: u32 = 20;
const MYSQL_MAX_CONNECTIONS: u32 = 30;

#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows, yielding the affected row count
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Round-trip a trivial query; used by the health endpoint
    async fn ping(&self) -> Result<()>;

    fn driver(&self) -> DatabaseDriver;

    /// The SQLite pool, or an error when connected to MySQL
    fn sqlite(&self) -> Result<&SqlitePool>;

    /// The MySQL pool, or an error when connected to SQLite
    fn mysql(&self) -> Result<&MySqlPool>;
}

/// A connected sqlx pool for one of the supported dialects
pub enum SqlxDatabase {
    Sqlite(SqlitePool),
    Mysql(MySqlPool),
}

impl SqlxDatabase {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config.driver {
            DatabaseDriver::Sqlite => connect_sqlite(&config.url).await.map(Self::Sqlite),
            DatabaseDriver::Mysql => connect_mysql(&config.url).await.map(Self::Mysql),
        }
    }
}

fn is_in_memory(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

/// Normalize a configured SQLite location into a sqlx connection URL.
///
/// File databases are opened with `mode=rwc` so a fresh install creates them.
fn sqlite_url(url: &str) -> String {
    if url == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    match url.strip_prefix("sqlite:") {
        Some(_) if url.contains('?') || is_in_memory(url) => url.to_string(),
        Some(_) => format!("{}?mode=rwc", url),
        None => format!("sqlite:{}?mode=rwc", url),
    }
}

fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url.trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent)),
        _ => Ok(()),
    }
}

async fn connect_sqlite(url: &str) -> Result<SqlitePool> {
    let in_memory = is_in_memory(url);
    if !in_memory {
        ensure_parent_dir(url)?;
    }

    // each connection to `sqlite::memory:` is a separate database
    let max_connections = if in_memory { 1 } else { SQLITE_MAX_CONNECTIONS };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&sqlite_url(url))
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    // favorites and sessions cascade on user/category deletion
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

async fn connect_mysql(url: &str) -> Result<MySqlPool> {
    let url = if url.starts_with("mysql://") {
        url.to_string()
    } else {
        format!("mysql://{}", url)
    };

    MySqlPoolOptions::new()
        .max_connections(MYSQL_MAX_CONNECTIONS)
        .connect(&url)
        .await
        .with_context(|| format!("Failed to connect to MySQL database: {}", url))
}

#[async_trait]
impl DatabasePool for SqlxDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let affected = match self {
            Self::Sqlite(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
            Self::Mysql(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
        };
        Ok(affected)
    }

    async fn ping(&self) -> Result<()> {
        match self {
            Self::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Self::Mysql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        }
        .context("Database ping failed")
    }

    fn driver(&self) -> DatabaseDriver {
        match self {
            Self::Sqlite(_) => DatabaseDriver::Sqlite,
            Self::Mysql(_) => DatabaseDriver::Mysql,
        }
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        match self {
            Self::Sqlite(pool) => Ok(pool),
            Self::Mysql(_) => anyhow::bail!("Database driver mismatch: expected a SQLite pool"),
        }
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        match self {
            Self::Mysql(pool) => Ok(pool),
            Self::Sqlite(_) => anyhow::bail!("Database driver mismatch: expected a MySQL pool"),
        }
    }
}

pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Connect to the configured database.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let db = SqlxDatabase::connect(config).await?;
    tracing::debug!("Connected to {:?} database", db.driver());
    Ok(Arc::new(db))
}

/// In-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    })
    .await
}
