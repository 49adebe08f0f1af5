//! Database layer
//!
//! ColorMyPage stores categories, coloring pages, favorites, users and
//! sessions in SQL. Two backends are supported:
//! - SQLite (default, single-file deployment)
//! - MySQL
//!
//! The backend is chosen from configuration and hidden behind the
//! [`DatabasePool`] trait; repositories dispatch on [`DatabasePool::driver`].
//!
//! # Usage
//!
//! ```ignore
//! use colormypage::config::DatabaseConfig;
//! use colormypage::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqlxDatabase};
