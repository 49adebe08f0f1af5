//! Favorite repository
//!
//! A row in `favorited_categories` means the user has favorited the category.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, FavoriteCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const LIST_FOR_USER_SQL: &str = r#"
    SELECT c.id, c.title, c.description, c.image_count, c.featured_image, c.created_at,
           f.created_at AS favorited_at
    FROM favorited_categories f
    INNER JOIN categories c ON c.id = f.category_id
    WHERE f.user_id = ?
    ORDER BY f.created_at DESC, c.id DESC
"#;

/// Favorite repository trait
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Whether the user has favorited the category
    async fn is_favorited(&self, user_id: i64, category_id: i64) -> Result<bool>;

    /// Insert the favorite row. Adding an existing favorite is a no-op.
    async fn add(&self, user_id: i64, category_id: i64) -> Result<()>;

    /// Delete the favorite row, returning whether one existed
    async fn remove(&self, user_id: i64, category_id: i64) -> Result<bool>;

    /// The user's favorited categories, newest favorite first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteCategory>>;
}

/// SQLx-based favorite repository implementation
pub struct SqlxFavoriteRepository {
    pool: DynDatabasePool,
}

impl SqlxFavoriteRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FavoriteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FavoriteRepository for SqlxFavoriteRepository {
    async fn is_favorited(&self, user_id: i64, category_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                is_favorited_sqlite(self.pool.sqlite()?, user_id, category_id).await
            }
            DatabaseDriver::Mysql => {
                is_favorited_mysql(self.pool.mysql()?, user_id, category_id).await
            }
        }
    }

    async fn add(&self, user_id: i64, category_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => add_favorite_sqlite(self.pool.sqlite()?, user_id, category_id).await,
            DatabaseDriver::Mysql => add_favorite_mysql(self.pool.mysql()?, user_id, category_id).await,
        }
    }

    async fn remove(&self, user_id: i64, category_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                remove_favorite_sqlite(self.pool.sqlite()?, user_id, category_id).await
            }
            DatabaseDriver::Mysql => {
                remove_favorite_mysql(self.pool.mysql()?, user_id, category_id).await
            }
        }
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteCategory>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_for_user_sqlite(self.pool.sqlite()?, user_id).await,
            DatabaseDriver::Mysql => list_for_user_mysql(self.pool.mysql()?, user_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn is_favorited_sqlite(pool: &SqlitePool, user_id: i64, category_id: i64) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS found FROM favorited_categories WHERE user_id = ? AND category_id = ?",
    )
    .bind(user_id)
    .bind(category_id)
    .fetch_optional(pool)
    .await
    .context("Failed to look up favorite")?;

    Ok(row.is_some())
}

async fn add_favorite_sqlite(pool: &SqlitePool, user_id: i64, category_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO favorited_categories (user_id, category_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(category_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to add favorite")?;
    Ok(())
}

async fn remove_favorite_sqlite(pool: &SqlitePool, user_id: i64, category_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorited_categories WHERE user_id = ? AND category_id = ?")
        .bind(user_id)
        .bind(category_id)
        .execute(pool)
        .await
        .context("Failed to remove favorite")?;
    Ok(result.rows_affected() > 0)
}

async fn list_for_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<FavoriteCategory>> {
    let rows = sqlx::query(LIST_FOR_USER_SQL)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list favorites")?;

    Ok(rows
        .iter()
        .map(|row| FavoriteCategory {
            category: Category {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                image_count: row.get("image_count"),
                featured_image: row.get("featured_image"),
                created_at: row.get("created_at"),
            },
            favorited_at: row.get("favorited_at"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn is_favorited_mysql(pool: &MySqlPool, user_id: i64, category_id: i64) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS found FROM favorited_categories WHERE user_id = ? AND category_id = ?",
    )
    .bind(user_id)
    .bind(category_id)
    .fetch_optional(pool)
    .await
    .context("Failed to look up favorite")?;

    Ok(row.is_some())
}

async fn add_favorite_mysql(pool: &MySqlPool, user_id: i64, category_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT IGNORE INTO favorited_categories (user_id, category_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(category_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to add favorite")?;
    Ok(())
}

async fn remove_favorite_mysql(pool: &MySqlPool, user_id: i64, category_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorited_categories WHERE user_id = ? AND category_id = ?")
        .bind(user_id)
        .bind(category_id)
        .execute(pool)
        .await
        .context("Failed to remove favorite")?;
    Ok(result.rows_affected() > 0)
}

async fn list_for_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<FavoriteCategory>> {
    let rows = sqlx::query(LIST_FOR_USER_SQL)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list favorites")?;

    Ok(rows
        .iter()
        .map(|row| {
            let image_count: i32 = row.get("image_count");
            FavoriteCategory {
                category: Category {
                    id: row.get("id"),
                    title: row.get("title"),
                    description: row.get("description"),
                    image_count: i64::from(image_count),
                    featured_image: row.get("featured_image"),
                    created_at: row.get("created_at"),
                },
                favorited_at: row.get("favorited_at"),
            }
        })
        .collect())
}
