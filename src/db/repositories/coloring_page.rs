//! Coloring page repository
//!
//! Pages reach a category listing only through `coloring_page_categories`.
//! Listings are ordered by association time, newest first, with the page id
//! as a descending tie-break so offset paging is stable.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ColoringPage, PageRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const LIST_BY_CATEGORY_SQL: &str = r#"
    SELECT cp.id, cp.title, cp.description, cp.image_url, cp.file_name, cp.is_published
    FROM coloring_page_categories cpc
    INNER JOIN coloring_pages cp ON cp.id = cpc.coloring_page_id
    WHERE cpc.category_id = ?
    ORDER BY cpc.created_at DESC, cp.id DESC
    LIMIT ? OFFSET ?
"#;

const COUNT_BY_CATEGORY_SQL: &str =
    "SELECT COUNT(*) AS total FROM coloring_page_categories WHERE category_id = ?";

/// Coloring page repository trait
#[async_trait]
pub trait ColoringPageRepository: Send + Sync {
    /// One slice of a category's pages plus the total number of associations
    async fn list_by_category(
        &self,
        category_id: i64,
        request: &PageRequest,
    ) -> Result<(Vec<ColoringPage>, i64)>;

    /// Insert a page (used for seeding content)
    async fn create(&self, page: &ColoringPage) -> Result<ColoringPage>;

    /// Associate a page with a category at the given time
    async fn link(&self, page_id: i64, category_id: i64, at: DateTime<Utc>) -> Result<()>;
}

/// SQLx-based coloring page repository implementation
pub struct SqlxColoringPageRepository {
    pool: DynDatabasePool,
}

impl SqlxColoringPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ColoringPageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ColoringPageRepository for SqlxColoringPageRepository {
    async fn list_by_category(
        &self,
        category_id: i64,
        request: &PageRequest,
    ) -> Result<(Vec<ColoringPage>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_category_sqlite(self.pool.sqlite()?, category_id, request).await
            }
            DatabaseDriver::Mysql => {
                list_by_category_mysql(self.pool.mysql()?, category_id, request).await
            }
        }
    }

    async fn create(&self, page: &ColoringPage) -> Result<ColoringPage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_page_sqlite(self.pool.sqlite()?, page).await,
            DatabaseDriver::Mysql => create_page_mysql(self.pool.mysql()?, page).await,
        }
    }

    async fn link(&self, page_id: i64, category_id: i64, at: DateTime<Utc>) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => link_sqlite(self.pool.sqlite()?, page_id, category_id, at).await,
            DatabaseDriver::Mysql => link_mysql(self.pool.mysql()?, page_id, category_id, at).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_by_category_sqlite(
    pool: &SqlitePool,
    category_id: i64,
    request: &PageRequest,
) -> Result<(Vec<ColoringPage>, i64)> {
    let rows = sqlx::query(LIST_BY_CATEGORY_SQL)
        .bind(category_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list coloring pages by category")?;

    let total: i64 = sqlx::query(COUNT_BY_CATEGORY_SQL)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .context("Failed to count coloring pages by category")?
        .get("total");

    Ok((rows.iter().map(row_to_page_sqlite).collect(), total))
}

async fn create_page_sqlite(pool: &SqlitePool, page: &ColoringPage) -> Result<ColoringPage> {
    let result = sqlx::query(
        r#"
        INSERT INTO coloring_pages (title, description, image_url, file_name, is_published)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&page.title)
    .bind(&page.description)
    .bind(&page.image_url)
    .bind(&page.file_name)
    .bind(page.is_published)
    .execute(pool)
    .await
    .context("Failed to create coloring page")?;

    Ok(ColoringPage {
        id: result.last_insert_rowid(),
        ..page.clone()
    })
}

async fn link_sqlite(pool: &SqlitePool, page_id: i64, category_id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "INSERT INTO coloring_page_categories (coloring_page_id, category_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(page_id)
    .bind(category_id)
    .bind(at)
    .execute(pool)
    .await
    .context("Failed to link coloring page to category")?;
    Ok(())
}

fn row_to_page_sqlite(row: &sqlx::sqlite::SqliteRow) -> ColoringPage {
    ColoringPage {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        file_name: row.get("file_name"),
        is_published: row.get("is_published"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_by_category_mysql(
    pool: &MySqlPool,
    category_id: i64,
    request: &PageRequest,
) -> Result<(Vec<ColoringPage>, i64)> {
    let rows = sqlx::query(LIST_BY_CATEGORY_SQL)
        .bind(category_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list coloring pages by category")?;

    let total: i64 = sqlx::query(COUNT_BY_CATEGORY_SQL)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .context("Failed to count coloring pages by category")?
        .get("total");

    Ok((rows.iter().map(row_to_page_mysql).collect(), total))
}

async fn create_page_mysql(pool: &MySqlPool, page: &ColoringPage) -> Result<ColoringPage> {
    let result = sqlx::query(
        r#"
        INSERT INTO coloring_pages (title, description, image_url, file_name, is_published)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&page.title)
    .bind(&page.description)
    .bind(&page.image_url)
    .bind(&page.file_name)
    .bind(page.is_published)
    .execute(pool)
    .await
    .context("Failed to create coloring page")?;

    Ok(ColoringPage {
        id: result.last_insert_id() as i64,
        ..page.clone()
    })
}

async fn link_mysql(pool: &MySqlPool, page_id: i64, category_id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "INSERT INTO coloring_page_categories (coloring_page_id, category_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(page_id)
    .bind(category_id)
    .bind(at)
    .execute(pool)
    .await
    .context("Failed to link coloring page to category")?;
    Ok(())
}

fn row_to_page_mysql(row: &sqlx::mysql::MySqlRow) -> ColoringPage {
    ColoringPage {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        file_name: row.get("file_name"),
        is_published: row.get("is_published"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{CategoryRepository, SqlxCategoryRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Category;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        pages: SqlxColoringPageRepository,
        category_id: i64,
        other_category_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let categories = SqlxCategoryRepository::new(pool.clone());
        let category = categories
            .create(&Category::new("Animals".to_string(), String::new(), 0))
            .await
            .unwrap();
        let other = categories
            .create(&Category::new("Space".to_string(), String::new(), 0))
            .await
            .unwrap();
        Fixture {
            pages: SqlxColoringPageRepository::new(pool),
            category_id: category.id,
            other_category_id: other.id,
        }
    }

    fn page(title: &str) -> ColoringPage {
        ColoringPage::new(
            title.to_string(),
            format!("{} to color", title),
            format!("https://cdn.example.com/{}.png", title),
            format!("{}.png", title),
        )
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_category() {
        let f = setup().await;

        let (pages, total) = f
            .pages
            .list_by_category(f.category_id, &PageRequest::first())
            .await
            .unwrap();

        assert!(pages.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_newest_association_first() {
        let f = setup().await;
        for (i, title) in ["cat", "dog", "owl"].iter().enumerate() {
            let created = f.pages.create(&page(title)).await.unwrap();
            f.pages
                .link(created.id, f.category_id, base_time() + Duration::minutes(i as i64))
                .await
                .unwrap();
        }

        let (pages, total) = f
            .pages
            .list_by_category(f.category_id, &PageRequest::first())
            .await
            .unwrap();

        let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["owl", "dog", "cat"]);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_timestamp_ties_break_by_id_desc() {
        let f = setup().await;
        let first = f.pages.create(&page("first")).await.unwrap();
        let second = f.pages.create(&page("second")).await.unwrap();
        f.pages.link(first.id, f.category_id, base_time()).await.unwrap();
        f.pages.link(second.id, f.category_id, base_time()).await.unwrap();

        let (pages, _) = f
            .pages
            .list_by_category(f.category_id, &PageRequest::first())
            .await
            .unwrap();

        assert_eq!(pages[0].id, second.id);
        assert_eq!(pages[1].id, first.id);
    }

    #[tokio::test]
    async fn test_paging_and_total() {
        let f = setup().await;
        for i in 0..15 {
            let created = f.pages.create(&page(&format!("p{}", i))).await.unwrap();
            f.pages
                .link(created.id, f.category_id, base_time() + Duration::minutes(i))
                .await
                .unwrap();
        }

        let (first, total) = f
            .pages
            .list_by_category(f.category_id, &PageRequest::first())
            .await
            .unwrap();
        let (rest, _) = f
            .pages
            .list_by_category(f.category_id, &PageRequest::at(12))
            .await
            .unwrap();

        assert_eq!(total, 15);
        assert_eq!(first.len(), 12);
        assert_eq!(rest.len(), 3);
        assert_eq!(first[0].title, "p14");
        assert_eq!(rest[2].title, "p0");
    }

    #[tokio::test]
    async fn test_only_associated_pages_are_listed() {
        let f = setup().await;
        let here = f.pages.create(&page("here")).await.unwrap();
        let elsewhere = f.pages.create(&page("elsewhere")).await.unwrap();
        f.pages.create(&page("orphan")).await.unwrap();
        f.pages.link(here.id, f.category_id, base_time()).await.unwrap();
        f.pages
            .link(elsewhere.id, f.other_category_id, base_time())
            .await
            .unwrap();

        let (pages, total) = f
            .pages
            .list_by_category(f.category_id, &PageRequest::first())
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "here");
        assert_eq!(pages[0].file_name, "here.png");
        assert!(pages[0].is_published);
    }
}
