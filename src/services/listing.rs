//! Category listing
//!
//! Builds the category page view model: header data, the requesting user's
//! favorite flag, the first page of coloring pages and the "has more" flag.
//! Category headers are cached; favorite state never is.

use crate::cache::{category_key, CacheLayer, MemoryCache};
use crate::db::repositories::{CategoryRepository, ColoringPageRepository, FavoriteRepository};
use crate::models::{Category, ColoringPage, OffsetPage, PageRequest, User};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Error types for listing operations
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// No category with this id
    #[error("Category not found: {0}")]
    NotFound(i64),

    /// Backend failure
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Everything the category page renders
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryListing {
    pub category: Category,
    pub is_favorited: bool,
    pub pages: Vec<ColoringPage>,
    pub total: i64,
    pub has_more: bool,
}

/// A "load more" slice
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingSlice {
    pub pages: Vec<ColoringPage>,
    pub total: i64,
    pub offset: i64,
    pub next_offset: i64,
    pub has_more: bool,
}

impl From<OffsetPage<ColoringPage>> for ListingSlice {
    fn from(page: OffsetPage<ColoringPage>) -> Self {
        let has_more = page.has_more();
        let next_offset = page.next_offset();
        Self {
            pages: page.items,
            total: page.total,
            offset: page.offset,
            next_offset,
            has_more,
        }
    }
}

/// Listing service
pub struct ListingService {
    categories: Arc<dyn CategoryRepository>,
    pages: Arc<dyn ColoringPageRepository>,
    favorites: Arc<dyn FavoriteRepository>,
    cache: Arc<MemoryCache>,
}

impl ListingService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        pages: Arc<dyn ColoringPageRepository>,
        favorites: Arc<dyn FavoriteRepository>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            categories,
            pages,
            favorites,
            cache,
        }
    }

    /// Category header, favorite flag and first page for a category.
    ///
    /// Without a user no favorite lookup is made and the flag is false.
    pub async fn category_listing(
        &self,
        category_id: i64,
        user: Option<&User>,
    ) -> Result<CategoryListing, ListingError> {
        let category = self.require_category(category_id).await?;

        let is_favorited = match user {
            Some(user) => self
                .favorites
                .is_favorited(user.id, category_id)
                .await
                .context("Failed to look up favorite status")?,
            None => false,
        };

        let request = PageRequest::first();
        let (pages, total) = self
            .pages
            .list_by_category(category_id, &request)
            .await
            .context("Failed to list coloring pages")?;
        let page = OffsetPage::new(pages, total, &request);
        let has_more = page.has_more();

        Ok(CategoryListing {
            category,
            is_favorited,
            pages: page.items,
            total: page.total,
            has_more,
        })
    }

    /// The next slice of a category's pages starting at `offset`
    pub async fn list_more(&self, category_id: i64, offset: i64) -> Result<ListingSlice, ListingError> {
        self.require_category(category_id).await?;

        let request = PageRequest::at(offset);
        let (pages, total) = self
            .pages
            .list_by_category(category_id, &request)
            .await
            .context("Failed to list coloring pages")?;

        Ok(OffsetPage::new(pages, total, &request).into())
    }

    /// All categories ordered by title
    pub async fn list_categories(&self) -> Result<Vec<Category>, ListingError> {
        let categories = self
            .categories
            .list()
            .await
            .context("Failed to list categories")?;
        Ok(categories)
    }

    /// Look up a category, going through the cache
    pub async fn get_category(&self, id: i64) -> Result<Option<Category>, ListingError> {
        let key = category_key(id);
        match self.cache.get::<Category>(&key).await {
            Ok(Some(category)) => return Ok(Some(category)),
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring unreadable cache entry {}: {:#}", key, e),
        }

        let category = self
            .categories
            .get_by_id(id)
            .await
            .context("Failed to get category")?;

        if let Some(category) = &category {
            if let Err(e) = self.cache.set(&key, category, self.cache.default_ttl()).await {
                tracing::warn!("Failed to cache category {}: {:#}", id, e);
            }
        }
        Ok(category)
    }

    async fn require_category(&self, id: i64) -> Result<Category, ListingError> {
        self.get_category(id).await?.ok_or(ListingError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FavoriteCategory, PAGE_SIZE};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCategories {
        items: Vec<Category>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl CategoryRepository for FakeCategories {
        async fn create(&self, category: &Category) -> anyhow::Result<Category> {
            Ok(category.clone())
        }

        async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Category>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.iter().find(|c| c.id == id).cloned())
        }

        async fn list(&self) -> anyhow::Result<Vec<Category>> {
            Ok(self.items.clone())
        }
    }

    struct FakePages {
        total: i64,
        fail: bool,
    }

    #[async_trait]
    impl ColoringPageRepository for FakePages {
        async fn list_by_category(
            &self,
            _category_id: i64,
            request: &PageRequest,
        ) -> anyhow::Result<(Vec<ColoringPage>, i64)> {
            if self.fail {
                anyhow::bail!("connection reset");
            }
            let end = (request.offset() + request.limit()).min(self.total);
            let pages = (request.offset()..end)
                .map(|i| ColoringPage {
                    id: self.total - i,
                    title: format!("Page {}", i),
                    description: String::new(),
                    image_url: format!("https://cdn.example.com/{}.png", i),
                    file_name: format!("{}.png", i),
                    is_published: true,
                })
                .collect();
            Ok((pages, self.total))
        }

        async fn create(&self, page: &ColoringPage) -> anyhow::Result<ColoringPage> {
            Ok(page.clone())
        }

        async fn link(&self, _: i64, _: i64, _: chrono::DateTime<chrono::Utc>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFavorites {
        rows: Mutex<Vec<(i64, i64)>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl FavoriteRepository for FakeFavorites {
        async fn is_favorited(&self, user_id: i64, category_id: i64) -> anyhow::Result<bool> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().unwrap().contains(&(user_id, category_id)))
        }

        async fn add(&self, user_id: i64, category_id: i64) -> anyhow::Result<()> {
            self.rows.lock().unwrap().push((user_id, category_id));
            Ok(())
        }

        async fn remove(&self, user_id: i64, category_id: i64) -> anyhow::Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|row| *row != (user_id, category_id));
            Ok(rows.len() != before)
        }

        async fn list_for_user(&self, _user_id: i64) -> anyhow::Result<Vec<FavoriteCategory>> {
            Ok(Vec::new())
        }
    }

    struct Harness {
        service: ListingService,
        categories: Arc<FakeCategories>,
        favorites: Arc<FakeFavorites>,
    }

    fn harness(total: i64, fail: bool) -> Harness {
        let mut animals = Category::new("Animals".to_string(), "Cute animals".to_string(), total);
        animals.id = 1;
        let categories = Arc::new(FakeCategories {
            items: vec![animals],
            lookups: AtomicUsize::new(0),
        });
        let favorites = Arc::new(FakeFavorites::default());
        let service = ListingService::new(
            categories.clone(),
            Arc::new(FakePages { total, fail }),
            favorites.clone(),
            Arc::new(MemoryCache::new()),
        );
        Harness {
            service,
            categories,
            favorites,
        }
    }

    fn user(id: i64) -> User {
        let mut user = User::new(format!("user{}@example.com", id), "hash".to_string());
        user.id = id;
        user
    }

    #[tokio::test]
    async fn test_anonymous_listing_skips_favorite_lookup() {
        let h = harness(3, false);

        let listing = h.service.category_listing(1, None).await.unwrap();

        assert!(!listing.is_favorited);
        assert_eq!(h.favorites.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(listing.category.title, "Animals");
        assert_eq!(listing.pages.len(), 3);
        assert!(!listing.has_more);
    }

    #[tokio::test]
    async fn test_signed_in_listing_reads_favorite() {
        let h = harness(3, false);
        h.favorites.add(7, 1).await.unwrap();

        let listing = h.service.category_listing(1, Some(&user(7))).await.unwrap();
        assert!(listing.is_favorited);

        let other = h.service.category_listing(1, Some(&user(8))).await.unwrap();
        assert!(!other.is_favorited);
        assert_eq!(h.favorites.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_category_is_not_found() {
        let h = harness(3, false);

        let result = h.service.category_listing(404, Some(&user(7))).await;

        assert!(matches!(result, Err(ListingError::NotFound(404))));
        assert_eq!(h.favorites.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_category() {
        let h = harness(0, false);

        let listing = h.service.category_listing(1, None).await.unwrap();

        assert!(listing.pages.is_empty());
        assert_eq!(listing.total, 0);
        assert!(!listing.has_more);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_error() {
        let h = harness(3, true);

        let result = h.service.category_listing(1, None).await;

        assert!(matches!(result, Err(ListingError::InternalError(_))));
    }

    #[tokio::test]
    async fn test_list_more() {
        let h = harness(30, false);

        let slice = h.service.list_more(1, 12).await.unwrap();
        assert_eq!(slice.pages.len(), 12);
        assert_eq!(slice.next_offset, 24);
        assert!(slice.has_more);

        let last = h.service.list_more(1, 24).await.unwrap();
        assert_eq!(last.pages.len(), 6);
        assert!(!last.has_more);

        let clamped = h.service.list_more(1, -3).await.unwrap();
        assert_eq!(clamped.offset, 0);

        assert!(matches!(h.service.list_more(2, 0).await, Err(ListingError::NotFound(2))));
    }

    #[tokio::test]
    async fn test_category_header_is_cached() {
        let h = harness(1, false);

        h.service.category_listing(1, None).await.unwrap();
        h.service.category_listing(1, None).await.unwrap();

        assert_eq!(h.categories.lookups.load(Ordering::SeqCst), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_has_more_iff_fewer_returned_than_total(total in 0i64..100) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let h = harness(total, false);
                let listing = h.service.category_listing(1, None).await.unwrap();

                prop_assert_eq!(listing.pages.len() as i64, total.min(PAGE_SIZE));
                prop_assert_eq!(listing.has_more, (listing.pages.len() as i64) < total);
                Ok(())
            });
            result?;
        }
    }
}
