//! Favorites
//!
//! Toggling and listing a user's favorite categories.

use crate::db::repositories::{CategoryRepository, FavoriteRepository};
use crate::models::FavoriteCategory;
use anyhow::Context;
use std::sync::Arc;

/// Error types for favorite operations
#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Favorite service
pub struct FavoriteService {
    categories: Arc<dyn CategoryRepository>,
    favorites: Arc<dyn FavoriteRepository>,
}

impl FavoriteService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        favorites: Arc<dyn FavoriteRepository>,
    ) -> Self {
        Self {
            categories,
            favorites,
        }
    }

    /// Insert the favorite if absent, delete it if present.
    ///
    /// Returns the new state.
    pub async fn toggle(&self, user_id: i64, category_id: i64) -> Result<bool, FavoriteError> {
        if self
            .categories
            .get_by_id(category_id)
            .await
            .context("Failed to get category")?
            .is_none()
        {
            return Err(FavoriteError::CategoryNotFound(category_id));
        }

        let removed = self
            .favorites
            .remove(user_id, category_id)
            .await
            .context("Failed to remove favorite")?;
        if removed {
            tracing::debug!(user_id, category_id, "Unfavorited category");
            return Ok(false);
        }

        self.favorites
            .add(user_id, category_id)
            .await
            .context("Failed to add favorite")?;
        tracing::debug!(user_id, category_id, "Favorited category");
        Ok(true)
    }

    /// The user's favorite categories, newest first
    pub async fn list(&self, user_id: i64) -> Result<Vec<FavoriteCategory>, FavoriteError> {
        let favorites = self
            .favorites
            .list_for_user(user_id)
            .await
            .context("Failed to list favorites")?;
        Ok(favorites)
    }
}
