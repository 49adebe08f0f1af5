//! Category API endpoints
//!
//! - GET /api/v1/categories - All categories
//! - GET /api/v1/categories/{id} - Category listing (header, favorite flag, first page)
//! - GET /api/v1/categories/{id}/pages?offset=N - Load more
//! - POST /api/v1/categories/{id}/favorite - Toggle favorite (auth)

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::Category;
use crate::services::{CategoryListing, FavoriteError, ListingError, ListingSlice};

/// Query parameters for loading more pages
#[derive(Debug, Deserialize)]
pub struct PagesQuery {
    #[serde(default)]
    pub offset: i64,
}

/// Response for the category index
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

/// Response for a favorite toggle
#[derive(Debug, Serialize)]
pub struct FavoriteToggleResponse {
    pub category_id: i64,
    pub is_favorited: bool,
}

/// Public category routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category_listing))
        .route("/categories/{id}/pages", get(list_more_pages))
}

/// Category routes that need a signed-in user
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/categories/{id}/favorite", post(toggle_favorite))
}

/// Category ids arrive as text so a malformed id is reported as not found
pub fn parse_category_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", raw)))
}

pub(crate) fn listing_error(e: ListingError) -> ApiError {
    match e {
        ListingError::NotFound(id) => ApiError::not_found(format!("Category not found: {}", id)),
        ListingError::InternalError(e) => {
            tracing::error!("Listing query failed: {:#}", e);
            ApiError::internal_error("Failed to load category")
        }
    }
}

/// GET /api/v1/categories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = state
        .listing_service
        .list_categories()
        .await
        .map_err(listing_error)?;

    Ok(Json(CategoryListResponse { categories }))
}

/// GET /api/v1/categories/{id}
///
/// The favorite flag is only looked up for signed-in users.
async fn get_category_listing(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<CategoryListing>, ApiError> {
    let id = parse_category_id(&id)?;
    let listing = state
        .listing_service
        .category_listing(id, user.user())
        .await
        .map_err(listing_error)?;

    Ok(Json(listing))
}

/// GET /api/v1/categories/{id}/pages?offset=N
async fn list_more_pages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PagesQuery>,
) -> Result<Json<ListingSlice>, ApiError> {
    let id = parse_category_id(&id)?;
    let slice = state
        .listing_service
        .list_more(id, query.offset)
        .await
        .map_err(listing_error)?;

    Ok(Json(slice))
}

/// POST /api/v1/categories/{id}/favorite
async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<FavoriteToggleResponse>, ApiError> {
    let id = parse_category_id(&id)?;
    let is_favorited = state
        .favorite_service
        .toggle(user.0.id, id)
        .await
        .map_err(favorite_error)?;

    Ok(Json(FavoriteToggleResponse {
        category_id: id,
        is_favorited,
    }))
}

pub(crate) fn favorite_error(e: FavoriteError) -> ApiError {
    match e {
        FavoriteError::CategoryNotFound(id) => {
            ApiError::not_found(format!("Category not found: {}", id))
        }
        FavoriteError::InternalError(e) => {
            tracing::error!("Favorite query failed: {:#}", e);
            ApiError::internal_error("Failed to update favorites")
        }
    }
}
