//! Favorites API endpoint
//!
//! - GET /api/v1/favorites - Current user's favorite categories, newest first

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::categories::favorite_error;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::FavoriteCategory;

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<FavoriteCategory>,
}

/// Favorites routes (auth required)
pub fn router() -> Router<AppState> {
    Router::new().route("/favorites", get(list_favorites))
}

async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let favorites = state
        .favorite_service
        .list(user.0.id)
        .await
        .map_err(favorite_error)?;

    Ok(Json(FavoritesResponse { favorites }))
}
