//! Share API endpoint
//!
//! - GET /api/v1/share?title=&image_url=&page_url= - Absolute link and share targets

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{request_origin, AppState};
use crate::services::{ShareLink, ShareModal, ShareView};

/// What to share. Missing values are treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct ShareQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub page_url: String,
}

impl ShareQuery {
    /// Resolve the page URL against the canonical origin or the request's own
    pub fn into_modal(self, state: &AppState, headers: &HeaderMap) -> ShareModal {
        ShareModal::new(ShareLink::new(
            self.title,
            self.image_url,
            &self.page_url,
            state.site.app_url.as_deref(),
            &request_origin(headers),
        ))
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/share", get(get_share_view))
}

async fn get_share_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ShareQuery>,
) -> Json<ShareView> {
    Json(query.into_modal(&state, &headers).view())
}
