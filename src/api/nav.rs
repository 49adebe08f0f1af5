//! Navigation API endpoint
//!
//! - GET /api/v1/nav - Header links and the sign-in / logout control

use axum::{routing::get, Json, Router};

use crate::api::middleware::{AppState, MaybeUser};
use crate::services::NavModel;

pub fn router() -> Router<AppState> {
    Router::new().route("/nav", get(get_nav))
}

async fn get_nav(user: MaybeUser) -> Json<NavModel> {
    Json(NavModel::for_user(user.user()))
}
