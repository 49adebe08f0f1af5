//! API layer - HTTP handlers and routing
//!
//! Two surfaces share one router:
//! - the JSON API under `/api/v1`
//! - server-rendered HTML pages and embedded static assets

pub mod auth;
pub mod categories;
pub mod favorites;
pub mod health;
pub mod middleware;
pub mod nav;
pub mod pages;
pub mod share;
pub mod static_files;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser, ClientIp, MaybeUser};

/// Build the JSON API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need auth)
    let protected_routes = Router::new()
        .merge(categories::protected_router())
        .merge(favorites::router())
        .merge(auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(categories::router())
        .merge(auth::public_router())
        .merge(nav::router())
        .merge(share::router())
        .merge(health::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e),
    }

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .merge(pages::router())
        .merge(static_files::router())
        .fallback(pages::fallback)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
