//! HTML pages
//!
//! Server-rendered views:
//! - GET / - Redirect to the category index
//! - GET /categories, GET /categories/{id}
//! - GET /dashboard - Favorites of the signed-in user
//! - GET /account, POST /account/login - Login form
//! - POST /logout
//! - GET /share/{target} - Redirect to a share target

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tera::Context as TeraContext;

use crate::api::auth::{session_headers, CLEAR_SESSION_COOKIE};
use crate::api::middleware::{extract_session_token, AppState, ClientIp, MaybeUser};
use crate::api::share::ShareQuery;
use crate::models::User;
use crate::services::{
    copied_toast, copy_failed_toast, welcome_toast, Browser, FieldErrors, ListingError,
    LoginInput, LoginOutcome, ShareTarget, Toast, DASHBOARD_PATH,
};
use crate::views::PageVars;

/// Share button data for the category grid
#[derive(Debug, Serialize)]
struct ShareButton {
    slug: &'static str,
    name: &'static str,
    color: &'static str,
}

fn share_buttons() -> Vec<ShareButton> {
    ShareTarget::ALL
        .into_iter()
        .map(|target| ShareButton {
            slug: target.slug(),
            name: target.name(),
            color: target.color(),
        })
        .collect()
}

/// Toasts the copy-link button shows, keyed by outcome
fn copy_toasts() -> BTreeMap<&'static str, Toast> {
    BTreeMap::from([("copied", copied_toast()), ("copy_failed", copy_failed_toast())])
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub welcome: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/categories", get(categories_page))
        .route("/categories/{id}", get(category_page))
        .route("/dashboard", get(dashboard_page))
        .route("/account", get(account_page))
        .route("/account/login", post(submit_login))
        .route("/logout", post(logout))
        .route("/share/{target}", get(share_redirect))
}

fn page_vars(state: &AppState, uri: &Uri, user: Option<&User>) -> PageVars {
    PageVars::new(state.site.name.clone(), uri.path(), user)
}

fn render(state: &AppState, status: StatusCode, template: &str, context: &TeraContext, vars: &PageVars) -> Response {
    (status, Html(state.views.render_with_fallback(template, context, vars))).into_response()
}

/// 404 page
pub fn not_found_page(state: &AppState, vars: &PageVars, message: &str) -> Response {
    let mut context = TeraContext::new();
    context.insert("message", message);
    render(state, StatusCode::NOT_FOUND, "not_found.html", &context, vars)
}

fn error_page(state: &AppState, vars: &PageVars) -> Response {
    let mut context = TeraContext::new();
    context.insert("error_message", "Something went wrong");
    render(state, StatusCode::INTERNAL_SERVER_ERROR, "error.html", &context, vars)
}

/// GET /
async fn home() -> Redirect {
    Redirect::to("/categories")
}

/// GET /categories
async fn categories_page(State(state): State<AppState>, user: MaybeUser, uri: Uri) -> Response {
    let vars = page_vars(&state, &uri, user.user());
    match state.listing_service.list_categories().await {
        Ok(categories) => {
            let mut context = TeraContext::new();
            context.insert("categories", &categories);
            render(&state, StatusCode::OK, "categories.html", &context, &vars)
        }
        Err(e) => {
            tracing::error!("Failed to list categories: {}", e);
            error_page(&state, &vars)
        }
    }
}

/// GET /categories/{id}
async fn category_page(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
    Path(id): Path<String>,
) -> Response {
    let vars = page_vars(&state, &uri, user.user());
    let Some(id) = id.parse::<i64>().ok().filter(|id| *id > 0) else {
        return not_found_page(&state, &vars, "This category does not exist.");
    };

    match state.listing_service.category_listing(id, user.user()).await {
        Ok(listing) => {
            let mut context = TeraContext::new();
            context.insert("listing", &listing);
            context.insert("share_targets", &share_buttons());
            context.insert("copy_toasts", &copy_toasts());
            render(&state, StatusCode::OK, "category.html", &context, &vars)
        }
        Err(ListingError::NotFound(_)) => {
            not_found_page(&state, &vars, "This category does not exist.")
        }
        Err(ListingError::InternalError(e)) => {
            tracing::error!("Failed to load category {}: {:#}", id, e);
            error_page(&state, &vars)
        }
    }
}

/// GET /dashboard
async fn dashboard_page(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let Some(current) = user.user() else {
        return Redirect::to("/account").into_response();
    };

    let vars = page_vars(&state, &uri, Some(current))
        .with_toast(query.welcome.is_some().then(welcome_toast));
    match state.favorite_service.list(current.id).await {
        Ok(favorites) => {
            let mut context = TeraContext::new();
            context.insert("favorites", &favorites);
            render(&state, StatusCode::OK, "dashboard.html", &context, &vars)
        }
        Err(e) => {
            tracing::error!("Failed to list favorites: {}", e);
            error_page(&state, &vars)
        }
    }
}

fn login_context(input: &LoginInput, errors: &FieldErrors) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("email_address", &input.email_address);
    context.insert("remember_me", &input.remember_me);
    context.insert("errors", errors);
    context
}

/// GET /account
async fn account_page(State(state): State<AppState>, user: MaybeUser, uri: Uri) -> Response {
    let vars = page_vars(&state, &uri, user.user());
    let context = login_context(&LoginInput::default(), &FieldErrors::new());
    render(&state, StatusCode::OK, "account.html", &context, &vars)
}

/// POST /account/login
///
/// Success redirects to the dashboard; anything else re-renders the form
/// with field errors or a toast.
async fn submit_login(
    State(state): State<AppState>,
    user: MaybeUser,
    ClientIp(ip): ClientIp,
    Form(input): Form<LoginInput>,
) -> Response {
    let outcome = state.login_service.submit(&input, ip).await;

    let status = match &outcome {
        LoginOutcome::SignedIn {
            session,
            remember_me,
        } => {
            return match session_headers(&state, session, *remember_me) {
                Ok(headers) => {
                    let target = format!("{}?welcome=1", DASHBOARD_PATH);
                    (headers, Redirect::to(&target)).into_response()
                }
                Err(e) => e.into_response(),
            };
        }
        LoginOutcome::Invalid(_) => StatusCode::BAD_REQUEST,
        LoginOutcome::InFlight => StatusCode::CONFLICT,
        LoginOutcome::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        LoginOutcome::Failed => StatusCode::UNAUTHORIZED,
        LoginOutcome::Errored => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let errors = match &outcome {
        LoginOutcome::Invalid(errors) => errors.clone(),
        _ => FieldErrors::new(),
    };
    let vars = PageVars::new(state.site.name.clone(), "/account", user.user())
        .with_toast(outcome.toast());
    render(&state, status, "account.html", &login_context(&input, &errors), &vars)
}

/// POST /logout
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(e) = state.user_service.sign_out(&token).await {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    (
        [(header::SET_COOKIE, HeaderValue::from_static(CLEAR_SESSION_COOKIE))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Captures the URL a share target would open
#[derive(Default)]
struct RedirectBrowser {
    opened: Mutex<Option<String>>,
}

impl Browser for RedirectBrowser {
    fn open_new_window(&self, url: &str) -> anyhow::Result<()> {
        *self.opened.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
        Ok(())
    }
}

/// GET /share/{target}
async fn share_redirect(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
    headers: HeaderMap,
    Path(target): Path<String>,
    Query(query): Query<ShareQuery>,
) -> Response {
    let Ok(target) = target.parse::<ShareTarget>() else {
        let vars = page_vars(&state, &uri, user.user());
        return not_found_page(&state, &vars, "Unknown share target.");
    };

    let modal = query.into_modal(&state, &headers);
    let browser = RedirectBrowser::default();
    if let Err(e) = modal.share(target, &browser) {
        tracing::error!("Failed to build share link: {:#}", e);
        let vars = page_vars(&state, &uri, user.user());
        return error_page(&state, &vars);
    }

    let opened = browser
        .opened
        .into_inner()
        .unwrap_or_else(|e| e.into_inner());
    match opened {
        Some(url) => Redirect::to(&url).into_response(),
        None => {
            let vars = page_vars(&state, &uri, user.user());
            error_page(&state, &vars)
        }
    }
}

/// Fallback for unknown paths
pub async fn fallback(State(state): State<AppState>, user: MaybeUser, uri: Uri) -> Response {
    let vars = page_vars(&state, &uri, user.user());
    not_found_page(&state, &vars, "We couldn't find what you were looking for.")
}
