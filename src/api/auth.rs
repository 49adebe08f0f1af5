//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/v1/auth/register - User registration
//! - POST /api/v1/auth/login - Login form submission
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser, ClientIp};
use crate::models::{Session, User};
use crate::services::{
    LoginInput, LoginOutcome, RateLimitReason, RegisterInput, Toast, UserServiceError,
};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<Toast>,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Public auth routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Auth routes that need a session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_current_user))
}

/// `Set-Cookie` value for a new session.
///
/// Without `max_age_secs` the cookie lives as long as the browser session.
pub fn session_cookie(token: &str, max_age_secs: Option<i64>) -> String {
    let mut cookie = format!("session={}; Path=/; HttpOnly; SameSite=Lax", token);
    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub const CLEAR_SESSION_COOKIE: &str = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

/// Headers carrying the cookie for `session`
pub fn session_headers(state: &AppState, session: &Session, remember_me: bool) -> Result<HeaderMap, ApiError> {
    let max_age = remember_me.then(|| state.user_service.session_lifetime(true).num_seconds());
    let cookie = session_cookie(&session.id, max_age);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| {
            tracing::error!("Invalid session cookie: {}", e);
            ApiError::internal_error("Failed to create session")
        })?,
    );
    Ok(headers)
}

fn user_error(e: UserServiceError) -> ApiError {
    match e {
        UserServiceError::ValidationError(errors) => ApiError::with_details(
            "VALIDATION_ERROR",
            errors.to_string(),
            serde_json::to_value(&errors).unwrap_or_default(),
        ),
        UserServiceError::UserExists(msg) => ApiError::conflict(msg),
        UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
        UserServiceError::InternalError(e) => {
            tracing::error!("User service error: {:#}", e);
            ApiError::internal_error("Please try again later")
        }
    }
}

/// POST /api/v1/auth/register - Create an account and sign it in
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .register(RegisterInput::new(body.email.clone(), body.password.clone()))
        .await
        .map_err(user_error)?;

    let session = state
        .user_service
        .sign_in(&body.email, &body.password, false)
        .await
        .map_err(user_error)?;

    let headers = session_headers(&state, &session, false)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
            redirect_to: None,
            toast: None,
        }),
    ))
}

/// POST /api/v1/auth/login - Submit the login form
///
/// Runs the same flow as the HTML form: schema validation, the in-flight
/// guard, rate limits, then the sign-in itself.
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(body): Json<LoginInput>,
) -> Result<Response, ApiError> {
    let outcome = state.login_service.submit(&body, ip).await;
    let toast = outcome.toast();
    let redirect_to = outcome.redirect_to();

    match outcome {
        LoginOutcome::SignedIn {
            session,
            remember_me,
        } => {
            let user = state
                .user_service
                .validate_session(&session.id)
                .await
                .map_err(user_error)?
                .ok_or_else(|| ApiError::internal_error("Session validation failed"))?;

            let headers = session_headers(&state, &session, remember_me)?;
            Ok((
                headers,
                Json(AuthResponse {
                    user: user.into(),
                    token: session.id,
                    redirect_to,
                    toast,
                }),
            )
                .into_response())
        }
        LoginOutcome::Invalid(errors) => Err(ApiError::with_details(
            "VALIDATION_ERROR",
            errors.to_string(),
            serde_json::to_value(&errors).unwrap_or_default(),
        )),
        LoginOutcome::InFlight => Err(ApiError::conflict(
            "A login for this account is already in progress",
        )),
        LoginOutcome::RateLimited(reason) => {
            let retry_after = match reason {
                RateLimitReason::TooManyFailures => 900,
                RateLimitReason::TooManyRequests => 60,
            };
            Err(ApiError::with_details(
                "RATE_LIMIT",
                reason.message(),
                serde_json::json!({ "retry_after": retry_after, "toast": toast }),
            ))
        }
        LoginOutcome::Failed => Err(ApiError::with_details(
            "UNAUTHORIZED",
            "There was an error logging in. Please try again.",
            serde_json::json!({ "toast": toast }),
        )),
        LoginOutcome::Errored => Err(ApiError::with_details(
            "INTERNAL_ERROR",
            "Please try again later",
            serde_json::json!({ "toast": toast }),
        )),
    }
}

/// POST /api/v1/auth/logout - User logout
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.sign_out(&token).await.map_err(user_error)?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(CLEAR_SESSION_COOKIE),
    );

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - Get current user
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}
