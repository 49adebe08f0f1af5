//! Router-level tests driving the full application with `tower::ServiceExt::oneshot`

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use colormypage::{
    api::{build_router, AppState},
    config::Config,
    db::{
        create_test_pool, migrations,
        repositories::{
            CategoryRepository, ColoringPageRepository, SqlxCategoryRepository,
            SqlxColoringPageRepository,
        },
        DynDatabasePool,
    },
    models::{Category, ColoringPage},
};

async fn setup() -> (Router, DynDatabasePool) {
    let pool = create_test_pool().await.unwrap();
    migrations::run_migrations(&pool).await.unwrap();
    let state = AppState::new(pool.clone(), &Config::default()).unwrap();
    (build_router(state, "http://localhost:3000"), pool)
}

async fn seed_category(pool: &DynDatabasePool, title: &str, pages: usize) -> i64 {
    let categories = SqlxCategoryRepository::new(pool.clone());
    let category = categories
        .create(&Category::new(
            title.to_string(),
            format!("{} to color", title),
            pages as i64,
        ))
        .await
        .unwrap();

    let repo = SqlxColoringPageRepository::new(pool.clone());
    let start = Utc::now() - Duration::hours(1);
    for i in 0..pages {
        let page = repo
            .create(&ColoringPage::new(
                format!("{} {}", title, i),
                String::new(),
                format!("https://img.test/{}-{}.png", category.id, i),
                format!("{}-{}.png", category.id, i),
            ))
            .await
            .unwrap();
        repo.link(page.id, category.id, start + Duration::seconds(i as i64))
            .await
            .unwrap();
    }
    category.id
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn set_cookie(response: &Response) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string()
}

/// Register an account and return its session token
async fn register(app: &Router, email: &str) -> String {
    let response = send(
        app,
        post_json(
            "/api/v1/auth/register",
            json!({"email": email, "password": "crayons123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

#[tokio::test]
async fn test_root_redirects_to_categories() {
    let (app, _pool) = setup().await;

    let response = send(&app, get("/")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/categories");
}

#[tokio::test]
async fn test_anonymous_category_listing() {
    let (app, pool) = setup().await;
    let id = seed_category(&pool, "Dinosaurs", 15).await;

    let response = send(&app, get(&format!("/api/v1/categories/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["category"]["title"], "Dinosaurs");
    assert_eq!(json["is_favorited"], false);
    assert_eq!(json["pages"].as_array().unwrap().len(), 12);
    assert_eq!(json["total"], 15);
    assert_eq!(json["has_more"], true);
    assert_eq!(json["pages"][0]["title"], "Dinosaurs 14");
}

#[tokio::test]
async fn test_empty_category_has_no_more() {
    let (app, pool) = setup().await;
    let id = seed_category(&pool, "Robots", 0).await;

    let json = body_json(send(&app, get(&format!("/api/v1/categories/{}", id))).await).await;

    assert_eq!(json["pages"].as_array().unwrap().len(), 0);
    assert_eq!(json["total"], 0);
    assert_eq!(json["has_more"], false);
}

#[tokio::test]
async fn test_missing_category_is_not_found() {
    let (app, _pool) = setup().await;

    for uri in ["/api/v1/categories/9999", "/api/v1/categories/abc"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_load_more() {
    let (app, pool) = setup().await;
    let id = seed_category(&pool, "Ocean", 15).await;

    let response = send(&app, get(&format!("/api/v1/categories/{}/pages?offset=12", id))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["pages"].as_array().unwrap().len(), 3);
    assert_eq!(json["offset"], 12);
    assert_eq!(json["next_offset"], 15);
    assert_eq!(json["has_more"], false);
}

#[tokio::test]
async fn test_category_index() {
    let (app, pool) = setup().await;
    seed_category(&pool, "Space", 1).await;
    seed_category(&pool, "Animals", 1).await;

    let json = body_json(send(&app, get("/api/v1/categories")).await).await;
    let titles: Vec<_> = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(titles, ["Animals", "Space"]);
}

#[tokio::test]
async fn test_login_sets_browser_session_cookie() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    let response = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"email_address": "kid@example.com", "password": "crayons123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Max-Age"));

    let json = body_json(response).await;
    assert_eq!(json["redirect_to"], "/dashboard");
    assert_eq!(json["toast"]["title"], "Login Successful");
    assert_eq!(json["toast"]["description"], "Welcome back to ColorMyPage!");
    assert_eq!(json["user"]["email"], "kid@example.com");
}

#[tokio::test]
async fn test_login_remember_me_sets_max_age() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    let response = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"email_address": "kid@example.com", "password": "crayons123", "remember_me": true}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).ends_with("Max-Age=2592000"));
}

#[tokio::test]
async fn test_login_validation_errors() {
    let (app, _pool) = setup().await;

    let response = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"email_address": "not-an-email", "password": "short"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["details"]["email_address"], "Invalid email");
    assert_eq!(
        json["error"]["details"]["password"],
        "String must contain at least 8 character(s)"
    );
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    let response = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"email_address": "kid@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["error"]["details"]["toast"]["title"], "Login failed");
}

#[tokio::test]
async fn test_login_rate_limited_after_failures() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    for _ in 0..5 {
        let response = send(
            &app,
            post_json(
                "/api/v1/auth/login",
                json!({"email_address": "kid@example.com", "password": "wrong-password"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"email_address": "kid@example.com", "password": "crayons123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"]["code"], "RATE_LIMIT");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    let response = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({"email": "KID@example.com", "password": "crayons123"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registration_trims_and_lowercases_email() {
    let (app, _pool) = setup().await;
    let token = register(&app, "  Kid@Example.COM ").await;

    let response = send(&app, with_bearer(Request::get("/api/v1/auth/me").body(Body::empty()).unwrap(), &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "kid@example.com");
}

#[tokio::test]
async fn test_favorite_toggle_flow() {
    let (app, pool) = setup().await;
    let id = seed_category(&pool, "Castles", 2).await;

    let anonymous = send(&app, Request::post(format!("/api/v1/categories/{}/favorite", id)).body(Body::empty()).unwrap()).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let token = register(&app, "kid@example.com").await;
    let toggle = || {
        with_bearer(
            Request::post(format!("/api/v1/categories/{}/favorite", id))
                .body(Body::empty())
                .unwrap(),
            &token,
        )
    };

    let json = body_json(send(&app, toggle()).await).await;
    assert_eq!(json["is_favorited"], true);

    let listing = body_json(
        send(&app, with_bearer(get(&format!("/api/v1/categories/{}", id)), &token)).await,
    )
    .await;
    assert_eq!(listing["is_favorited"], true);

    let favorites = body_json(send(&app, with_bearer(get("/api/v1/favorites"), &token)).await).await;
    assert_eq!(favorites["favorites"][0]["title"], "Castles");

    let json = body_json(send(&app, toggle()).await).await;
    assert_eq!(json["is_favorited"], false);
}

#[tokio::test]
async fn test_favorite_missing_category() {
    let (app, _pool) = setup().await;
    let token = register(&app, "kid@example.com").await;

    let response = send(
        &app,
        with_bearer(
            Request::post("/api/v1/categories/424242/favorite")
                .body(Body::empty())
                .unwrap(),
            &token,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_and_logout() {
    let (app, _pool) = setup().await;
    let token = register(&app, "kid@example.com").await;

    let me = body_json(send(&app, with_bearer(get("/api/v1/auth/me"), &token)).await).await;
    assert_eq!(me["email"], "kid@example.com");

    let logout = send(
        &app,
        with_bearer(Request::post("/api/v1/auth/logout").body(Body::empty()).unwrap(), &token),
    )
    .await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&logout).contains("Max-Age=0"));

    let after = send(&app, with_bearer(get("/api/v1/auth/me"), &token)).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_nav_reflects_session() {
    let (app, _pool) = setup().await;

    let anonymous = body_json(send(&app, get("/api/v1/nav")).await).await;
    assert_eq!(anonymous["auth"]["kind"], "sign_in");
    assert_eq!(anonymous["auth"]["href"], "/account");

    let token = register(&app, "kid@example.com").await;
    let signed_in = body_json(send(&app, with_bearer(get("/api/v1/nav"), &token)).await).await;
    assert_eq!(signed_in["auth"]["kind"], "sign_out");
    assert_eq!(signed_in["auth"]["action"], "/logout");
}

#[tokio::test]
async fn test_share_view_uses_request_origin() {
    let (app, _pool) = setup().await;

    let request = Request::get("/api/v1/share?title=Cute%20Cat&image_url=https%3A%2F%2Fimg.test%2Fcat.png&page_url=%2Fpage%2F42")
        .header(header::HOST, "colormypage.test")
        .body(Body::empty())
        .unwrap();
    let json = body_json(send(&app, request).await).await;

    assert_eq!(json["url"], "http://colormypage.test/page/42");
    assert_eq!(json["options"].as_array().unwrap().len(), 5);
    assert_eq!(
        json["options"][1]["href"],
        "https://twitter.com/intent/tweet?url=http%3A%2F%2Fcolormypage.test%2Fpage%2F42&text=Cute%20Cat"
    );
}

#[tokio::test]
async fn test_share_redirect() {
    let (app, _pool) = setup().await;

    let request = Request::get("/share/whatsapp?title=Cat&page_url=https%3A%2F%2Fcolormypage.com%2Fpage%2F1")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "https://wa.me/?text=Cat%20https%3A%2F%2Fcolormypage.com%2Fpage%2F1"
    );

    let unknown = send(&app, get("/share/myspace?title=Cat")).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_page_html() {
    let (app, pool) = setup().await;
    let id = seed_category(&pool, "Unicorns", 13).await;

    let response = send(&app, get(&format!("/categories/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<h1>Unicorns</h1>"));
    assert!(html.contains("Sign in / Register"));
    assert!(html.contains(r#"data-offset="12""#));
    assert!(!html.contains(r#"id="favorite-toggle""#));
    assert!(html.contains(r#"<template id="toast-copied">"#));
    assert!(html.contains("Link copied!"));
    assert!(html.contains("Failed to copy"));
    assert!(!html.contains("alert("));

    let missing = send(&app, get("/categories/not-a-number")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(body_text(missing).await.contains("Page not found"));
}

#[tokio::test]
async fn test_dashboard_requires_session() {
    let (app, _pool) = setup().await;

    let response = send(&app, get("/dashboard")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account");
}

#[tokio::test]
async fn test_login_form_success_redirects_to_dashboard() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    let response = send(
        &app,
        post_form(
            "/account/login",
            "email_address=kid%40example.com&password=crayons123&remember_me=on",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?welcome=1");
    let cookie = set_cookie(&response);
    assert!(cookie.contains("Max-Age=2592000"));

    let token = cookie
        .trim_start_matches("session=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let dashboard = send(
        &app,
        Request::get("/dashboard?welcome=1")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(dashboard.status(), StatusCode::OK);

    let html = body_text(dashboard).await;
    assert!(html.contains("Login Successful"));
    assert!(html.contains("Logout"));
}

#[tokio::test]
async fn test_login_form_failure_rerenders() {
    let (app, _pool) = setup().await;
    register(&app, "kid@example.com").await;

    let response = send(
        &app,
        post_form("/account/login", "email_address=kid%40example.com&password=wrong-password"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let html = body_text(response).await;
    assert!(html.contains("There was an error logging in. Please try again."));
    assert!(html.contains(r#"value="kid@example.com""#));

    let invalid = send(&app, post_form("/account/login", "email_address=nope&password=x")).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let html = body_text(invalid).await;
    assert!(html.contains("Invalid email"));
    assert!(html.contains("String must contain at least 8 character(s)"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _pool) = setup().await;
    let token = register(&app, "kid@example.com").await;

    let response = send(
        &app,
        Request::post("/logout")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(set_cookie(&response).contains("Max-Age=0"));

    let me = send(&app, with_bearer(get("/api/v1/auth/me"), &token)).await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_static_stylesheet() {
    let (app, _pool) = setup().await;

    let response = send(&app, get("/static/style.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

    let missing = send(&app, get("/static/missing.css")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (app, _pool) = setup().await;

    let response = send(&app, get("/api/v1/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "sqlite");
}

#[tokio::test]
async fn test_unknown_path_renders_not_found() {
    let (app, _pool) = setup().await;

    let response = send(&app, get("/no/such/page")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page not found"));
}
