#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use handcoach_api::auth::jwt::JwtConfig;
use handcoach_api::config::ServerConfig;
use handcoach_api::router::build_app_router;
use handcoach_api::state::AppState;
use handcoach_core::roles::ROLE_ADMIN;
use handcoach_db::models::role::AssignRole;
use handcoach_db::models::user::AdminUpdateUser;
use handcoach_db::repositories::{RoleRepo, UserRepo, UserRoleRepo};
use handcoach_llm::AiConfig;

pub const TEST_PASSWORD: &str = "river-jam-2026";

/// Two cash hands: Hero wins the first from the big blind and loses the
/// second at showdown from the button.
pub const TWO_HANDS: &str = "\
PokerStars Hand #245001: Hold'em No Limit ($0.01/$0.02 USD) - 2026/09/14 14:15:03 ET
Table 'Alpha' 6-max Seat #1 is the button
Seat 1: Villain1 ($2.00 in chips)
Seat 2: Villain2 ($2.00 in chips)
Seat 3: Hero ($2.00 in chips)
Villain2: posts small blind $0.01
Hero: posts big blind $0.02
*** HOLE CARDS ***
Dealt to Hero [Ah Kd]
Villain1: raises $0.04 to $0.06
Villain2: folds
Hero: calls $0.04
*** FLOP *** [2c 7h Jd]
Hero: bets $0.08
Villain1: folds
Uncalled bet ($0.08) returned to Hero
Hero collected $0.13 from pot
Hero: doesn't show hand
*** SUMMARY ***
Total pot $0.13 | Rake $0
Board [2c 7h Jd]
Seat 1: Villain1 (button) folded on the Flop
Seat 2: Villain2 (small blind) folded before Flop
Seat 3: Hero (big blind) collected ($0.13)


PokerStars Hand #245002: Hold'em No Limit ($0.01/$0.02 USD) - 2026/09/14 14:17:41 ET
Table 'Alpha' 6-max Seat #2 is the button
Seat 1: Villain1 ($0.70 in chips)
Seat 2: Hero ($2.00 in chips)
Seat 3: Villain2 ($2.00 in chips)
Villain2: posts small blind $0.01
Villain1: posts big blind $0.02
*** HOLE CARDS ***
Dealt to Hero [Qs Qh]
Hero: raises $0.04 to $0.06
Villain2: folds
Villain1: calls $0.04
*** FLOP *** [9c 5d 2s]
Villain1: checks
Hero: bets $0.10
Villain1: calls $0.10
*** TURN *** [9c 5d 2s] [Kh]
Villain1: checks
Hero: bets $0.24
Villain1: calls $0.24
*** RIVER *** [9c 5d 2s Kh] [Ts]
Villain1: checks
Hero: bets $0.80
Villain1: calls $0.30 and is all-in
Uncalled bet ($0.50) returned to Hero
*** SHOW DOWN ***
Villain1: shows [5h 5s] (three of a kind, Fives)
Hero: shows [Qs Qh] (a pair of Queens)
Villain1 collected $1.41 from pot
*** SUMMARY ***
Total pot $1.41 | Rake $0
Board [9c 5d 2s Kh Ts]
Seat 1: Villain1 (big blind) showed [5h 5s] and won ($1.41)
Seat 2: Hero (button) showed [Qs Qh] and lost
Seat 3: Villain2 (small blind) folded before Flop
";

/// Build a test `ServerConfig` with safe defaults.
///
/// The rate limit is high enough never to trip, and the local AI daemon
/// points at a port nothing listens on so status probes fail fast.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        ai: AiConfig {
            ollama_base_url: "http://127.0.0.1:9".to_string(),
            ..AiConfig::default()
        },
        rate_limit_requests: 10_000,
        rate_limit_window_secs: 60,
        session_timeout_mins: 60,
        session_sweep_interval_secs: 0,
        system_sample_interval_secs: 0,
        stats_cache_ttl_secs: 3600,
        max_upload_bytes: 10 * 1024 * 1024,
        api_key_encryption_secret: "test-api-key-encryption-secret".to_string(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. Same stack as the binary.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    build_app_router(AppState::new(pool, config))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, request(Method::POST, uri, None, Some(&body))).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::POST, uri, Some(token), None)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, request(Method::POST, uri, Some(token), Some(&body))).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, request(Method::PUT, uri, Some(token), Some(&body))).await
}

pub async fn patch_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, request(Method::PATCH, uri, Some(token), Some(&body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

/// Register `email` with [`TEST_PASSWORD`] and return the user id.
pub async fn register(app: Router, email: &str) -> i64 {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Log in and return the full `data` object of the auth response.
pub async fn login(app: Router, email: &str) -> Value {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Register and log in, returning `(user_id, access_token)`.
pub async fn register_and_login(app: Router, email: &str) -> (i64, String) {
    let user_id = register(app.clone(), email).await;
    let auth = login(app, email).await;
    (user_id, auth["access_token"].as_str().unwrap().to_string())
}

/// Register an account, give it the admin flag and role, and log it in.
pub async fn admin_token(app: Router, pool: &PgPool, email: &str) -> (i64, String) {
    let user_id = register(app.clone(), email).await;
    promote(
        pool,
        user_id,
        AdminUpdateUser {
            is_admin: Some(true),
            ..Default::default()
        },
    )
    .await;
    let auth = login(app, email).await;
    (user_id, auth["access_token"].as_str().unwrap().to_string())
}

/// Register a superuser account and log it in.
pub async fn superuser_token(app: Router, pool: &PgPool, email: &str) -> (i64, String) {
    let user_id = register(app.clone(), email).await;
    promote(
        pool,
        user_id,
        AdminUpdateUser {
            is_admin: Some(true),
            is_superuser: Some(true),
            ..Default::default()
        },
    )
    .await;
    let auth = login(app, email).await;
    (user_id, auth["access_token"].as_str().unwrap().to_string())
}

async fn promote(pool: &PgPool, user_id: i64, flags: AdminUpdateUser) {
    UserRepo::admin_update(pool, user_id, &flags).await.unwrap();
    let admin = RoleRepo::find_by_name(pool, ROLE_ADMIN)
        .await
        .unwrap()
        .expect("admin role is seeded");
    UserRoleRepo::assign(
        pool,
        &AssignRole {
            user_id,
            role_id: admin.id,
            assigned_by: None,
            expires_at: None,
        },
    )
    .await
    .unwrap();
}

/// Upload [`TWO_HANDS`] as JSON and return the stored hand ids.
pub async fn upload_two_hands(app: Router, token: &str) -> Vec<i64> {
    let body = serde_json::json!({ "filename": "session.txt", "content": TWO_HANDS });
    let response = post_json_auth(app, "/api/v1/hands/upload", token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["hand_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}
